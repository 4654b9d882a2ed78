//! Time-keyed composite and its key event markers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore, BoxedAction};

/// An action scheduled at a point on a [`Timeline`].
pub struct TimelinePair {
    /// Seconds after the timeline started.
    pub at: f32,
    pub action: BoxedAction,
}

impl std::fmt::Debug for TimelinePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelinePair")
            .field("at", &self.at)
            .field("action", &self.action.name())
            .finish()
    }
}

/// Named-event listeners shared by a timeline and its [`KeyEvent`]s.
#[derive(Default)]
pub struct KeyEventChannel {
    listeners: RefCell<Vec<Box<dyn FnMut(&str)>>>,
}

impl KeyEventChannel {
    fn emit(&self, name: &str) {
        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(name);
        }
    }
}

/// Fires each action once the timeline's clock passes its scheduled time.
///
/// The clock advances by `dt` before scheduling, and an action starts on the
/// first tick its time is strictly below the elapsed time. Pairs are kept in
/// insertion order; the scheduled time alone decides when each one runs.
/// The timeline finishes once every action has finished, or on its first
/// tick if it has none.
#[derive(Default)]
pub struct Timeline {
    core: ActionCore,
    elapsed: f32,
    pairs: Vec<TimelinePair>,
    key_events: Rc<KeyEventChannel>,
}

impl Timeline {
    pub fn allocate(kit: &ActionKit) -> Box<Self> {
        let mut timeline = kit.allocate::<Self>();
        timeline.elapsed = 0.0;
        timeline
    }

    /// Schedules `action` to start once `at` seconds have elapsed.
    pub fn append(&mut self, at: f32, action: BoxedAction) -> &mut Self {
        self.pairs.push(TimelinePair { at, action });
        self
    }

    /// Schedules a key event that reports `name` to [`on_key_event`](Self::on_key_event)
    /// listeners at `at`.
    pub fn append_key_event(&mut self, kit: &ActionKit, at: f32, name: impl Into<String>) -> &mut Self {
        let event = KeyEvent::allocate(kit, self, name.into());
        self.append(at, event)
    }

    /// Registers a listener for key events reached by this timeline.
    pub fn on_key_event(&mut self, listener: impl FnMut(&str) + 'static) -> &mut Self {
        self.key_events.listeners.borrow_mut().push(Box::new(listener));
        self
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn pairs(&self) -> &[TimelinePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Action for Timeline {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        Self::POOL_NAME
    }

    fn on_execute(&mut self, dt: f32) {
        self.elapsed += dt;
        let elapsed = self.elapsed;

        for pair in self
            .pairs
            .iter_mut()
            .filter(|pair| pair.at < elapsed && !pair.action.is_finished())
        {
            pair.action.execute(dt);
        }

        let all_done = self
            .pairs
            .iter()
            .all(|pair| pair.action.is_finished() || pair.action.is_disposed());
        if all_done {
            self.finish();
        }
    }

    fn on_reset(&mut self) {
        self.elapsed = 0.0;
        for pair in &mut self.pairs {
            pair.action.reset();
        }
    }

    fn on_deinit(&mut self) {
        self.elapsed = 0.0;
        for pair in self.pairs.drain(..) {
            pair.action.recycle();
        }
        self.key_events.listeners.borrow_mut().clear();
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Timeline {
    const POOL_NAME: &'static str = "Timeline";
}

/// Reports its name to the owning timeline's key event listeners when
/// started, then finishes immediately.
#[derive(Default)]
pub struct KeyEvent {
    core: ActionCore,
    name: String,
    channel: Option<Rc<KeyEventChannel>>,
}

impl KeyEvent {
    pub(crate) fn allocate(kit: &ActionKit, timeline: &Timeline, name: String) -> Box<Self> {
        let mut event = kit.allocate::<Self>();
        event.name = name;
        event.channel = Some(Rc::clone(&timeline.key_events));
        event
    }

    pub fn event_name(&self) -> &str {
        &self.name
    }
}

impl Action for KeyEvent {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        Self::POOL_NAME
    }

    fn on_start(&mut self) {
        if let Some(channel) = &self.channel {
            channel.emit(&self.name);
        }
        self.finish();
    }

    fn on_deinit(&mut self) {
        self.channel = None;
        self.name.clear();
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for KeyEvent {
    const POOL_NAME: &'static str = "KeyEvent";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionExt;
    use std::cell::Cell;

    #[test]
    fn actions_start_once_their_time_has_passed() {
        let kit = ActionKit::default();
        let mut timeline = kit.timeline();
        timeline
            .append(0.5, kit.delay(10.0))
            .append(1.5, kit.delay(10.0));

        timeline.execute(1.0);
        assert!(timeline.pairs()[0].action.status().is_started());
        assert!(timeline.pairs()[1].action.status().is_not_started());

        timeline.execute(1.0);
        assert!(timeline.pairs()[1].action.status().is_started());
    }

    #[test]
    fn scheduled_time_is_exclusive() {
        let kit = ActionKit::default();
        let mut timeline = kit.timeline();
        timeline.append(1.0, kit.callback(|| {}));

        assert!(!timeline.execute(1.0));
        assert!(timeline.execute(0.1));
    }

    #[test]
    fn finishes_when_every_action_has_finished() {
        let kit = ActionKit::default();
        let mut timeline = kit.timeline();
        timeline
            .append(0.0, kit.delay(1.0))
            .append(0.5, kit.callback(|| {}));

        assert!(!timeline.execute(0.5));
        assert!(timeline.execute(0.5));
    }

    #[test]
    fn empty_timeline_finishes_on_its_first_tick() {
        let kit = ActionKit::default();
        let mut timeline = kit.timeline();
        assert!(timeline.execute(0.0));
    }

    #[test]
    fn key_events_reach_listeners_in_time_order() {
        let kit = ActionKit::default();
        let received = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&received);

        let mut timeline = kit.timeline();
        timeline
            .append_key_event(&kit, 2.0, "late")
            .append_key_event(&kit, 0.5, "early")
            .on_key_event(move |name| log.borrow_mut().push(name.to_owned()));

        timeline.execute(1.0);
        assert_eq!(*received.borrow(), vec!["early"]);
        assert!(timeline.execute(1.5));
        assert_eq!(*received.borrow(), vec!["early", "late"]);
    }

    #[test]
    fn reused_key_event_reports_only_to_its_new_timeline() {
        let kit = ActionKit::default();
        let first_log = Rc::new(RefCell::new(Vec::new()));
        let second_log = Rc::new(RefCell::new(Vec::new()));

        let mut first = kit.timeline();
        let log = Rc::clone(&first_log);
        first
            .on_key_event(move |name| log.borrow_mut().push(name.to_owned()))
            .append_key_event(&kit, 0.0, "open");
        assert!(first.execute(0.1));
        first.recycle();
        assert_eq!(kit.pools().idle_count::<KeyEvent>(), 1);

        let mut second = kit.timeline();
        let log = Rc::clone(&second_log);
        second
            .on_key_event(move |name| log.borrow_mut().push(name.to_owned()))
            .append_key_event(&kit, 0.0, "close");
        assert_eq!(kit.pools().idle_count::<KeyEvent>(), 0);
        assert!(second.execute(0.1));

        assert_eq!(*first_log.borrow(), vec!["open"]);
        assert_eq!(*second_log.borrow(), vec!["close"]);
    }

    #[test]
    fn began_and_ended_listeners_fire_once() {
        let kit = ActionKit::default();
        let (began, ended) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));

        let mut timeline = kit.timeline();
        timeline.append(0.0, kit.delay(0.5));
        let counter = Rc::clone(&began);
        timeline.on_started(move || counter.set(counter.get() + 1));
        let counter = Rc::clone(&ended);
        timeline.on_finished(move || counter.set(counter.get() + 1));

        for _ in 0..4 {
            timeline.execute(0.5);
        }
        assert_eq!((began.get(), ended.get()), (1, 1));
    }

    #[test]
    fn reset_rewinds_the_clock_and_children() {
        let kit = ActionKit::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);

        let mut timeline = kit.timeline();
        timeline.append(0.0, kit.callback(move || counter.set(counter.get() + 1)));

        assert!(timeline.execute(1.0));
        timeline.reset();
        assert_eq!(timeline.elapsed(), 0.0);
        assert!(timeline.execute(1.0));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn recycled_timeline_drops_key_listeners() {
        let kit = ActionKit::default();
        let captured = Rc::new(());
        let held = Rc::clone(&captured);

        let mut timeline = kit.timeline();
        timeline.on_key_event(move |_| {
            let _ = &held;
        });
        timeline.recycle();
        assert_eq!(Rc::strong_count(&captured), 1);
    }
}

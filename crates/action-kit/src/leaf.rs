//! Zero-duration and polling leaves.

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore};

/// Invokes a closure when started and finishes in the same call.
#[derive(Default)]
pub struct Callback {
    core: ActionCore,
    callback: Option<Box<dyn FnMut()>>,
}

impl Callback {
    pub fn allocate(kit: &ActionKit, callback: impl FnMut() + 'static) -> Box<Self> {
        let mut action = kit.allocate::<Self>();
        action.callback = Some(Box::new(callback));
        action
    }
}

impl Action for Callback {
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
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
        self.finish();
    }

    fn on_deinit(&mut self) {
        self.callback = None;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Callback {
    const POOL_NAME: &'static str = "Callback";
}

/// Polls a predicate every tick and finishes on the first `true`.
///
/// The predicate is also polled on the starting call, so a condition that
/// already holds completes without waiting for another tick.
#[derive(Default)]
pub struct Condition {
    core: ActionCore,
    predicate: Option<Box<dyn FnMut() -> bool>>,
}

impl Condition {
    pub fn allocate(kit: &ActionKit, predicate: impl FnMut() -> bool + 'static) -> Box<Self> {
        let mut action = kit.allocate::<Self>();
        action.predicate = Some(Box::new(predicate));
        action
    }
}

impl Action for Condition {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        Self::POOL_NAME
    }

    fn on_execute(&mut self, _dt: f32) {
        // A condition without a predicate can never become true; finish it
        // instead of stalling the tree.
        let satisfied = self.predicate.as_mut().is_none_or(|predicate| predicate());
        if satisfied {
            self.finish();
        }
    }

    fn on_deinit(&mut self) {
        self.predicate = None;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Condition {
    const POOL_NAME: &'static str = "Condition";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn callback_runs_once_and_finishes_immediately() {
        let kit = ActionKit::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut action = kit.callback(move || counter.set(counter.get() + 1));

        assert!(action.execute(0.0));
        assert!(action.execute(0.0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn condition_polls_until_true() {
        let kit = ActionKit::default();
        let flag = Rc::new(Cell::new(false));
        let polls = Rc::new(Cell::new(0));

        let (watched, counter) = (Rc::clone(&flag), Rc::clone(&polls));
        let mut action = kit.condition(move || {
            counter.set(counter.get() + 1);
            watched.get()
        });

        assert!(!action.execute(0.1));
        assert!(!action.execute(0.1));
        flag.set(true);
        assert!(action.execute(0.1));
        assert!(action.execute(0.1));
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn recycled_callback_drops_its_closure() {
        let kit = ActionKit::default();
        let captured = Rc::new(());
        let held = Rc::clone(&captured);
        let action = kit.callback(move || {
            let _ = &held;
        });

        assert_eq!(Rc::strong_count(&captured), 2);
        action.recycle();
        assert_eq!(Rc::strong_count(&captured), 1);
    }
}

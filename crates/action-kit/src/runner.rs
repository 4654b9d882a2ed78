//! Per-frame driver for root actions.
//!
//! [`ActionRunner`] owns a set of root actions and a FIFO queue. Each
//! [`update`](ActionRunner::update) advances the frame clock, executes every
//! root once, runs the queue head, pumps coroutines, and recycles whatever
//! completed.

use std::collections::VecDeque;

use tracing::trace;

use crate::context::ActionKit;
use crate::{Action, BoxedAction};

type DisposeWhen = Box<dyn FnMut() -> bool>;

struct Root {
    action: BoxedAction,
    dispose_when: Option<DisposeWhen>,
}

impl Root {
    /// Executes the root for one tick. Returns `true` once it can be recycled.
    fn tick(&mut self, dt: f32) -> bool {
        if self.dispose_when.as_mut().is_some_and(|expired| expired()) {
            trace!(action = self.action.name(), "dispose condition met");
            return true;
        }
        self.action.execute(dt)
    }
}

/// Drives root actions once per frame and returns finished trees to their pools.
pub struct ActionRunner {
    kit: ActionKit,
    roots: Vec<Root>,
    queue: VecDeque<BoxedAction>,
}

impl ActionRunner {
    pub fn new(kit: ActionKit) -> Self {
        Self {
            kit,
            roots: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn kit(&self) -> &ActionKit {
        &self.kit
    }

    /// Starts `action` on the next update. Roots run concurrently.
    pub fn run<A: Action + 'static>(&mut self, action: Box<A>) {
        self.push_root(action, None);
    }

    /// Like [`run`](Self::run), but disposes `action` on the first update where
    /// `dispose_when` returns `true`, even if it has not finished.
    pub fn run_until<A: Action + 'static>(
        &mut self,
        action: Box<A>,
        dispose_when: impl FnMut() -> bool + 'static,
    ) {
        self.push_root(action, Some(Box::new(dispose_when)));
    }

    /// Queues `action` to run after every previously queued action has finished.
    pub fn enqueue<A: Action + 'static>(&mut self, action: Box<A>) {
        self.queue.push_back(action);
    }

    /// Advances every root and the queue head by `dt`.
    pub fn update(&mut self, dt: f32) {
        let frame = self.kit.frames().advance();
        trace!(frame, dt, roots = self.roots.len(), queued = self.queue.len(), "update");

        for mut root in std::mem::take(&mut self.roots) {
            if root.tick(dt) {
                root.action.recycle();
            } else {
                self.roots.push(root);
            }
        }

        let head_done = self.queue.front_mut().is_some_and(|head| head.execute(dt));
        if head_done && let Some(done) = self.queue.pop_front() {
            done.recycle();
        }

        self.kit.coroutines().pump();
    }

    /// Root and queued actions still owned by the runner.
    pub fn len(&self) -> usize {
        self.roots.len() + self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.roots.is_empty() && self.queue.is_empty()
    }

    /// Disposes every root and queued action.
    pub fn clear(&mut self) {
        for root in self.roots.drain(..) {
            root.action.recycle();
        }
        for action in self.queue.drain(..) {
            action.recycle();
        }
    }

    fn push_root(&mut self, action: BoxedAction, dispose_when: Option<DisposeWhen>) {
        self.roots.push(Root {
            action,
            dispose_when,
        });
    }
}

impl Drop for ActionRunner {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ActionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRunner")
            .field("roots", &self.roots.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Delay, Sequence};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn finished_roots_are_recycled() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        runner.run(kit.sequence().delay(1.0).build());

        runner.update(0.5);
        assert_eq!(runner.len(), 1);
        runner.update(0.5);
        assert!(runner.is_idle());
        assert_eq!(kit.pools().idle_count::<Sequence>(), 1);
    }

    #[test]
    fn dispose_condition_cuts_a_root_short() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        let stop = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stop);

        runner.run_until(kit.repeat(0).delay(1.0).build(), move || flag.get());
        runner.update(1.0);
        runner.update(1.0);
        assert_eq!(runner.len(), 1);

        stop.set(true);
        runner.update(1.0);
        assert!(runner.is_idle());
    }

    #[test]
    fn queued_actions_run_one_after_another() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second"] {
            let log = Rc::clone(&log);
            runner.enqueue(kit.delay(1.0).with_callback(move || log.borrow_mut().push(label)));
        }

        runner.update(1.0);
        assert_eq!(*log.borrow(), vec!["first"]);
        runner.update(1.0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(runner.is_idle());
    }

    #[test]
    fn next_frame_completes_on_the_following_update() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        runner.run(kit.next_frame());

        runner.update(0.0);
        assert_eq!(runner.len(), 1);
        runner.update(0.0);
        assert!(runner.is_idle());
    }

    #[test]
    fn coroutines_progress_between_updates() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        let steps = Rc::new(Cell::new(0));
        let counter = Rc::clone(&steps);

        runner.run(kit.coroutine(move || {
            let counter = Rc::clone(&counter);
            async move {
                for _ in 0..3 {
                    counter.set(counter.get() + 1);
                    crate::yield_frame().await;
                }
            }
        }));

        let mut per_update = Vec::new();
        while !runner.is_idle() {
            runner.update(0.016);
            per_update.push(steps.get());
            assert!(per_update.len() < 10);
        }
        // One step per update; the last pump completes the future and the
        // update after it finishes the action.
        assert_eq!(per_update, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    fn clear_returns_everything_to_the_pools() {
        let kit = ActionKit::default();
        let mut runner = ActionRunner::new(kit.clone());
        runner.run(kit.delay(5.0));
        runner.enqueue(kit.delay(5.0));
        let idle = kit.pools().idle_count::<Delay>();

        runner.clear();
        assert!(runner.is_idle());
        assert_eq!(kit.pools().idle_count::<Delay>(), idle + 2);
    }
}

//! Concurrent composite.

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore, BoxedAction};

/// Advances every unfinished child each tick and finishes once all of them
/// have finished.
///
/// Children are kept partitioned: `children[..active]` still run, the rest
/// have completed. Iteration walks the active prefix in reverse and swaps a
/// completed child to the end of it, so each tick only scans live children.
#[derive(Default)]
pub struct Parallel {
    core: ActionCore,
    children: Vec<BoxedAction>,
    active: usize,
}

impl Parallel {
    pub fn allocate(kit: &ActionKit) -> Box<Self> {
        kit.allocate::<Self>()
    }

    /// Adds `action` to the active set. Safe to call while running, but not
    /// once the parallel has finished: a finished parallel is never executed
    /// again, so the child would never run.
    pub fn add(&mut self, action: BoxedAction) -> &mut Self {
        debug_assert!(
            !self.core.is_finished(),
            "child added to a finished Parallel"
        );
        self.children.push(action);
        let last = self.children.len() - 1;
        self.children.swap(self.active, last);
        self.active += 1;
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children that completed in the current run.
    pub fn finished_count(&self) -> usize {
        self.children.len() - self.active
    }
}

impl Action for Parallel {
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
        for index in (0..self.active).rev() {
            if self.children[index].execute(dt) {
                self.active -= 1;
                self.children.swap(index, self.active);
            }
        }

        if self.active == 0 {
            self.core.finish();
        }
    }

    /// Finishes every child, last to first, then the parallel itself.
    fn finish(&mut self) {
        for child in self.children.iter_mut().rev() {
            child.finish();
        }
        self.core.finish();
    }

    fn on_reset(&mut self) {
        self.active = self.children.len();
        for child in &mut self.children {
            child.reset();
        }
    }

    fn on_deinit(&mut self) {
        self.active = 0;
        for child in self.children.drain(..) {
            child.recycle();
        }
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Parallel {
    const POOL_NAME: &'static str = "Parallel";
}

//! Ordered composite.

use tracing::warn;

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore, BoxedAction};

/// Runs its children one at a time, in order.
///
/// Zero-duration children are drained within the tick that reaches them:
/// whenever a child completes, the next one is reset and executed with
/// `dt = 0` until one of them needs more time. A `Callback, Callback, Delay`
/// chain therefore fires both callbacks in the first `execute`.
///
/// A child that is disposed without having finished aborts the sequence,
/// which then disposes itself instead of stalling on the dead child.
#[derive(Default)]
pub struct Sequence {
    core: ActionCore,
    children: Vec<BoxedAction>,
    cursor: usize,
}

impl Sequence {
    pub fn allocate(kit: &ActionKit) -> Box<Self> {
        kit.allocate::<Self>()
    }

    /// Appends `action` as the last child.
    pub fn append(&mut self, action: BoxedAction) -> &mut Self {
        self.children.push(action);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children not yet completed in the current run.
    pub fn remaining(&self) -> usize {
        self.children.len().saturating_sub(self.cursor)
    }

    /// Advances the current child by `dt`, then fast-forwards through every
    /// following child that completes with `dt = 0`.
    fn step(&mut self, dt: f32) {
        let mut dt = dt;
        while let Some(child) = self.children.get_mut(self.cursor) {
            let done = child.execute(dt);
            if child.is_disposed() && !child.is_finished() {
                let child = child.name();
                self.abort(child);
                return;
            }
            if !done {
                return;
            }

            self.cursor += 1;
            dt = 0.0;
            if let Some(next) = self.children.get_mut(self.cursor) {
                next.reset();
            }
        }

        self.finish();
    }

    fn abort(&mut self, child: &'static str) {
        warn!(
            sequence = self.name(),
            child,
            index = self.cursor,
            "child disposed before finishing, disposing sequence"
        );
        self.deinit();
    }
}

impl Action for Sequence {
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
        self.cursor = 0;
        match self.children.first_mut() {
            Some(first) => {
                first.reset();
                self.step(0.0);
            }
            None => self.finish(),
        }
    }

    fn on_execute(&mut self, dt: f32) {
        self.step(dt);
    }

    fn on_reset(&mut self) {
        self.cursor = 0;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn on_deinit(&mut self) {
        self.cursor = 0;
        for child in self.children.drain(..) {
            child.recycle();
        }
    }

    fn current_child(&self) -> Option<&dyn Action> {
        self.children.get(self.cursor).map(|child| child.as_ref())
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Sequence {
    const POOL_NAME: &'static str = "Sequence";
}

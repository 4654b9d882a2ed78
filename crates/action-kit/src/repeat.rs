//! Looping composite.

use tracing::warn;

use crate::context::{ActionKit, PooledAction, release};
use crate::sequence::Sequence;
use crate::{Action, ActionCore, BoxedAction};

/// How many times a [`Repeat`] runs its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RepeatCount {
    /// Never finishes on its own.
    #[default]
    Forever,
    Times(u32),
}

impl RepeatCount {
    pub fn is_forever(self) -> bool {
        matches!(self, Self::Forever)
    }
}

/// `0` and negative counts repeat forever.
impl From<i32> for RepeatCount {
    fn from(count: i32) -> Self {
        match u32::try_from(count) {
            Ok(times) if times > 0 => Self::Times(times),
            _ => Self::Forever,
        }
    }
}

/// Runs an inner [`Sequence`] to completion, resetting it between runs.
#[derive(Default)]
pub struct Repeat {
    core: ActionCore,
    body: Option<Box<Sequence>>,
    count: RepeatCount,
    completed: u32,
}

impl Repeat {
    pub fn allocate(kit: &ActionKit, count: RepeatCount) -> Box<Self> {
        let mut repeat = kit.allocate::<Self>();
        repeat.body = Some(Sequence::allocate(kit));
        repeat.count = count;
        repeat.completed = 0;
        repeat
    }

    /// Appends `action` to the repeated body.
    pub fn append(&mut self, action: BoxedAction) -> &mut Self {
        if let Some(body) = self.body.as_mut() {
            body.append(action);
        }
        self
    }

    pub fn count(&self) -> RepeatCount {
        self.count
    }

    /// Runs of the body completed since the last reset.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn body(&self) -> Option<&Sequence> {
        self.body.as_deref()
    }
}

impl Action for Repeat {
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
        let Some(body) = self.body.as_mut() else {
            self.finish();
            return;
        };

        let done = body.execute(dt);
        if body.is_disposed() && !body.is_finished() {
            warn!(repeat = Self::POOL_NAME, run = self.completed, "body aborted, disposing repeat");
            self.deinit();
            return;
        }
        if !done {
            return;
        }

        body.reset();
        self.completed += 1;
        if let RepeatCount::Times(times) = self.count
            && self.completed >= times
        {
            self.finish();
        }
    }

    fn on_reset(&mut self) {
        self.completed = 0;
        if let Some(body) = self.body.as_mut() {
            body.reset();
        }
    }

    fn on_deinit(&mut self) {
        self.completed = 0;
        if let Some(body) = self.body.take() {
            body.recycle();
        }
    }

    fn current_child(&self) -> Option<&dyn Action> {
        self.body.as_deref().map(|body| body as &dyn Action)
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Repeat {
    const POOL_NAME: &'static str = "Repeat";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn counts_at_or_below_zero_mean_forever() {
        assert_eq!(RepeatCount::from(0), RepeatCount::Forever);
        assert_eq!(RepeatCount::from(-1), RepeatCount::Forever);
        assert_eq!(RepeatCount::from(3), RepeatCount::Times(3));
    }

    #[test]
    fn runs_the_body_the_requested_number_of_times() {
        let kit = ActionKit::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);

        let mut repeat = kit
            .repeat(3)
            .callback(move || counter.set(counter.get() + 1))
            .delay(1.0)
            .build();

        let mut ticks = 0;
        while !repeat.execute(1.0) {
            ticks += 1;
        }
        assert_eq!(ticks + 1, 3);
        assert_eq!(hits.get(), 3);
        assert_eq!(repeat.completed(), 3);
    }

    #[test]
    fn forever_never_finishes() {
        let kit = ActionKit::default();
        let mut repeat = kit.repeat(-1).delay(1.0).build();
        for _ in 0..50 {
            assert!(!repeat.execute(1.0));
        }
        assert_eq!(repeat.completed(), 50);
    }

    #[test]
    fn aborted_body_disposes_the_repeat() {
        let kit = ActionKit::default();
        let mut repeat = kit
            .repeat(0)
            .append(kit.custom::<()>().with_execute(|api| api.dispose()))
            .build();

        assert!(repeat.execute(0.1));
        assert!(repeat.is_disposed());
        assert!(repeat.body().is_none());
    }

    #[test]
    fn reset_clears_the_run_counter() {
        let kit = ActionKit::default();
        let mut repeat = kit.repeat(2).delay(1.0).build();
        assert!(!repeat.execute(1.0));
        assert_eq!(repeat.completed(), 1);

        repeat.reset();
        assert_eq!(repeat.completed(), 0);
        assert!(!repeat.execute(1.0));
        assert!(repeat.execute(1.0));
    }
}

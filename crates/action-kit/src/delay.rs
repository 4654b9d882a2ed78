//! Time- and frame-based waits.

use crate::context::{ActionKit, FrameClock, PooledAction, release};
use crate::{Action, ActionCore};

/// Finishes once the accumulated `dt` reaches the target duration.
#[derive(Default)]
pub struct Delay {
    core: ActionCore,
    seconds: f32,
    elapsed: f32,
    callback: Option<Box<dyn FnMut()>>,
}

impl Delay {
    pub fn allocate(kit: &ActionKit, seconds: f32) -> Box<Self> {
        let mut delay = kit.allocate::<Self>();
        delay.seconds = seconds;
        delay.elapsed = 0.0;
        delay
    }

    /// Sets the callback invoked once, on the tick the delay elapses. A delay
    /// cut short by [`Action::finish`] does not invoke it.
    #[must_use]
    pub fn with_callback(mut self: Box<Self>, callback: impl FnMut() + 'static) -> Box<Self> {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    /// Seconds accumulated in the current run.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Action for Delay {
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
        if self.elapsed >= self.seconds {
            self.finish();
            if let Some(callback) = self.callback.as_mut() {
                callback();
            }
        }
    }

    fn on_reset(&mut self) {
        self.elapsed = 0.0;
    }

    fn on_deinit(&mut self) {
        self.callback = None;
        self.seconds = 0.0;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Delay {
    const POOL_NAME: &'static str = "Delay";
}

/// Finishes once the shared frame counter has advanced `count` frames past
/// the frame the action started on.
#[derive(Default)]
pub struct DelayFrame {
    core: ActionCore,
    frames: FrameClock,
    count: u64,
    start_frame: u64,
    callback: Option<Box<dyn FnMut()>>,
}

impl DelayFrame {
    pub fn allocate(kit: &ActionKit, count: u64) -> Box<Self> {
        let mut delay = kit.allocate::<Self>();
        delay.frames = kit.frames().clone();
        delay.count = count;
        delay
    }

    /// Sets the callback invoked once, on the frame the wait elapses. Not
    /// invoked when the wait is cut short by [`Action::finish`].
    #[must_use]
    pub fn with_callback(mut self: Box<Self>, callback: impl FnMut() + 'static) -> Box<Self> {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Action for DelayFrame {
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
        self.start_frame = self.frames.now();
    }

    fn on_execute(&mut self, _dt: f32) {
        if self.frames.now() - self.start_frame >= self.count {
            self.finish();
            if let Some(callback) = self.callback.as_mut() {
                callback();
            }
        }
    }

    fn on_deinit(&mut self) {
        self.callback = None;
        self.count = 0;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for DelayFrame {
    const POOL_NAME: &'static str = "DelayFrame";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn delay_fires_callback_once_when_elapsed() {
        let kit = ActionKit::default();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let mut delay = kit
            .delay(0.5)
            .with_callback(move || counter.set(counter.get() + 1));

        assert!(!delay.execute(0.2));
        assert!(!delay.execute(0.2));
        assert!(delay.execute(0.2));
        assert!(delay.execute(0.2));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn forced_finish_skips_the_callback() {
        let kit = ActionKit::default();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let mut delay = kit
            .delay(10.0)
            .with_callback(move || counter.set(counter.get() + 1));

        assert!(!delay.execute(0.1));
        delay.finish();
        assert!(delay.execute(0.1));
        assert_eq!(delay.elapsed(), 0.1);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn forced_finish_skips_the_frame_callback() {
        let kit = ActionKit::default();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let mut wait = kit
            .delay_frame(3)
            .with_callback(move || counter.set(counter.get() + 1));

        assert!(!wait.execute(0.0));
        wait.finish();
        kit.frames().advance();
        assert!(wait.execute(0.0));
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn zero_delay_finishes_on_a_zero_tick() {
        let kit = ActionKit::default();
        let mut delay = kit.delay(0.0);
        assert!(delay.execute(0.0));
    }

    #[test]
    fn reset_restarts_the_countdown() {
        let kit = ActionKit::default();
        let mut delay = kit.delay(1.0);
        delay.execute(0.9);
        delay.reset();
        assert_eq!(delay.elapsed(), 0.0);
        assert!(!delay.execute(0.5));
    }

    #[test]
    fn delay_frame_waits_for_the_clock() {
        let kit = ActionKit::default();
        let mut wait = kit.delay_frame(2);

        assert!(!wait.execute(0.0));
        kit.frames().advance();
        assert!(!wait.execute(0.0));
        kit.frames().advance();
        assert!(wait.execute(0.0));
    }

    #[test]
    fn delay_frame_ignores_repeated_calls_within_a_frame() {
        let kit = ActionKit::default();
        let mut wait = kit.next_frame();
        for _ in 0..5 {
            assert!(!wait.execute(1.0));
        }
        kit.frames().advance();
        assert!(wait.execute(0.0));
    }
}

//! User-defined leaf driven by closures.
//!
//! [`Custom`] embeds arbitrary logic in a tree without implementing
//! [`Action`] by hand. Each hook receives a [`CustomApi`] giving access to the
//! optional payload, the tick's `dt`, and the ability to finish or dispose the
//! action.

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore};

type Hook<T> = Box<dyn FnMut(&mut CustomApi<'_, T>)>;

/// Handle passed to [`Custom`] hooks.
pub struct CustomApi<'a, T> {
    core: &'a mut ActionCore,
    data: &'a mut Option<T>,
    dispose_requested: &'a mut bool,
    dt: f32,
}

impl<T> CustomApi<'_, T> {
    /// Delta time of the current tick. Zero inside start and finish hooks.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    pub fn set_data(&mut self, data: T) {
        *self.data = Some(data);
    }

    pub fn finish(&mut self) {
        self.core.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    /// Disposes the action once the running hook returns.
    ///
    /// Inside a [`Sequence`](crate::Sequence) this counts as abnormal
    /// termination unless the action was finished first.
    pub fn dispose(&mut self) {
        *self.dispose_requested = true;
    }
}

/// Leaf with caller-supplied start, execute and finish hooks and an optional
/// typed payload.
pub struct Custom<T> {
    core: ActionCore,
    data: Option<T>,
    on_start: Option<Hook<T>>,
    on_execute: Option<Hook<T>>,
    on_finish: Option<Hook<T>>,
    dispose_requested: bool,
}

impl<T> Default for Custom<T> {
    fn default() -> Self {
        Self {
            core: ActionCore::default(),
            data: None,
            on_start: None,
            on_execute: None,
            on_finish: None,
            dispose_requested: false,
        }
    }
}

impl<T: 'static> Custom<T> {
    pub fn allocate(kit: &ActionKit) -> Box<Self> {
        kit.allocate::<Self>()
    }

    #[must_use]
    pub fn with_data(mut self: Box<Self>, data: T) -> Box<Self> {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_start(mut self: Box<Self>, hook: impl FnMut(&mut CustomApi<'_, T>) + 'static) -> Box<Self> {
        self.on_start = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_execute(mut self: Box<Self>, hook: impl FnMut(&mut CustomApi<'_, T>) + 'static) -> Box<Self> {
        self.on_execute = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_finish(mut self: Box<Self>, hook: impl FnMut(&mut CustomApi<'_, T>) + 'static) -> Box<Self> {
        self.on_finish = Some(Box::new(hook));
        self
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    fn run_hook(&mut self, select: fn(&mut Self) -> &mut Option<Hook<T>>, dt: f32) {
        let Some(mut hook) = select(self).take() else {
            return;
        };

        let mut api = CustomApi {
            core: &mut self.core,
            data: &mut self.data,
            dispose_requested: &mut self.dispose_requested,
            dt,
        };
        hook(&mut api);
        *select(self) = Some(hook);

        if std::mem::take(&mut self.dispose_requested) {
            self.deinit();
        }
    }
}

impl<T: 'static> Action for Custom<T> {
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
        self.run_hook(|this| &mut this.on_start, 0.0);
    }

    fn on_execute(&mut self, dt: f32) {
        self.run_hook(|this| &mut this.on_execute, dt);
    }

    fn on_finish(&mut self) {
        self.run_hook(|this| &mut this.on_finish, 0.0);
    }

    fn on_deinit(&mut self) {
        self.data = None;
        self.on_start = None;
        self.on_execute = None;
        self.on_finish = None;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl<T: 'static> PooledAction for Custom<T> {
    const POOL_NAME: &'static str = "Custom";
}

//! Core action trait.
//!
//! This module defines the [`Action`] trait, the fundamental unit of work in
//! an action tree, together with [`ActionCore`], the lifecycle state every
//! action embeds. The driver calls [`Action::execute`] once per tick on a root
//! action; composites forward the call to their children.
//!
//! # Lifecycle
//!
//! - `NotStarted`: the next `execute` runs `on_start`. If the start hook
//!   finishes the action, `on_finish` runs in the same call. Otherwise the
//!   action becomes `Started` and `on_execute(dt)` also runs in that call.
//! - `Started`: `execute` runs `on_execute(dt)`; finishing runs `on_finish`.
//! - `Finished`: `execute` returns `true` without running `on_execute`.
//!   `on_finish` fires at most once per run, even when the action was finished
//!   from the outside through [`Action::finish`].
//! - Disposed: `execute` returns `true` with no side effects.

use std::any::Any;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::Status;
use crate::listener::{ListenerHandle, ListenerKind, Listeners};

/// Owned, type-erased action. Composites own their children through this.
pub type BoxedAction = Box<dyn Action>;

/// Lifecycle state shared by every action.
#[derive(Debug, Default)]
pub struct ActionCore {
    status: Status,
    paused: bool,
    disposed: bool,
    finish_notified: bool,
    recycled: bool,
    pub(crate) listeners: Listeners,
    home: Option<Weak<dyn Any>>,
}

impl ActionCore {
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Marks the action finished. Has no effect on a disposed action.
    pub fn finish(&mut self) {
        if !self.disposed {
            self.status = Status::Finished;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn is_recycled(&self) -> bool {
        self.recycled
    }

    pub(crate) fn set_recycled(&mut self, recycled: bool) {
        self.recycled = recycled;
    }

    /// Brings a pooled instance back to life and records the pool it came from.
    pub(crate) fn revive(&mut self, home: Weak<dyn Any>) {
        self.disposed = false;
        self.paused = false;
        self.rewind();
        self.home = Some(home);
    }

    pub(crate) fn home(&self) -> Option<Rc<dyn Any>> {
        self.home.as_ref()?.upgrade()
    }

    fn rewind(&mut self) {
        self.status = Status::NotStarted;
        self.finish_notified = false;
    }
}

/// A unit of work advanced once per tick.
///
/// Implementors embed an [`ActionCore`] and override the `on_*` hooks they
/// need. The provided methods implement the lifecycle and should not be
/// overridden, with the exception of [`finish`](Action::finish) (composites
/// that must propagate cancellation) and [`recycle`](Action::recycle) (pooled
/// types returning themselves to their pool).
pub trait Action {
    fn core(&self) -> &ActionCore;

    fn core_mut(&mut self) -> &mut ActionCore;

    /// Human-readable node name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs once when the action leaves `NotStarted`.
    fn on_start(&mut self) {}

    /// Runs on every tick while the action is `Started`.
    fn on_execute(&mut self, _dt: f32) {}

    /// Runs once when the action becomes `Finished`.
    fn on_finish(&mut self) {}

    /// Restores per-run state. Composites reset their children here.
    fn on_reset(&mut self) {}

    /// Drops user closures and releases children. Runs once, from [`Action::deinit`].
    fn on_deinit(&mut self) {}

    /// The child currently being advanced, for composites that run one child at a time.
    fn current_child(&self) -> Option<&dyn Action> {
        None
    }

    #[inline]
    fn status(&self) -> Status {
        self.core().status()
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.core().is_finished()
    }

    #[inline]
    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    /// Advances the action by one tick.
    ///
    /// # Returns
    ///
    /// `true` if the action is finished or disposed after this call, `false`
    /// if the caller must call again next tick.
    fn execute(&mut self, dt: f32) -> bool {
        if self.core().disposed {
            return true;
        }
        if self.core().paused {
            return self.core().status.is_finished();
        }

        match self.core().status {
            Status::Finished => {
                complete(self);
                return true;
            }
            Status::NotStarted => {
                trace!(action = self.name(), "start");
                self.core_mut().status = Status::Started;
                self.on_start();
                self.core_mut().listeners.notify(ListenerKind::Started);
                if let Some(done) = settle(self) {
                    return done;
                }
            }
            Status::Started => {}
        }

        self.on_execute(dt);
        settle(self).unwrap_or(false)
    }

    /// Forces the action to finish without waiting for its natural end condition.
    fn finish(&mut self) {
        self.core_mut().finish();
    }

    /// Returns the action to `NotStarted` so it can run again.
    fn reset(&mut self) {
        self.core_mut().rewind();
        self.on_reset();
    }

    fn pause(&mut self) {
        self.core_mut().set_paused(true);
    }

    fn resume(&mut self) {
        self.core_mut().set_paused(false);
    }

    /// Disposes the action: fires disposed listeners, drops every listener and
    /// user closure, and releases children. Idempotent.
    fn deinit(&mut self) {
        if self.core().disposed {
            return;
        }
        trace!(action = self.name(), "deinit");
        self.core_mut().disposed = true;
        self.core_mut().listeners.notify(ListenerKind::Disposed);
        self.core_mut().listeners.clear();
        self.on_deinit();
    }

    /// Disposes the action and hands the allocation back to its pool.
    ///
    /// Actions that were not allocated from a pool are simply dropped.
    fn recycle(self: Box<Self>) {
        let mut this = self;
        this.deinit();
    }
}

/// Listener registration available on every action, including `dyn Action`.
pub trait ActionExt: Action {
    /// Registers `callback` to run each time the action starts.
    fn on_started(&mut self, callback: impl FnMut() + 'static) -> ListenerHandle {
        self.core_mut()
            .listeners
            .push(ListenerKind::Started, Box::new(callback))
    }

    /// Registers `callback` to run when the action finishes.
    fn on_finished(&mut self, callback: impl FnMut() + 'static) -> ListenerHandle {
        self.core_mut()
            .listeners
            .push(ListenerKind::Finished, Box::new(callback))
    }

    /// Registers `callback` to run when the action is disposed.
    fn on_disposed(&mut self, callback: impl FnMut() + 'static) -> ListenerHandle {
        self.core_mut()
            .listeners
            .push(ListenerKind::Disposed, Box::new(callback))
    }

    fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.core_mut().listeners.remove(handle)
    }
}

impl<A: Action + ?Sized> ActionExt for A {}

/// Follows `current_child` links down to the leaf that is currently running.
pub fn current_executing(action: &dyn Action) -> &dyn Action {
    let mut node = action;
    while let Some(child) = node.current_child() {
        node = child;
    }
    node
}

fn settle<A: Action + ?Sized>(action: &mut A) -> Option<bool> {
    if action.core().disposed {
        return Some(true);
    }
    if action.core().status.is_finished() {
        complete(action);
        return Some(true);
    }
    None
}

fn complete<A: Action + ?Sized>(action: &mut A) {
    if action.core().finish_notified {
        return;
    }
    action.core_mut().finish_notified = true;
    trace!(action = action.name(), "finish");
    action.on_finish();
    action.core_mut().listeners.notify(ListenerKind::Finished);
}

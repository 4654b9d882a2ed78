//! Coroutine bridge.
//!
//! Coroutines are plain Rust futures. The [`CoroutineScheduler`] owned by an
//! [`ActionKit`] polls every spawned future once per
//! [`pump`](CoroutineScheduler::pump) with a no-op waker, so a future suspends
//! for exactly one frame each time it returns `Pending`. [`yield_frame`] is the
//! usual suspension point.
//!
//! `spawn` runs a future up to its first suspension point. The pump of the
//! frame it was spawned in skips it, so that first suspension also lasts one
//! frame.
//!
//! [`Coroutine`] adapts a future factory into a leaf action that finishes once
//! its future has completed.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::context::{ActionKit, PooledAction, release};
use crate::{Action, ActionCore};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Progress of a spawned coroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskState {
    Running,
    Completed,
    Cancelled,
}

/// Shared view of a spawned coroutine.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    pub fn is_done(&self) -> bool {
        self.state.get() != TaskState::Running
    }

    /// Stops the coroutine. Its future is dropped on the next pump.
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Running {
            self.state.set(TaskState::Cancelled);
        }
    }
}

struct Task {
    future: LocalFuture,
    state: Rc<Cell<TaskState>>,
}

impl Task {
    /// Polls once. Returns `true` when the task can be dropped.
    fn poll(&mut self) -> bool {
        if self.state.get() == TaskState::Cancelled {
            return true;
        }

        let mut cx = Context::from_waker(Waker::noop());
        match self.future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                self.state.set(TaskState::Completed);
                true
            }
            Poll::Pending => false,
        }
    }
}

#[derive(Default)]
struct TaskLists {
    live: RefCell<Vec<Task>>,
    /// Spawned since the last pump; joins `live` once that pump is done.
    spawned: RefCell<Vec<Task>>,
}

/// Frame-stepped executor for coroutine futures. Clones share the task lists.
#[derive(Clone, Default)]
pub struct CoroutineScheduler {
    lists: Rc<TaskLists>,
}

impl CoroutineScheduler {
    /// Starts `future`, running it up to its first suspension point before
    /// returning.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> TaskHandle {
        self.spawn_boxed(Box::pin(future))
    }

    fn spawn_boxed(&self, future: LocalFuture) -> TaskHandle {
        let mut task = Task {
            future,
            state: Rc::new(Cell::new(TaskState::Running)),
        };
        let handle = TaskHandle {
            state: Rc::clone(&task.state),
        };

        if !task.poll() {
            self.lists.spawned.borrow_mut().push(task);
        }
        handle
    }

    /// Polls every task spawned before the previous pump once, and drops
    /// finished or cancelled ones.
    ///
    /// Tasks spawned since the previous pump, including those spawned while
    /// pumping, are not polled; they join the live list for the next pump.
    /// Returns the number of live tasks.
    pub fn pump(&self) -> usize {
        let mut live = std::mem::take(&mut *self.lists.live.borrow_mut());
        live.retain_mut(|task| !task.poll());

        let spawned = std::mem::take(&mut *self.lists.spawned.borrow_mut());
        live.extend(
            spawned
                .into_iter()
                .filter(|task| task.state.get() == TaskState::Running),
        );

        let count = live.len();
        *self.lists.live.borrow_mut() = live;
        count
    }

    pub fn len(&self) -> usize {
        self.lists.live.borrow().len() + self.lists.spawned.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CoroutineScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoroutineScheduler")
            .field("tasks", &self.len())
            .finish()
    }
}

/// Future that stays pending for `frames` pumps.
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldFrames {
    remaining: u32,
}

impl Future for YieldFrames {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        Poll::Pending
    }
}

/// Suspends the current coroutine until the next frame.
pub fn yield_frame() -> YieldFrames {
    yield_frames(1)
}

pub fn yield_frames(frames: u32) -> YieldFrames {
    YieldFrames { remaining: frames }
}

/// Leaf that runs a coroutine and finishes once it completes.
///
/// The factory is called on every start, so a reset coroutine runs a fresh
/// future.
#[derive(Default)]
pub struct Coroutine {
    core: ActionCore,
    scheduler: Option<CoroutineScheduler>,
    factory: Option<Box<dyn FnMut() -> LocalFuture>>,
    task: Option<TaskHandle>,
}

impl Coroutine {
    pub fn allocate<F, Fut>(kit: &ActionKit, mut factory: F) -> Box<Self>
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let mut action = kit.allocate::<Self>();
        action.scheduler = Some(kit.coroutines().clone());
        action.factory = Some(Box::new(move || Box::pin(factory()) as LocalFuture));
        action
    }

    /// The running task, if the coroutine has started and not been reset.
    pub fn task(&self) -> Option<&TaskHandle> {
        self.task.as_ref()
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }
}

impl Action for Coroutine {
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
        let (Some(scheduler), Some(factory)) = (self.scheduler.as_ref(), self.factory.as_mut())
        else {
            self.finish();
            return;
        };

        let task = scheduler.spawn_boxed(factory());
        let done = task.is_done();
        self.task = Some(task);
        if done {
            self.finish();
        }
    }

    fn on_execute(&mut self, _dt: f32) {
        if self.task.as_ref().is_none_or(TaskHandle::is_done) {
            self.finish();
        }
    }

    fn on_finish(&mut self) {
        self.cancel_task();
    }

    fn on_reset(&mut self) {
        self.cancel_task();
    }

    fn on_deinit(&mut self) {
        self.cancel_task();
        self.factory = None;
        self.scheduler = None;
    }

    fn recycle(self: Box<Self>) {
        release(self);
    }
}

impl PooledAction for Coroutine {
    const POOL_NAME: &'static str = "Coroutine";
}

//! The explicit context object every action tree is built from.
//!
//! [`ActionKit`] replaces the global per-type pool singletons: it owns one
//! [`Pool`] per concrete action type, the frame counter read by frame-based
//! delays, and the scheduler that drives coroutine actions. Clones are cheap
//! and share the same state.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::rc::Rc;

use tracing::debug;

use crate::builder::Chain;
use crate::config::ActionKitConfig;
use crate::coroutine::{Coroutine, CoroutineScheduler};
use crate::custom::{Custom, CustomApi};
use crate::delay::{Delay, DelayFrame};
use crate::error::PoolError;
use crate::leaf::{Callback, Condition};
use crate::parallel::Parallel;
use crate::pool::{DefaultFactory, Pool};
use crate::repeat::{Repeat, RepeatCount};
use crate::sequence::Sequence;
use crate::timeline::Timeline;
use crate::Action;

/// An action type with a pool slot in [`ActionPools`].
pub trait PooledAction: Action + Default + 'static {
    /// Name used for configuration lookups and logs.
    const POOL_NAME: &'static str;
}

type PoolCell<T> = RefCell<Pool<Box<T>>>;

/// Type-keyed registry holding one pool per concrete action type.
///
/// Pools are created lazily on first allocation, sized from
/// [`ActionKitConfig`], unless one was registered up front.
pub struct ActionPools {
    config: ActionKitConfig,
    pools: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl ActionPools {
    pub fn new(config: ActionKitConfig) -> Self {
        Self {
            config,
            pools: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ActionKitConfig {
        &self.config
    }

    /// Installs a custom pool for `T`, e.g. one built with a non-default factory.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyRegistered`] if `T` already has a pool,
    /// including one created lazily by an earlier allocation.
    pub fn register<T: PooledAction>(&self, pool: Pool<Box<T>>) -> Result<(), PoolError> {
        match self.pools.borrow_mut().entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(PoolError::AlreadyRegistered {
                type_name: T::POOL_NAME,
            }),
            Entry::Vacant(slot) => {
                slot.insert(Rc::new(RefCell::new(pool)));
                Ok(())
            }
        }
    }

    /// Takes an instance of `T` from its pool and revives it.
    pub fn allocate<T: PooledAction>(&self) -> Box<T> {
        let pool = self.pool::<T>();
        let mut action = pool.borrow_mut().allocate();
        let home: Rc<dyn Any> = pool;
        action.core_mut().revive(Rc::downgrade(&home));
        action
    }

    /// Idle instances of `T` currently retained. Zero if `T` has no pool yet.
    pub fn idle_count<T: PooledAction>(&self) -> usize {
        self.pools
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.downcast_ref::<PoolCell<T>>())
            .map_or(0, |pool| pool.borrow().idle_count())
    }

    /// Changes the idle bound of `T`'s pool, evicting excess instances.
    pub fn set_max_count<T: PooledAction>(&self, max_count: Option<usize>) {
        self.pool::<T>().borrow_mut().set_max_count(max_count);
    }

    fn pool<T: PooledAction>(&self) -> Rc<PoolCell<T>> {
        let existing = self.pools.borrow().get(&TypeId::of::<T>()).cloned();
        let erased = match existing {
            Some(pool) => pool,
            None => {
                let config = self.config.pool(T::POOL_NAME);
                let mut pool = Pool::<Box<T>>::new(DefaultFactory);
                pool.set_max_count(config.max_count);
                pool.prewarm(config.init_count);
                debug!(
                    pool = T::POOL_NAME,
                    max_count = ?config.max_count,
                    idle = pool.idle_count(),
                    "created action pool"
                );

                let pool: Rc<dyn Any> = Rc::new(RefCell::new(pool));
                self.pools
                    .borrow_mut()
                    .insert(TypeId::of::<T>(), Rc::clone(&pool));
                pool
            }
        };

        erased
            .downcast::<PoolCell<T>>()
            .unwrap_or_else(|_| unreachable!("pool registry is keyed by TypeId"))
    }
}

impl std::fmt::Debug for ActionPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionPools")
            .field("pools", &self.pools.borrow().len())
            .finish()
    }
}

/// Disposes `action` and returns it to the pool it was allocated from.
///
/// Pooled types call this from [`Action::recycle`]. Actions that were not
/// allocated through [`ActionPools`], or whose context is gone, are dropped.
pub fn release<T: PooledAction>(mut action: Box<T>) {
    action.deinit();
    let Some(home) = action.core().home() else {
        return;
    };
    if let Ok(pool) = home.downcast::<PoolCell<T>>() {
        pool.borrow_mut().recycle(action);
    }
}

/// Monotonic frame counter advanced once per driver update.
#[derive(Debug, Clone, Default)]
pub struct FrameClock(Rc<Cell<u64>>);

impl FrameClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    /// Moves to the next frame and returns its number.
    pub fn advance(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

struct KitInner {
    pools: ActionPools,
    frames: FrameClock,
    coroutines: CoroutineScheduler,
}

/// Builder context for action trees.
///
/// # Example
///
/// ```rust,ignore
/// let kit = ActionKit::default();
/// let tree = kit
///     .sequence()
///     .callback(|| println!("go"))
///     .delay(1.0)
///     .callback(|| println!("one second later"))
///     .build();
/// ```
#[derive(Clone)]
pub struct ActionKit {
    inner: Rc<KitInner>,
}

impl ActionKit {
    pub fn new(config: ActionKitConfig) -> Self {
        Self {
            inner: Rc::new(KitInner {
                pools: ActionPools::new(config),
                frames: FrameClock::default(),
                coroutines: CoroutineScheduler::default(),
            }),
        }
    }

    pub fn pools(&self) -> &ActionPools {
        &self.inner.pools
    }

    pub fn frames(&self) -> &FrameClock {
        &self.inner.frames
    }

    pub fn coroutines(&self) -> &CoroutineScheduler {
        &self.inner.coroutines
    }

    pub fn allocate<T: PooledAction>(&self) -> Box<T> {
        self.inner.pools.allocate()
    }

    /// Waits `seconds` of accumulated `dt`.
    pub fn delay(&self, seconds: f32) -> Box<Delay> {
        Delay::allocate(self, seconds)
    }

    /// Waits until the frame counter has advanced `count` frames.
    pub fn delay_frame(&self, count: u64) -> Box<DelayFrame> {
        DelayFrame::allocate(self, count)
    }

    pub fn next_frame(&self) -> Box<DelayFrame> {
        DelayFrame::allocate(self, 1)
    }

    /// Runs `callback` once when started, then finishes in the same tick.
    pub fn callback(&self, callback: impl FnMut() + 'static) -> Box<Callback> {
        Callback::allocate(self, callback)
    }

    /// Finishes on the first tick `predicate` returns `true`.
    pub fn condition(&self, predicate: impl FnMut() -> bool + 'static) -> Box<Condition> {
        Condition::allocate(self, predicate)
    }

    pub fn custom<T: 'static>(&self) -> Box<Custom<T>> {
        Custom::allocate(self)
    }

    /// A custom leaf with only a start hook. The hook must call
    /// [`CustomApi::finish`] for the action to complete.
    pub fn only_begin(&self, on_start: impl FnMut(&mut CustomApi<'_, ()>) + 'static) -> Box<Custom<()>> {
        Custom::allocate(self).with_start(on_start)
    }

    /// Drives the future returned by `factory` through the coroutine
    /// scheduler and finishes once it completes. The factory is called again
    /// after every reset.
    pub fn coroutine<F, Fut>(&self, factory: F) -> Box<Coroutine>
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Coroutine::allocate(self, factory)
    }

    pub fn sequence(&self) -> Chain<Sequence> {
        Chain::new(self.clone(), self.allocate())
    }

    pub fn parallel(&self) -> Chain<Parallel> {
        Chain::new(self.clone(), self.allocate())
    }

    /// A repeating sequence. Counts of `0` or below repeat forever.
    pub fn repeat(&self, count: impl Into<RepeatCount>) -> Chain<Repeat> {
        Chain::new(self.clone(), Repeat::allocate(self, count.into()))
    }

    pub fn timeline(&self) -> Box<Timeline> {
        Timeline::allocate(self)
    }
}

impl Default for ActionKit {
    fn default() -> Self {
        Self::new(ActionKitConfig::default())
    }
}

//! Bounded object pools.
//!
//! A [`Pool`] keeps a stack of idle instances of one type and hands them out
//! again instead of constructing new ones. Objects opt in through
//! [`Poolable`], which carries the "already recycled" flag used to reject
//! double recycles and the reset hook run on every recycle.

use tracing::debug;

use crate::Action;
use crate::error::PoolError;

/// Maximum idle instances retained when no explicit bound is configured.
pub const DEFAULT_MAX_COUNT: usize = 12;

/// An object that can be returned to a [`Pool`].
pub trait Poolable {
    /// Releases captured state. Runs on every recycle, including recycles
    /// that discard the instance because the pool is full.
    fn on_recycled(&mut self);

    fn is_recycled(&self) -> bool;

    fn set_recycled(&mut self, recycled: bool);
}

/// Produces fresh instances when a pool runs dry.
pub trait ObjectFactory<T> {
    fn create(&self) -> T;
}

/// Builds instances with [`Default::default`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl<T: Default> ObjectFactory<T> for DefaultFactory {
    fn create(&self) -> T {
        T::default()
    }
}

/// Builds instances with a user closure. This is the controlled-creation path
/// for types that do not expose a public constructor.
pub struct FnFactory<F>(pub F);

impl<T, F: Fn() -> T> ObjectFactory<T> for FnFactory<F> {
    fn create(&self) -> T {
        (self.0)()
    }
}

/// Stack of idle instances with an optional upper bound.
pub struct Pool<T> {
    factory: Box<dyn ObjectFactory<T>>,
    idle: Vec<T>,
    max_count: Option<usize>,
}

impl<T: Poolable> Pool<T> {
    /// Creates an empty pool retaining at most [`DEFAULT_MAX_COUNT`] idle instances.
    pub fn new(factory: impl ObjectFactory<T> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            idle: Vec::new(),
            max_count: Some(DEFAULT_MAX_COUNT),
        }
    }

    pub fn builder() -> PoolBuilder<T> {
        PoolBuilder::default()
    }

    /// Pops an idle instance, or creates one if the pool is empty.
    pub fn allocate(&mut self) -> T {
        let mut object = match self.idle.pop() {
            Some(object) => object,
            None => self.factory.create(),
        };
        object.set_recycled(false);
        object
    }

    /// Returns `object` to the pool.
    ///
    /// Returns `false` if the object was already recycled, or if the pool is
    /// full. A full pool still runs the reset hook before dropping the object.
    pub fn recycle(&mut self, mut object: T) -> bool {
        if object.is_recycled() {
            debug!(
                type_name = std::any::type_name::<T>(),
                "rejected double recycle"
            );
            return false;
        }

        if self.is_full() {
            object.on_recycled();
            return false;
        }

        object.set_recycled(true);
        object.on_recycled();
        self.idle.push(object);
        true
    }

    /// Number of idle instances currently retained.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Upper bound on idle instances; `None` means unbounded.
    pub fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// Changes the bound, evicting idle instances above the new limit.
    pub fn set_max_count(&mut self, max_count: Option<usize>) {
        self.max_count = max_count;
        if let Some(max) = max_count
            && self.idle.len() > max
        {
            debug!(
                type_name = std::any::type_name::<T>(),
                evicted = self.idle.len() - max,
                "shrinking pool"
            );
            self.idle.truncate(max);
        }
    }

    /// Fills the pool up to `count` idle instances, clamped to the bound.
    pub fn prewarm(&mut self, count: usize) {
        let target = self.max_count.map_or(count, |max| count.min(max));
        while self.idle.len() < target {
            let object = self.factory.create();
            self.recycle(object);
        }
    }

    /// Drops every idle instance.
    pub fn clear(&mut self) {
        self.idle.clear();
    }

    fn is_full(&self) -> bool {
        self.max_count.is_some_and(|max| self.idle.len() >= max)
    }
}

impl<T: Poolable + Default + 'static> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DefaultFactory)
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle.len())
            .field("max_count", &self.max_count)
            .finish()
    }
}

/// Validating constructor for [`Pool`].
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .factory(FnFactory(|| Bullet::with_speed(3.0)))
///     .max_count(Some(64))
///     .init_count(16)
///     .build()?;
/// ```
pub struct PoolBuilder<T> {
    factory: Option<Box<dyn ObjectFactory<T>>>,
    max_count: Option<usize>,
    init_count: usize,
}

impl<T> Default for PoolBuilder<T> {
    fn default() -> Self {
        Self {
            factory: None,
            max_count: Some(DEFAULT_MAX_COUNT),
            init_count: 0,
        }
    }
}

impl<T: Poolable> PoolBuilder<T> {
    #[must_use]
    pub fn factory(mut self, factory: impl ObjectFactory<T> + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    #[must_use]
    pub fn max_count(mut self, max_count: Option<usize>) -> Self {
        self.max_count = max_count;
        self
    }

    #[must_use]
    pub fn init_count(mut self, init_count: usize) -> Self {
        self.init_count = init_count;
        self
    }

    /// Builds the pool and pre-warms it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingFactory`] if no factory was supplied.
    pub fn build(self) -> Result<Pool<T>, PoolError> {
        let factory = self.factory.ok_or(PoolError::MissingFactory {
            type_name: std::any::type_name::<T>(),
        })?;

        let mut pool = Pool {
            factory,
            idle: Vec::new(),
            max_count: self.max_count,
        };
        pool.prewarm(self.init_count);
        Ok(pool)
    }
}

/// Pooled actions are stored boxed. Recycling disposes the action, dropping
/// its closures and children, then rewinds it to `NotStarted`.
impl<A: Action + ?Sized> Poolable for Box<A> {
    fn on_recycled(&mut self) {
        self.deinit();
        self.reset();
    }

    fn is_recycled(&self) -> bool {
        self.core().is_recycled()
    }

    fn set_recycled(&mut self, recycled: bool) {
        self.core_mut().set_recycled(recycled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Shared handle; clones refer to the same logical instance.
    #[derive(Clone, Default)]
    struct Handle {
        recycled: Rc<Cell<bool>>,
        resets: Rc<Cell<u32>>,
    }

    impl Poolable for Handle {
        fn on_recycled(&mut self) {
            self.resets.set(self.resets.get() + 1);
        }

        fn is_recycled(&self) -> bool {
            self.recycled.get()
        }

        fn set_recycled(&mut self, recycled: bool) {
            self.recycled.set(recycled);
        }
    }

    #[test]
    fn allocate_reuses_idle_instances() {
        let mut pool = Pool::<Handle>::default();
        let handle = pool.allocate();
        let resets = Rc::clone(&handle.resets);

        assert!(pool.recycle(handle));
        assert_eq!(pool.idle_count(), 1);

        let again = pool.allocate();
        assert!(Rc::ptr_eq(&again.resets, &resets));
        assert!(!again.is_recycled());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn double_recycle_is_rejected() {
        let mut pool = Pool::<Handle>::default();
        let handle = pool.allocate();

        assert!(pool.recycle(handle.clone()));
        assert!(!pool.recycle(handle.clone()));
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(handle.resets.get(), 1);
    }

    #[test]
    fn full_pool_resets_but_discards() {
        let mut pool = Pool::<Handle>::builder()
            .factory(DefaultFactory)
            .max_count(Some(1))
            .build()
            .unwrap();

        let first = pool.allocate();
        let second = pool.allocate();
        let second_resets = Rc::clone(&second.resets);

        assert!(pool.recycle(first));
        assert!(!pool.recycle(second));
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(second_resets.get(), 1);
    }

    #[test]
    fn shrinking_evicts_idle_instances() {
        let mut pool = Pool::<Handle>::builder()
            .factory(DefaultFactory)
            .max_count(None)
            .init_count(8)
            .build()
            .unwrap();
        assert_eq!(pool.idle_count(), 8);

        pool.set_max_count(Some(3));
        assert_eq!(pool.idle_count(), 3);
    }

    #[test]
    fn prewarm_is_clamped_to_bound() {
        let mut pool = Pool::<Handle>::builder()
            .factory(FnFactory(Handle::default))
            .max_count(Some(4))
            .init_count(10)
            .build()
            .unwrap();
        assert_eq!(pool.idle_count(), 4);

        pool.prewarm(2);
        assert_eq!(pool.idle_count(), 4);
    }

    #[test]
    fn builder_without_factory_fails() {
        let result = Pool::<Handle>::builder().build();
        assert!(matches!(result, Err(PoolError::MissingFactory { .. })));
    }
}

//! Pool sizing configuration.
use std::collections::HashMap;
use std::env;

use crate::pool::DEFAULT_MAX_COUNT;

/// Sizing for a single pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Maximum idle instances retained. `None` keeps every recycled instance.
    pub max_count: Option<usize>,
    /// Idle instances created up front when the pool is first used.
    pub init_count: usize,
}

impl PoolConfig {
    pub const fn new(max_count: Option<usize>, init_count: usize) -> Self {
        Self {
            max_count,
            init_count,
        }
    }

    pub const fn unbounded() -> Self {
        Self::new(None, 0)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_COUNT), 0)
    }
}

/// Configuration for an [`ActionKit`](crate::ActionKit) context.
///
/// Pools are keyed by [`PooledAction::POOL_NAME`](crate::PooledAction::POOL_NAME).
/// Types without an override use `default_pool`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionKitConfig {
    pub default_pool: PoolConfig,
    pub overrides: HashMap<String, PoolConfig>,
}

impl ActionKitConfig {
    /// Delay and callback nodes are by far the most common leaves, so their
    /// pools start warm.
    pub const HOT_POOL: PoolConfig = PoolConfig::new(Some(50), 50);

    pub fn new() -> Self {
        let overrides = ["Delay", "Callback"]
            .into_iter()
            .map(|name| (name.to_owned(), Self::HOT_POOL))
            .collect();

        Self {
            default_pool: PoolConfig::default(),
            overrides,
        }
    }

    /// Sets the sizing for the pool named `name` (builder pattern).
    #[must_use]
    pub fn with_pool(mut self, name: impl Into<String>, config: PoolConfig) -> Self {
        self.overrides.insert(name.into(), config);
        self
    }

    /// Returns the sizing for the pool named `name`.
    pub fn pool(&self, name: &str) -> PoolConfig {
        self.overrides
            .get(name)
            .copied()
            .unwrap_or(self.default_pool)
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ACTION_KIT_POOL_MAX` - Default idle bound per pool, `0` for unbounded (default: 12)
    /// - `ACTION_KIT_POOL_INIT` - Default pre-warm count per pool (default: 0)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max) = read_env::<usize>("ACTION_KIT_POOL_MAX") {
            config.default_pool.max_count = (max > 0).then_some(max);
        }

        if let Some(init) = read_env::<usize>("ACTION_KIT_POOL_INIT") {
            config.default_pool.init_count = init;
        }

        config
    }
}

impl Default for ActionKitConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

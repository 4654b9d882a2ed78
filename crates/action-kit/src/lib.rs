//! Frame-driven action trees for real-time applications.
//!
//! An action is a unit of work advanced once per tick. Leaves wait, call
//! back, poll, or drive a coroutine; composites run their children in
//! order, concurrently, on a loop, or on a timeline. Every node is allocated
//! from a per-type pool owned by an [`ActionKit`] context and returned to it
//! when the tree is recycled, so steady-state ticking does not allocate.
//!
//! - **Cooperative**: everything runs on the caller's thread, one
//!   [`Action::execute`] call per tick on each root
//! - **Zero-duration cascade**: a [`Sequence`] drains callbacks and satisfied
//!   conditions within the tick that reaches them
//! - **Explicit context**: pools, frame counter and coroutine scheduler live
//!   in an [`ActionKit`] value instead of globals
//!
//! # Architecture
//!
//! - [`Action`]: core trait; [`ActionCore`] holds lifecycle state and listeners
//! - [`Pool`] and [`ActionPools`]: bounded object reuse
//! - Leaves: [`Delay`], [`DelayFrame`], [`Callback`], [`Condition`],
//!   [`Custom`], [`Coroutine`], [`KeyEvent`]
//! - Composites: [`Sequence`], [`Parallel`], [`Repeat`], [`Timeline`]
//! - [`ActionRunner`]: per-frame driver for root actions
//! - [`fsm`]: state machine helpers
//!
//! # Example
//!
//! ```rust,ignore
//! let kit = ActionKit::default();
//! let mut runner = ActionRunner::new(kit.clone());
//!
//! runner.run(
//!     kit.sequence()
//!         .callback(|| println!("ready"))
//!         .delay(0.5)
//!         .parallel(|p| p.delay(1.0).callback(|| println!("spawned")))
//!         .build(),
//! );
//!
//! loop {
//!     runner.update(1.0 / 60.0);
//! }
//! ```

pub mod action;
pub mod builder;
pub mod config;
pub mod context;
pub mod coroutine;
pub mod custom;
pub mod delay;
pub mod error;
pub mod fsm;
pub mod leaf;
pub mod listener;
pub mod parallel;
pub mod pool;
pub mod repeat;
pub mod runner;
pub mod sequence;
pub mod status;
pub mod timeline;

// Re-export core types for ergonomic API
pub use action::{Action, ActionCore, ActionExt, BoxedAction, current_executing};
pub use builder::{Chain, Container};
pub use config::{ActionKitConfig, PoolConfig};
pub use context::{ActionKit, ActionPools, FrameClock, PooledAction, release};
pub use coroutine::{
    Coroutine, CoroutineScheduler, TaskHandle, TaskState, yield_frame, yield_frames,
};
pub use custom::{Custom, CustomApi};
pub use delay::{Delay, DelayFrame};
pub use error::{FsmError, PoolError};
pub use leaf::{Callback, Condition};
pub use listener::{ListenerHandle, ListenerKind};
pub use parallel::Parallel;
pub use pool::{DefaultFactory, FnFactory, ObjectFactory, Pool, PoolBuilder, Poolable};
pub use repeat::{Repeat, RepeatCount};
pub use runner::ActionRunner;
pub use sequence::Sequence;
pub use status::Status;
pub use timeline::{KeyEvent, Timeline, TimelinePair};

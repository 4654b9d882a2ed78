//! Error types for pool setup and state machines.
//!
//! The per-tick path (`execute`, `reset`, `finish`, `deinit`) never fails:
//! malformed usage there degrades to a no-op. Errors only surface from setup
//! operations and from the FSM helpers, which look states up by key.

/// Errors raised while building or registering pools.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool for `{type_name}` has no factory")]
    MissingFactory { type_name: &'static str },

    #[error("a pool for `{type_name}` is already registered")]
    AlreadyRegistered { type_name: &'static str },
}

/// Errors raised by the state machine helpers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FsmError {
    #[error("state `{0}` is not registered")]
    UnknownState(String),

    #[error("state machine has not been started")]
    NotStarted,

    #[error("no previous state to return to")]
    NoPreviousState,
}

//! Finite state machine helpers for scripted behavior around action trees.
//!
//! - [`StateMachine`]: transition table keyed by state and event values,
//!   with [`StringStateMachine`] for name-keyed machines.
//! - [`EnumStateMachine`]: current/previous tracking without a table.
//! - [`TypedFsm`]: states and events addressed by Rust type, with
//!   transitions looked up through a [`TableIndex`].

mod enum_machine;
mod machine;
mod table;
mod typed;

pub use enum_machine::{EnumStateMachine, StateChange};
pub use machine::{StateMachine, StringStateMachine, Transition};
pub use table::TableIndex;
pub use typed::{FsmState, TransitionRule, TypedFsm};

//! Lifecycle status of an action.

/// Where an action is in its run cycle.
///
/// # Frame-driven Semantics
///
/// Status only moves forward within one run: `NotStarted` → `Started` →
/// `Finished`. [`Action::reset`](crate::Action::reset) is the only way back to
/// `NotStarted`, which is required before a finished action can run again
/// (e.g., inside a [`Repeat`](crate::Repeat)).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    /// The action has not been executed since it was allocated or reset.
    #[default]
    NotStarted,

    /// The start hook ran and the action is waiting for further ticks.
    Started,

    /// The action completed. Further `execute` calls report completion
    /// without running any hook again.
    Finished,
}

impl Status {
    /// Returns `true` if this status is `NotStarted`.
    #[inline]
    pub fn is_not_started(self) -> bool {
        matches!(self, Status::NotStarted)
    }

    /// Returns `true` if this status is `Started`.
    #[inline]
    pub fn is_started(self) -> bool {
        matches!(self, Status::Started)
    }

    /// Returns `true` if this status is `Finished`.
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, Status::Finished)
    }
}

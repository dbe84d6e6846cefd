//! Status returned by behavior nodes.

/// The result of evaluating a behavior for one tick.
///
/// # State Machine
///
/// Every node kind follows the same lifecycle:
/// `Invalid -> Running -> {Success | Failure}`, with `Aborted` reachable
/// from `Running` through external cancellation. `Running` is the only
/// re-enterable state; any other status causes the next tick to start a
/// fresh run.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    /// No run has happened yet, or the behavior was rested for reuse.
    #[default]
    Invalid,

    /// The behavior completed successfully.
    ///
    /// For conditions: The condition was met.
    /// For actions: The action finished its work.
    Success,

    /// The behavior failed.
    ///
    /// For conditions: The condition was not met.
    /// For actions: The action could not be carried out.
    Failure,

    /// The behavior needs more ticks to finish.
    Running,

    /// The behavior was cancelled from outside while running.
    Aborted,

    /// The behavior is parked in the scheduler until a child it started
    /// completes.
    Suspended,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Returns `true` while a run is in progress (`Running` or `Suspended`).
    ///
    /// Active behaviors must not be torn down or rebound.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Status::Running | Status::Suspended)
    }

    /// Returns `true` for a finished run: `Success`, `Failure` or `Aborted`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure | Status::Aborted)
    }

    /// Inverts the status: Success becomes Failure and vice versa.
    ///
    /// Every other status is returned unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}

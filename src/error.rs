//! # Scheduler Errors
//!
//! Registry operations report failures synchronously. The tick and dispatch
//! entry points never fail at runtime, except for a reentrant tick, which
//! is a contract violation rather than a recoverable condition.

use core::fmt;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// Every slot is occupied; the caller may retry later or drop the task.
    RegistryFull,
    /// The handle names an empty slot, or a slot whose occupant changed
    /// since the handle was issued.
    InvalidHandle,
    /// A tick began while a previous tick (or a registry operation) still
    /// held the registry.
    ReentrantTick,
}

impl SchedulerError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SchedulerError::RegistryFull => "task registry is full",
            SchedulerError::InvalidHandle => "task handle does not refer to a live task",
            SchedulerError::ReentrantTick => "tick entered while the registry was in use",
        }
    }

    /// Fatal errors indicate a broken host contract and cannot be retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, SchedulerError::ReentrantTick)
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Error types used by the alarmvisor runtime and its client surface.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the runtime itself (startup, shutdown).
//! - [`AlarmError`]: rejected client requests against the alarm registry.
//!
//! Both types provide `as_label` for logs and a human-readable `Display`.
//! Command-line syntax errors live next to the parser in [`crate::command`].

use std::time::Duration;
use thiserror::Error;

use crate::alarms::AlarmId;

/// # Errors produced by the alarmvisor runtime.
///
/// These represent failures in the orchestration system itself,
/// such as a shutdown sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks remained stuck.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not shut down in time.
        stuck: Vec<String>,
    },

    /// [`AlarmService::launch`](crate::AlarmService::launch) was called twice.
    #[error("alarm service already launched")]
    AlreadyLaunched,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use alarmvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyLaunched => "runtime_already_launched",
        }
    }
}

/// # Rejected alarm requests.
///
/// Returned by the client operations of [`AlarmService`](crate::AlarmService).
/// A rejected request never changes registry state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmError {
    /// No alarm with this id is pending.
    #[error("Alarm({0}) not found")]
    NotFound(AlarmId),

    /// An alarm with this id is already pending.
    #[error("Alarm({0}) already exists")]
    AlreadyExists(AlarmId),

    /// Suspend requested for an alarm that is already suspended.
    #[error("Alarm({0}) is already suspended")]
    AlreadySuspended(AlarmId),

    /// Reactivate requested for an alarm that is already active.
    #[error("Alarm({0}) is already active")]
    AlreadyActive(AlarmId),
}

impl AlarmError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use alarmvisor::{AlarmError, AlarmId};
    ///
    /// let err = AlarmError::NotFound(AlarmId(7));
    /// assert_eq!(err.as_label(), "alarm_not_found");
    /// assert_eq!(err.to_string(), "Alarm(7) not found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AlarmError::NotFound(_) => "alarm_not_found",
            AlarmError::AlreadyExists(_) => "alarm_already_exists",
            AlarmError::AlreadySuspended(_) => "alarm_already_suspended",
            AlarmError::AlreadyActive(_) => "alarm_already_active",
        }
    }

    /// The alarm id the request referred to.
    pub fn alarm(&self) -> AlarmId {
        match *self {
            AlarmError::NotFound(id)
            | AlarmError::AlreadyExists(id)
            | AlarmError::AlreadySuspended(id)
            | AlarmError::AlreadyActive(id) => id,
        }
    }
}

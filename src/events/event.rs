//! # Runtime events emitted by the scheduler, display workers and service.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Alarm events**: registry changes and firing
//! - **Display events**: per-group worker output and lifecycle
//! - **Task events**: background loops starting and stopping
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries optional metadata such as the alarm, group,
//! message and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use alarmvisor::{AlarmId, Event, EventKind, GroupId};
//!
//! let ev = Event::new(EventKind::AlarmFired)
//!     .with_alarm(AlarmId(3))
//!     .with_group(GroupId(1))
//!     .with_seconds(5)
//!     .with_message("tea is ready");
//!
//! assert_eq!(ev.kind, EventKind::AlarmFired);
//! assert_eq!(ev.alarm, Some(AlarmId(3)));
//! assert_eq!(ev.message.as_deref(), Some("tea is ready"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::alarms::{Alarm, AlarmId, GroupId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Alarm events ===
    /// Alarm inserted into the registry.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`
    AlarmStarted,

    /// Alarm group/duration/message replaced; expiry restarted.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`
    AlarmChanged,

    /// Alarm removed on client request.
    ///
    /// Sets: `alarm`, `group`
    AlarmCancelled,

    /// Alarm suspended (kept, no longer displayed).
    ///
    /// Sets: `alarm`, `group`
    AlarmSuspended,

    /// Suspended alarm made active again.
    ///
    /// Sets: `alarm`, `group`
    AlarmReactivated,

    /// Alarm reached its expiry and was removed by the scheduler.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`, `reason` (`"suspended"` if it was inactive)
    AlarmFired,

    // === Display events ===
    /// First sighting of a group: record created and display worker spawned.
    ///
    /// Sets: `group`
    GroupCreated,

    /// A display worker rendered one of its active alarms.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`
    DisplayRendered,

    /// A display worker picked up a changed alarm.
    ///
    /// Sets: `alarm`, `group`, `seconds`, `message`
    DisplayChanged,

    /// A display worker dropped an alarm (cancelled, fired or moved to another group).
    ///
    /// Sets: `alarm`, `group` (the worker's group)
    DisplayStopped,

    /// Group retired by the reaper after its snapshot emptied.
    ///
    /// Sets: `group`
    GroupRetired,

    /// A display worker panicked.
    ///
    /// Sets: `group`, `task`, `reason`
    WorkerDead,

    // === Task events ===
    /// Background task started its loop.
    ///
    /// Sets: `task`
    TaskStarting,

    /// Background task left its loop.
    ///
    /// Sets: `task`
    TaskStopped,

    // === Runtime events ===
    /// Shutdown requested.
    ShutdownRequested,

    /// All tasks stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    GraceExceeded,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Alarm the event is about.
    pub alarm: Option<AlarmId>,
    /// Group the event is about.
    pub group: Option<GroupId>,
    /// Alarm duration in seconds.
    pub seconds: Option<u32>,
    /// Alarm message.
    pub message: Option<Arc<str>>,
    /// Task or subscriber name.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            alarm: None,
            group: None,
            seconds: None,
            message: None,
            task: None,
            reason: None,
        }
    }

    /// Attaches an alarm id.
    #[inline]
    pub fn with_alarm(mut self, id: AlarmId) -> Self {
        self.alarm = Some(id);
        self
    }

    /// Attaches a group id.
    #[inline]
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Attaches a duration in seconds.
    #[inline]
    pub fn with_seconds(mut self, seconds: u32) -> Self {
        self.seconds = Some(seconds);
        self
    }

    /// Attaches a message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches id, group, seconds and message of `alarm`.
    #[inline]
    pub fn with_alarm_fields(self, alarm: &Alarm) -> Self {
        self.with_alarm(alarm.id)
            .with_group(alarm.group)
            .with_seconds(alarm.seconds)
            .with_message(alarm.message.clone())
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_subscriber_overflow_sets_reason() {
        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.task.as_deref(), Some("log"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=log reason=full"));
    }
}

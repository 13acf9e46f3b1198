//! # Alarm entity and identifiers.
//!
//! An [`Alarm`] is a client-submitted timed message bound to a group. Its
//! `expiry` is absolute (monotonic clock) and is recomputed from `seconds`
//! whenever the alarm is changed. Each content change bumps `revision`, which
//! is what display snapshots compare against.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Client-assigned alarm identifier, unique while the alarm is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmId(pub u32);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Client-chosen group tag; each live group gets one display worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A pending alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    /// Identity.
    pub id: AlarmId,
    /// Owning group.
    pub group: GroupId,
    /// Requested duration; also the display pacing period.
    pub seconds: u32,
    /// Bounded message text.
    pub message: Arc<str>,
    /// Absolute expiry instant.
    pub expiry: Instant,
    /// Suspended alarms are kept (and still expire) but not displayed.
    pub active: bool,
    /// Bumped on every change of group, duration or message.
    pub revision: u64,
}

impl Alarm {
    /// Creates an active alarm expiring `seconds` after `now`.
    pub fn new(id: AlarmId, group: GroupId, seconds: u32, message: Arc<str>, now: Instant) -> Self {
        Self {
            id,
            group,
            seconds,
            message,
            expiry: now + Duration::from_secs(u64::from(seconds)),
            active: true,
            revision: 0,
        }
    }

    /// Replaces group, duration and message; expiry restarts from `now`.
    pub fn reset(&mut self, group: GroupId, seconds: u32, message: Arc<str>, now: Instant) {
        self.group = group;
        self.seconds = seconds;
        self.message = message;
        self.expiry = now + Duration::from_secs(u64::from(seconds));
        self.revision += 1;
    }

    /// Time left until expiry, zero once due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expiry.saturating_duration_since(now)
    }

    /// True if the alarm is due at `now`.
    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

/// Truncates `message` to at most `limit` bytes on a char boundary.
///
/// Mirrors the fixed-size message buffer of classic alarm programs while
/// never splitting a UTF-8 sequence.
pub fn bounded_message(message: &str, limit: usize) -> Arc<str> {
    if message.len() <= limit {
        return Arc::from(message);
    }
    let mut end = limit;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    Arc::from(&message[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_message_keeps_short_text() {
        assert_eq!(&*bounded_message("wake up", 64), "wake up");
    }

    #[test]
    fn test_bounded_message_truncates_on_char_boundary() {
        // 'é' is two bytes; a limit of 2 would split it.
        assert_eq!(&*bounded_message("aé", 2), "a");
        assert_eq!(&*bounded_message("abcdef", 3), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_recomputes_expiry_and_bumps_revision() {
        let t0 = Instant::now();
        let mut alarm = Alarm::new(AlarmId(1), GroupId(1), 10, "a".into(), t0);
        assert_eq!(alarm.expiry, t0 + Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        let now = Instant::now();
        alarm.reset(GroupId(2), 3, "b".into(), now);

        assert_eq!(alarm.expiry, now + Duration::from_secs(3));
        assert_eq!(alarm.group, GroupId(2));
        assert_eq!(alarm.revision, 1);
        assert_eq!(alarm.remaining(now), Duration::from_secs(3));
    }
}

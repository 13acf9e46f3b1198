//! # Alarm registry: ordered pending alarms with a deadline rearm signal.
//!
//! The registry is a single [`AlarmQueue`] (a `Vec` kept sorted by ascending
//! expiry) behind one `tokio::sync::Mutex`, plus a [`Notify`] used to tell the
//! scheduler that its armed deadline went stale.
//!
//! ## Architecture
//! ```text
//! client ops ─┐                       ┌─► Scheduler (arm / pop_due)
//! Discovery ──┼──► AlarmRegistry::lock() ─► AlarmsGuard ──┤
//! Workers ────┘        (exclusive)                        └─► rearm.notify_one()
//! ```
//!
//! ## Rules
//! - Every access, read-only or not, goes through the exclusive lock.
//! - Mutations are only reachable through [`AlarmsGuard`]; after each one the
//!   guard compares the earliest expiry with the armed deadline and signals
//!   the scheduler if they differ.
//! - Insertion places an alarm before the first entry whose expiry is not
//!   less than its own (ties: newest first).
//! - Any change to an expiry re-sorts the alarm.

use std::ops::Deref;

use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::time::Instant;

use super::alarm::{Alarm, AlarmId};

/// Pending alarms sorted by ascending expiry.
#[derive(Debug, Default)]
pub struct AlarmQueue {
    alarms: Vec<Alarm>,
    /// Deadline the scheduler is currently waiting on (`None` = idle).
    armed: Option<Instant>,
}

impl AlarmQueue {
    /// Looks up an alarm by id.
    pub fn find(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    /// Iterates alarms in expiry order.
    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Expiry of the soonest alarm.
    pub fn earliest(&self) -> Option<Instant> {
        self.alarms.first().map(|a| a.expiry)
    }

    /// Deadline the scheduler last armed.
    pub fn armed(&self) -> Option<Instant> {
        self.armed
    }

    fn position(&self, id: AlarmId) -> Option<usize> {
        self.alarms.iter().position(|a| a.id == id)
    }

    fn insert(&mut self, alarm: Alarm) {
        let at = self.alarms.partition_point(|a| a.expiry < alarm.expiry);
        self.alarms.insert(at, alarm);
    }

    fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let at = self.position(id)?;
        Some(self.alarms.remove(at))
    }

    fn mutate<F>(&mut self, id: AlarmId, f: F) -> Option<&Alarm>
    where
        F: FnOnce(&mut Alarm),
    {
        let at = self.position(id)?;
        let before = self.alarms[at].expiry;
        f(&mut self.alarms[at]);

        if self.alarms[at].expiry == before {
            return Some(&self.alarms[at]);
        }
        let alarm = self.alarms.remove(at);
        self.insert(alarm);
        self.find(id)
    }

    /// True when the scheduler is waiting on something other than the earliest expiry.
    fn is_stale(&self) -> bool {
        self.earliest() != self.armed
    }
}

/// Exclusive access to the registry.
///
/// Derefs to [`AlarmQueue`] for lookups; all mutations go through the guard so
/// that the scheduler is rearmed whenever the earliest deadline moves.
pub struct AlarmsGuard<'a> {
    queue: MutexGuard<'a, AlarmQueue>,
    rearm: &'a Notify,
}

impl Deref for AlarmsGuard<'_> {
    type Target = AlarmQueue;

    fn deref(&self) -> &AlarmQueue {
        &self.queue
    }
}

impl AlarmsGuard<'_> {
    /// Inserts in expiry order; wakes the scheduler if this is now the earliest deadline.
    pub fn insert(&mut self, alarm: Alarm) {
        self.queue.insert(alarm);
        self.signal_if_stale();
    }

    /// Removes an alarm by id.
    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let removed = self.queue.remove(id);
        if removed.is_some() {
            self.signal_if_stale();
        }
        removed
    }

    /// Mutates an alarm in place, re-sorting it if its expiry changed.
    ///
    /// Returns the updated alarm, or `None` if no alarm has this id.
    pub fn mutate<F>(&mut self, id: AlarmId, f: F) -> Option<Alarm>
    where
        F: FnOnce(&mut Alarm),
    {
        let updated = self.queue.mutate(id, f).cloned();
        if updated.is_some() {
            self.signal_if_stale();
        }
        updated
    }

    /// Records the earliest expiry as the armed deadline and returns it.
    pub(crate) fn arm(&mut self) -> Option<Instant> {
        self.queue.armed = self.queue.earliest();
        self.queue.armed
    }

    /// Detaches the earliest alarm if it is due at `now`.
    ///
    /// Detach and fire happen under the same lock, so the alarm is never
    /// outside the registry without being on the firing path.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<Alarm> {
        if !self.queue.alarms.first()?.is_due(now) {
            return None;
        }
        self.queue.armed = None;
        Some(self.queue.alarms.remove(0))
    }

    fn signal_if_stale(&self) {
        if self.queue.is_stale() {
            self.rearm.notify_one();
        }
    }
}

/// Shared alarm registry.
#[derive(Debug, Default)]
pub struct AlarmRegistry {
    queue: Mutex<AlarmQueue>,
    rearm: Notify,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the exclusive registry lock.
    pub async fn lock(&self) -> AlarmsGuard<'_> {
        AlarmsGuard {
            queue: self.queue.lock().await,
            rearm: &self.rearm,
        }
    }

    /// Resolves when the armed deadline has gone stale.
    ///
    /// A signal sent while nobody waits is kept, so a rearm between releasing
    /// the lock and awaiting here is not lost.
    pub(crate) async fn rearmed(&self) {
        self.rearm.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::GroupId;
    use std::time::Duration;

    fn alarm(id: u32, seconds: u32, now: Instant) -> Alarm {
        Alarm::new(AlarmId(id), GroupId(1), seconds, "m".into(), now)
    }

    fn ids(q: &AlarmQueue) -> Vec<u32> {
        q.iter().map(|a| a.id.0).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_keeps_expiry_order() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        let mut g = reg.lock().await;
        g.insert(alarm(1, 30, now));
        g.insert(alarm(2, 10, now));
        g.insert(alarm(3, 20, now));
        assert_eq!(ids(&g), vec![2, 3, 1]);
        assert_eq!(g.earliest(), Some(now + Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_places_new_alarm_before_equal_expiry() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        let mut g = reg.lock().await;
        g.insert(alarm(1, 5, now));
        g.insert(alarm(2, 5, now));
        assert_eq!(ids(&g), vec![2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutate_resorts_on_expiry_change() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        let mut g = reg.lock().await;
        g.insert(alarm(1, 10, now));
        g.insert(alarm(2, 20, now));

        let updated = g
            .mutate(AlarmId(1), |a| a.reset(GroupId(4), 30, "x".into(), now))
            .expect("alarm 1 exists");
        assert_eq!(updated.group, GroupId(4));
        assert_eq!(ids(&g), vec![2, 1]);

        assert!(g.mutate(AlarmId(9), |a| a.active = false).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_find() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        let mut g = reg.lock().await;
        g.insert(alarm(1, 10, now));
        assert!(g.find(AlarmId(1)).is_some());
        assert_eq!(g.remove(AlarmId(1)).map(|a| a.id), Some(AlarmId(1)));
        assert!(g.find(AlarmId(1)).is_none());
        assert!(g.remove(AlarmId(1)).is_none());
        assert!(g.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_insert_signals_rearm() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        {
            let mut g = reg.lock().await;
            g.insert(alarm(1, 10, now));
            assert_eq!(g.arm(), Some(now + Duration::from_secs(10)));
        }
        // Drain the permit left by the first insert.
        reg.rearmed().await;

        {
            let mut g = reg.lock().await;
            g.insert(alarm(2, 20, now));
            assert!(!g.is_stale(), "later insert must not preempt");
            g.insert(alarm(3, 1, now));
            assert!(g.is_stale());
        }
        tokio::time::timeout(Duration::from_millis(10), reg.rearmed())
            .await
            .expect("earlier insert must signal the scheduler");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_due_only_returns_expired_front() {
        let reg = AlarmRegistry::new();
        let now = Instant::now();
        let mut g = reg.lock().await;
        g.insert(alarm(1, 0, now));
        g.insert(alarm(2, 5, now));

        assert_eq!(g.pop_due(now).map(|a| a.id), Some(AlarmId(1)));
        assert!(g.pop_due(now).is_none());
        assert_eq!(
            g.pop_due(now + Duration::from_secs(5)).map(|a| a.id),
            Some(AlarmId(2))
        );
        assert!(g.pop_due(now + Duration::from_secs(60)).is_none());
    }
}

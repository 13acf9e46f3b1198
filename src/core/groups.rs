//! # Group registry: one record per live group.
//!
//! Each [`GroupRecord`] owns the handle of its display worker (join handle +
//! cancellation token) and the worker's private snapshot of the group's
//! alarms. The table itself sits behind the [`Gate`]; the snapshot has its own
//! mutex so that Discovery can push entries while holding only read access.
//!
//! ## Lock order
//! ```text
//! Gate (read | write) ──► AlarmRegistry mutex ──► GroupRecord::display mutex
//! ```
//! Every task acquires in this order and never the other way around.
//!
//! ## Rules
//! - Records are created by Discovery (write access) and removed by the Reaper
//!   (write access) or on shutdown.
//! - Under write access nobody else can hold a snapshot lock, so the Reaper
//!   inspects snapshots through `Mutex::get_mut` without locking.
//! - Retirement is cooperative: cancel the worker's token, release the gate,
//!   then join.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::gate::Gate;
use crate::alarms::{Alarm, AlarmId, GroupId};

/// Displayable copy of one alarm, owned by a group's snapshot.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotEntry {
    pub alarm: AlarmId,
    pub group: GroupId,
    pub seconds: u32,
    pub message: Arc<str>,
    pub active: bool,
    pub revision: u64,
    /// Next instant this entry may be rendered.
    pub next_render: Instant,
}

impl SnapshotEntry {
    /// Copies the displayable fields of `alarm`; first render is due at `now`.
    pub fn copy_of(alarm: &Alarm, now: Instant) -> Self {
        Self {
            alarm: alarm.id,
            group: alarm.group,
            seconds: alarm.seconds,
            message: alarm.message.clone(),
            active: alarm.active,
            revision: alarm.revision,
            next_render: now,
        }
    }

    /// Refreshes the copy from a newer revision of the live alarm.
    pub fn refresh(&mut self, alarm: &Alarm, now: Instant) {
        *self = Self::copy_of(alarm, now);
    }

    /// Pushes the next render one alarm period past `now`.
    pub fn pace(&mut self, now: Instant) {
        self.next_render = now + Duration::from_secs(u64::from(self.seconds));
    }
}

/// A live group: its worker handle and private snapshot.
pub(crate) struct GroupRecord {
    pub display: Mutex<Vec<SnapshotEntry>>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl GroupRecord {
    pub fn new(seed: Vec<SnapshotEntry>, cancel: CancellationToken, join: JoinHandle<()>) -> Self {
        Self {
            display: Mutex::new(seed),
            cancel,
            join,
        }
    }

    /// True when the snapshot is empty or the worker already exited.
    ///
    /// Requires exclusive access to the record (gate write access).
    pub fn is_reapable(&mut self) -> bool {
        self.display.get_mut().is_empty() || self.join.is_finished()
    }

    /// Signals the worker to stop at its next cancellation point.
    pub fn signal_retire(&self) {
        self.cancel.cancel();
    }

    /// Waits for the worker to exit.
    ///
    /// Call [`signal_retire`](Self::signal_retire) first and release the gate
    /// before awaiting: the worker may be queued on the gate.
    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }
}

/// Group table: group id to record, ordered by id.
pub(crate) type GroupTable = BTreeMap<GroupId, GroupRecord>;

/// Group registry guarded by the reader/writer gate.
#[derive(Default)]
pub struct GroupRegistry {
    pub(crate) gate: Gate<GroupTable>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live group ids in ascending order.
    pub async fn list(&self) -> Vec<GroupId> {
        self.gate.acquire_read().await.keys().copied().collect()
    }

    /// Alarm ids currently in a group's snapshot, in snapshot order.
    pub async fn snapshot_of(&self, group: GroupId) -> Option<Vec<AlarmId>> {
        let table = self.gate.acquire_read().await;
        let record = table.get(&group)?;
        let display = record.display.lock().await;
        Some(display.iter().map(|e| e.alarm).collect())
    }

    /// Unlinks every reapable record and signals its worker to retire.
    ///
    /// Runs under write access; the caller joins the returned records after
    /// releasing the gate.
    pub(crate) fn take_reapable(table: &mut GroupTable) -> Vec<(GroupId, GroupRecord)> {
        let reapable: Vec<GroupId> = table
            .iter_mut()
            .filter_map(|(id, rec)| rec.is_reapable().then_some(*id))
            .collect();

        reapable
            .into_iter()
            .filter_map(|id| table.remove(&id).map(|rec| (id, rec)))
            .inspect(|(_, rec)| rec.signal_retire())
            .collect()
    }

    /// Unlinks every record and signals all workers to retire.
    pub(crate) async fn take_all(&self) -> Vec<(GroupId, GroupRecord)> {
        let drained: Vec<(GroupId, GroupRecord)> = {
            let mut table = self.gate.acquire_write().await;
            std::mem::take(&mut *table).into_iter().collect()
        };
        for (_, rec) in &drained {
            rec.signal_retire();
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked_record(seed: Vec<SnapshotEntry>) -> GroupRecord {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = tokio::spawn(async move { token.cancelled().await });
        GroupRecord::new(seed, cancel, join)
    }

    fn entry(id: u32, now: Instant) -> SnapshotEntry {
        let alarm = Alarm::new(AlarmId(id), GroupId(1), 5, "m".into(), now);
        SnapshotEntry::copy_of(&alarm, now)
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_reapable_only_takes_empty_groups() {
        let reg = GroupRegistry::new();
        let now = Instant::now();
        {
            let mut table = reg.gate.acquire_write().await;
            table.insert(GroupId(1), parked_record(vec![entry(1, now)]));
            table.insert(GroupId(2), parked_record(Vec::new()));
        }

        let taken = {
            let mut table = reg.gate.acquire_write().await;
            GroupRegistry::take_reapable(&mut table)
        };
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].0, GroupId(2));
        for (_, rec) in taken {
            rec.join().await.expect("parked worker exits on retire");
        }

        assert_eq!(reg.list().await, vec![GroupId(1)]);
        assert_eq!(reg.snapshot_of(GroupId(1)).await, Some(vec![AlarmId(1)]));
        assert_eq!(reg.snapshot_of(GroupId(2)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_worker_is_reapable() {
        let now = Instant::now();
        let join = tokio::spawn(async {});
        let mut rec = GroupRecord::new(vec![entry(1, now)], CancellationToken::new(), join);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(rec.is_reapable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_all_drains_table() {
        let reg = GroupRegistry::new();
        {
            let mut table = reg.gate.acquire_write().await;
            table.insert(GroupId(3), parked_record(Vec::new()));
            table.insert(GroupId(4), parked_record(Vec::new()));
        }
        let drained = reg.take_all().await;
        assert_eq!(drained.len(), 2);
        for (_, rec) in drained {
            rec.join().await.unwrap();
        }
        assert!(reg.list().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_uses_alarm_seconds() {
        let now = Instant::now();
        let mut e = entry(1, now);
        assert_eq!(e.next_render, now);
        e.pace(now);
        assert_eq!(e.next_render, now + Duration::from_secs(5));
    }
}

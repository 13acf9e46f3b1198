//! # Group discovery: spawns display workers and feeds their snapshots.
//!
//! ```text
//! loop:
//!   read access ─► registry lock ─► for each alarm:
//!       known group, entry missing → push snapshot entry
//!       unknown group              → remember, continue
//!   any unknown? → release, write access ─► registry lock ─► same pass,
//!                  creating records (spawn worker, seed snapshot)
//!   release ─► publish GroupCreated ─► pause(poll)
//! ```
//!
//! New alarms become visible to their group's worker within one poll
//! interval. Workers are spawned on child tokens of the runtime token, so
//! shutdown reaches them even before the reaper does.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::display::DisplayWorker;
use super::groups::{GroupRecord, GroupTable, SnapshotEntry};
use super::runner::{Context, supervised};
use crate::alarms::{Alarm, AlarmQueue};
use crate::events::{Event, EventKind};

pub(crate) const TASK_NAME: &str = "discovery";

/// Runs the discovery loop until `token` is cancelled.
pub(crate) async fn run(ctx: Context, token: CancellationToken) {
    supervised(TASK_NAME, &ctx.bus, async {
        loop {
            if token.is_cancelled() {
                break;
            }
            let unseen = {
                let table = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    table = ctx.groups.gate.acquire_read() => table,
                };
                let alarms = ctx.alarms.lock().await;
                track_known(&table, &alarms).await
            };

            if unseen {
                let created = {
                    let mut table = tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        table = ctx.groups.gate.acquire_write() => table,
                    };
                    let alarms = ctx.alarms.lock().await;
                    track_creating(&ctx, &mut table, &alarms, &token)
                };
                for ev in created {
                    ctx.bus.publish(ev);
                }
            }

            if !ctx.pause(&token).await {
                break;
            }
        }
    })
    .await;
}

/// Adds missing entries to existing groups. Returns true if some alarm names
/// a group without a record.
async fn track_known(table: &GroupTable, alarms: &AlarmQueue) -> bool {
    let now = Instant::now();
    let mut unseen = false;
    for alarm in alarms.iter() {
        match table.get(&alarm.group) {
            Some(record) => track(&mut *record.display.lock().await, alarm, now),
            None => unseen = true,
        }
    }
    unseen
}

/// Same pass as [`track_known`] under write access, creating records for
/// unseen groups. Returns the `GroupCreated` events to publish.
fn track_creating(
    ctx: &Context,
    table: &mut GroupTable,
    alarms: &AlarmQueue,
    runtime: &CancellationToken,
) -> Vec<Event> {
    let now = Instant::now();
    let mut created = Vec::new();
    for alarm in alarms.iter() {
        let record = table.entry(alarm.group).or_insert_with(|| {
            let token = runtime.child_token();
            let join = DisplayWorker::spawn(alarm.group, ctx.clone(), token.clone());
            tracing::debug!(group = %alarm.group, "display worker spawned");
            created.push(Event::new(EventKind::GroupCreated).with_group(alarm.group));
            GroupRecord::new(Vec::new(), token, join)
        });
        track(record.display.get_mut(), alarm, now);
    }
    created
}

fn track(display: &mut Vec<SnapshotEntry>, alarm: &Alarm, now: Instant) {
    if !display.iter().any(|e| e.alarm == alarm.id) {
        display.push(SnapshotEntry::copy_of(alarm, now));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::alarms::{AlarmId, AlarmRegistry, GroupId};
    use crate::core::groups::GroupRegistry;
    use crate::events::Bus;

    fn context() -> Context {
        Context {
            alarms: Arc::new(AlarmRegistry::new()),
            groups: Arc::new(GroupRegistry::new()),
            bus: Bus::new(256),
            poll: Duration::from_secs(1),
        }
    }

    async fn start(ctx: &Context, id: u32, group: u32) {
        ctx.alarms.lock().await.insert(Alarm::new(
            AlarmId(id),
            GroupId(group),
            60,
            "m".into(),
            Instant::now(),
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_creates_one_group_per_id_and_seeds_snapshots() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        start(&ctx, 1, 1).await;
        start(&ctx, 2, 1).await;
        start(&ctx, 3, 2).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(ctx.clone(), token.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(ctx.groups.list().await, vec![GroupId(1), GroupId(2)]);
        let mut g1 = ctx.groups.snapshot_of(GroupId(1)).await.unwrap();
        g1.sort();
        assert_eq!(g1, vec![AlarmId(1), AlarmId(2)]);
        assert_eq!(ctx.groups.snapshot_of(GroupId(2)).await, Some(vec![AlarmId(3)]));

        let mut created = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::GroupCreated {
                created += 1;
            }
        }
        assert_eq!(created, 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_alarm_reaches_existing_group_within_one_poll() {
        let ctx = context();
        start(&ctx, 1, 5).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(ctx.clone(), token.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        start(&ctx, 2, 5).await;
        tokio::time::sleep(ctx.poll).await;

        let mut ids = ctx.groups.snapshot_of(GroupId(5)).await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![AlarmId(1), AlarmId(2)]);
        assert_eq!(ctx.groups.list().await, vec![GroupId(5)]);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_cancel_reaches_spawned_workers() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        start(&ctx, 1, 9).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(ctx.clone(), token.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        handle.await.unwrap();

        let mut stopped = Vec::new();
        while stopped.len() < 2 {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::TaskStopped {
                stopped.push(ev.task.unwrap().to_string());
            }
        }
        stopped.sort();
        assert_eq!(stopped, vec!["discovery", "display-group-9"]);
    }
}

//! # Group reaper: retires display workers of emptied groups.
//!
//! ```text
//! loop:
//!   write access (excludes discovery and every worker)
//!     └─► unlink records with an empty snapshot or a finished worker
//!         and cancel their tokens
//!   release ─► join each worker ─► GroupRetired | WorkerDead
//!   pause(poll)
//! ```
//!
//! A group whose last alarm is cancelled is retired within two poll
//! intervals: one for its worker to drop the entry, one for the reaper pass.
//! A worker that panicked is reaped as `WorkerDead`; if its group still has
//! alarms, discovery creates a fresh worker on its next pass.

use tokio_util::sync::CancellationToken;

use super::groups::{GroupRecord, GroupRegistry};
use super::runner::{Context, display_task, supervised};
use crate::alarms::GroupId;
use crate::events::{Bus, Event, EventKind};

pub(crate) const TASK_NAME: &str = "reaper";

/// Runs the reaper loop until `token` is cancelled.
pub(crate) async fn run(ctx: Context, token: CancellationToken) {
    supervised(TASK_NAME, &ctx.bus, async {
        loop {
            if token.is_cancelled() {
                break;
            }
            let retired = {
                let mut table = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    table = ctx.groups.gate.acquire_write() => table,
                };
                GroupRegistry::take_reapable(&mut table)
            };
            join_retired(&ctx.bus, retired).await;

            if !ctx.pause(&token).await {
                break;
            }
        }
    })
    .await;
}

/// Joins unlinked records and reports each outcome.
///
/// Must be called without gate access held.
pub(crate) async fn join_retired(bus: &Bus, retired: Vec<(GroupId, GroupRecord)>) {
    for (group, record) in retired {
        match record.join().await {
            Ok(()) => {
                tracing::debug!(%group, "display worker retired");
                bus.publish(Event::new(EventKind::GroupRetired).with_group(group));
            }
            Err(err) => {
                tracing::error!(%group, error = %err, "display worker died");
                bus.publish(
                    Event::new(EventKind::WorkerDead)
                        .with_group(group)
                        .with_task(display_task(group))
                        .with_reason(err.to_string()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::alarms::{Alarm, AlarmId, AlarmRegistry};
    use crate::core::groups::SnapshotEntry;

    fn context() -> Context {
        Context {
            alarms: Arc::new(AlarmRegistry::new()),
            groups: Arc::new(GroupRegistry::new()),
            bus: Bus::new(256),
            poll: Duration::from_secs(1),
        }
    }

    async fn insert_record(
        ctx: &Context,
        group: u32,
        seed: Vec<SnapshotEntry>,
        join: tokio::task::JoinHandle<()>,
        cancel: CancellationToken,
    ) {
        let mut table = ctx.groups.gate.acquire_write().await;
        table.insert(GroupId(group), GroupRecord::new(seed, cancel, join));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retires_empty_groups_only() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();

        let parked = |cancel: &CancellationToken| {
            let token = cancel.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        let now = Instant::now();
        let alarm = Alarm::new(AlarmId(1), GroupId(1), 60, "m".into(), now);

        let busy = CancellationToken::new();
        let seed = vec![SnapshotEntry::copy_of(&alarm, now)];
        insert_record(&ctx, 1, seed, parked(&busy), busy.clone()).await;
        let idle = CancellationToken::new();
        insert_record(&ctx, 2, Vec::new(), parked(&idle), idle.clone()).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(ctx.clone(), token.clone()));

        let retired = loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::GroupRetired {
                break ev;
            }
        };
        assert_eq!(retired.group, Some(GroupId(2)));
        assert!(idle.is_cancelled());
        assert!(!busy.is_cancelled());
        assert_eq!(ctx.groups.list().await, vec![GroupId(1)]);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicked_worker_is_reported_dead() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        let now = Instant::now();
        let alarm = Alarm::new(AlarmId(1), GroupId(4), 60, "m".into(), now);

        let join: tokio::task::JoinHandle<()> = tokio::spawn(async { panic!("render failed") });
        let seed = vec![SnapshotEntry::copy_of(&alarm, now)];
        insert_record(&ctx, 4, seed, join, CancellationToken::new()).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(ctx.clone(), token.clone()));

        let dead = loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::WorkerDead {
                break ev;
            }
        };
        assert_eq!(dead.group, Some(GroupId(4)));
        assert_eq!(dead.task.as_deref(), Some("display-group-4"));
        assert!(ctx.groups.list().await.is_empty());

        token.cancel();
        handle.await.unwrap();
    }
}

//! # Display worker: one per live group.
//!
//! Periodically reconciles the group's private snapshot against the live
//! alarm registry and renders the group's active alarms.
//!
//! ```text
//! loop:
//!   select { cancel → exit, gate.acquire_read() }
//!   registry lock ─► own snapshot lock ─► reconcile ─► collect notices
//!   release all ─► publish notices ─► pause(poll)
//! ```
//!
//! ## Reconciliation, per snapshot entry
//! | live alarm                        | action                                  |
//! |-----------------------------------|-----------------------------------------|
//! | missing                           | drop entry, `DisplayStopped`            |
//! | moved to another group            | drop entry, `DisplayStopped`            |
//! | revision changed                  | refresh entry, `DisplayChanged`         |
//! | suspended                         | keep entry, no render                   |
//! | reactivated                       | render on this pass                     |
//! | active and `next_render` reached  | `DisplayRendered`, pace by `seconds`    |
//!
//! Cancellation is observed at the loop top, while queued on the gate and
//! during the pause; never while holding a lock.

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::groups::{GroupTable, SnapshotEntry};
use super::runner::{Context, display_task, supervised};
use crate::alarms::GroupId;
use crate::events::{Event, EventKind};

pub(crate) struct DisplayWorker {
    group: GroupId,
    ctx: Context,
}

impl DisplayWorker {
    /// Spawns the worker for `group`; it runs until `token` is cancelled.
    pub fn spawn(group: GroupId, ctx: Context, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(Self { group, ctx }.run(token))
    }

    async fn run(self, token: CancellationToken) {
        supervised(display_task(self.group), &self.ctx.bus, async {
            loop {
                if token.is_cancelled() {
                    break;
                }
                let notices = {
                    let table = tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        table = self.ctx.groups.gate.acquire_read() => table,
                    };
                    self.reconcile(&table).await
                };
                for ev in notices {
                    self.ctx.bus.publish(ev);
                }
                if !self.ctx.pause(&token).await {
                    break;
                }
            }
        })
        .await;
    }

    /// One pass over the snapshot; returns the notices to publish, in order.
    async fn reconcile(&self, table: &GroupTable) -> Vec<Event> {
        let alarms = self.ctx.alarms.lock().await;
        let Some(record) = table.get(&self.group) else {
            return Vec::new();
        };
        let mut display = record.display.lock().await;
        let now = Instant::now();
        let mut notices = Vec::new();

        display.retain_mut(|entry| {
            let live = match alarms.find(entry.alarm) {
                Some(live) if live.group == self.group => live,
                moved_or_gone => {
                    if let Some(live) = moved_or_gone {
                        tracing::debug!(
                            alarm = %entry.alarm,
                            from = %self.group,
                            to = %live.group,
                            "alarm moved"
                        );
                    }
                    notices.push(self.notice(EventKind::DisplayStopped, entry));
                    return false;
                }
            };

            if live.revision != entry.revision {
                entry.refresh(live, now);
                notices.push(
                    self.notice(EventKind::DisplayChanged, entry)
                        .with_message(entry.message.clone()),
                );
            }
            if live.active != entry.active {
                entry.active = live.active;
                if live.active {
                    entry.next_render = now;
                }
            }

            if entry.active && entry.next_render <= now {
                notices.push(
                    self.notice(EventKind::DisplayRendered, entry)
                        .with_seconds(entry.seconds)
                        .with_message(entry.message.clone()),
                );
                entry.pace(now);
            }
            true
        });
        notices
    }

    fn notice(&self, kind: EventKind, entry: &SnapshotEntry) -> Event {
        Event::new(kind)
            .with_alarm(entry.alarm)
            .with_group(entry.group)
            .with_task(display_task(self.group))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::broadcast;

    use super::*;
    use crate::alarms::{Alarm, AlarmId, AlarmRegistry};
    use crate::core::groups::{GroupRecord, GroupRegistry};
    use crate::events::Bus;

    const G: GroupId = GroupId(1);

    fn context() -> Context {
        Context {
            alarms: Arc::new(AlarmRegistry::new()),
            groups: Arc::new(GroupRegistry::new()),
            bus: Bus::new(256),
            poll: Duration::from_secs(1),
        }
    }

    /// Registers group `G` with a live worker seeded from the registry.
    async fn start_worker(ctx: &Context) -> CancellationToken {
        let token = CancellationToken::new();
        let mut table = ctx.groups.gate.acquire_write().await;
        let now = Instant::now();
        let seed = ctx
            .alarms
            .lock()
            .await
            .iter()
            .map(|a| SnapshotEntry::copy_of(a, now))
            .collect();
        let join = DisplayWorker::spawn(G, ctx.clone(), token.clone());
        table.insert(G, GroupRecord::new(seed, token.clone(), join));
        token
    }

    async fn next_display(rx: &mut broadcast::Receiver<Event>) -> Event {
        loop {
            let ev = rx.recv().await.unwrap();
            if matches!(
                ev.kind,
                EventKind::DisplayRendered | EventKind::DisplayChanged | EventKind::DisplayStopped
            ) {
                return ev;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_paced_by_alarm_seconds() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        let t0 = Instant::now();
        ctx.alarms
            .lock()
            .await
            .insert(Alarm::new(AlarmId(1), G, 3, "tea".into(), t0));
        let token = start_worker(&ctx).await;

        let first = next_display(&mut rx).await;
        assert_eq!(first.kind, EventKind::DisplayRendered);
        assert_eq!(first.message.as_deref(), Some("tea"));
        let second = next_display(&mut rx).await;
        assert_eq!(second.kind, EventKind::DisplayRendered);
        assert!(Instant::now() - t0 >= Duration::from_secs(3));

        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_alarm_stops_exactly_once() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        ctx.alarms
            .lock()
            .await
            .insert(Alarm::new(AlarmId(1), G, 30, "x".into(), Instant::now()));
        let token = start_worker(&ctx).await;

        assert_eq!(next_display(&mut rx).await.kind, EventKind::DisplayRendered);
        ctx.alarms.lock().await.remove(AlarmId(1));

        let stopped = next_display(&mut rx).await;
        assert_eq!(stopped.kind, EventKind::DisplayStopped);
        assert_eq!(stopped.alarm, Some(AlarmId(1)));
        assert_eq!(ctx.groups.snapshot_of(G).await, Some(Vec::new()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        while let Ok(ev) = rx.try_recv() {
            assert_ne!(ev.kind, EventKind::DisplayStopped, "stopped notice repeated");
        }
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_emits_notice_before_render() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        ctx.alarms
            .lock()
            .await
            .insert(Alarm::new(AlarmId(1), G, 30, "old".into(), Instant::now()));
        let token = start_worker(&ctx).await;
        assert_eq!(next_display(&mut rx).await.kind, EventKind::DisplayRendered);

        ctx.alarms.lock().await.mutate(AlarmId(1), |a| {
            a.reset(G, 30, "new".into(), Instant::now());
        });

        let changed = next_display(&mut rx).await;
        assert_eq!(changed.kind, EventKind::DisplayChanged);
        assert_eq!(changed.message.as_deref(), Some("new"));
        let rendered = next_display(&mut rx).await;
        assert_eq!(rendered.kind, EventKind::DisplayRendered);
        assert_eq!(rendered.message.as_deref(), Some("new"));
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_suspended_entry_is_kept_but_not_rendered() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        ctx.alarms
            .lock()
            .await
            .insert(Alarm::new(AlarmId(1), G, 1, "x".into(), Instant::now()));
        ctx.alarms.lock().await.mutate(AlarmId(1), |a| a.active = false);
        let token = start_worker(&ctx).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        while let Ok(ev) = rx.try_recv() {
            assert_ne!(ev.kind, EventKind::DisplayRendered);
        }
        assert_eq!(ctx.groups.snapshot_of(G).await, Some(vec![AlarmId(1)]));
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_exits_on_cancel() {
        let ctx = context();
        let mut rx = ctx.bus.subscribe();
        let token = start_worker(&ctx).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::TaskStopped {
                assert_eq!(ev.task.as_deref(), Some("display-group-1"));
                break;
            }
        }
    }
}

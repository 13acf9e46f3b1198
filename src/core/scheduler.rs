//! # Earliest-deadline scheduler.
//!
//! A single task that always waits for the soonest expiry in the
//! [`AlarmRegistry`](crate::alarms::AlarmRegistry) and fires exactly one alarm
//! per wakeup.
//!
//! ```text
//! loop:
//!   lock ─► arm(earliest) ─► unlock
//!   None        → wait for rearm | cancel
//!   due already → pop_due ─► publish AlarmFired
//!   otherwise   → select { cancel, rearm → restart, sleep_until(at) → pop_due }
//! ```
//!
//! ## Rules
//! - Any insertion or mutation that moves the earliest deadline signals a
//!   rearm, which abandons the current wait: the scheduler never sleeps past
//!   a deadline inserted while it slept.
//! - An alarm leaves the registry only through `pop_due`, under the lock.
//! - Fired alarms are published and dropped, never reinserted.
//! - Suspended alarms still fire; their event carries reason `"suspended"`.

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::runner::{Context, supervised};
use crate::events::{Event, EventKind};

pub(crate) const TASK_NAME: &str = "scheduler";

/// Runs the scheduler loop until `token` is cancelled.
pub(crate) async fn run(ctx: Context, token: CancellationToken) {
    supervised(TASK_NAME, &ctx.bus, async {
        loop {
            if token.is_cancelled() {
                break;
            }
            let deadline = ctx.alarms.lock().await.arm();

            let Some(at) = deadline else {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ctx.alarms.rearmed() => continue,
                }
            };

            if at > Instant::now() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ctx.alarms.rearmed() => {
                        tracing::trace!("armed deadline preempted");
                        continue;
                    }
                    _ = sleep_until(at) => {}
                }
            }
            fire_due(&ctx).await;
        }
    })
    .await;
}

/// Detaches the earliest alarm if due and publishes it.
async fn fire_due(ctx: &Context) {
    let fired = ctx.alarms.lock().await.pop_due(Instant::now());
    let Some(alarm) = fired else {
        return;
    };

    tracing::debug!(alarm = %alarm.id, group = %alarm.group, "alarm fired");
    let mut ev = Event::new(EventKind::AlarmFired).with_alarm_fields(&alarm);
    if !alarm.active {
        ev = ev.with_reason("suspended");
    }
    ctx.bus.publish(ev);
}

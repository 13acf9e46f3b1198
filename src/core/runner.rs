//! # Shared plumbing for the runtime's long-lived loops.
//!
//! Every background loop (scheduler, discovery, reaper, display workers) runs
//! inside [`supervised`], which brackets it with `TaskStarting` /
//! `TaskStopped` events, and paces itself with [`Context::pause`].
//!
//! ```text
//! supervised(name):
//!   publish TaskStarting(name)
//!   body.await            (returns on cancellation)
//!   publish TaskStopped(name)
//! ```
//!
//! A body that panics never reaches `TaskStopped`; the reaper reports such a
//! display worker as `WorkerDead` when it joins it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::groups::GroupRegistry;
use crate::alarms::{AlarmRegistry, GroupId};
use crate::events::{Bus, Event, EventKind};

/// Handles shared by every loop of one service instance.
#[derive(Clone)]
pub(crate) struct Context {
    pub alarms: Arc<AlarmRegistry>,
    pub groups: Arc<GroupRegistry>,
    pub bus: Bus,
    pub poll: Duration,
}

impl Context {
    /// Sleeps one poll interval. Returns false if `token` was cancelled first.
    pub async fn pause(&self, token: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(self.poll) => true,
        }
    }
}

/// Task name of a group's display worker.
pub(crate) fn display_task(group: GroupId) -> String {
    format!("display-group-{group}")
}

/// Runs `body` between `TaskStarting` and `TaskStopped` events for `name`.
pub(crate) async fn supervised<F>(name: impl Into<Arc<str>>, bus: &Bus, body: F)
where
    F: Future<Output = ()>,
{
    let name: Arc<str> = name.into();
    tracing::debug!(task = %name, "task starting");
    bus.publish(Event::new(EventKind::TaskStarting).with_task(name.clone()));

    body.await;

    tracing::debug!(task = %name, "task stopped");
    bus.publish(Event::new(EventKind::TaskStopped).with_task(name));
}

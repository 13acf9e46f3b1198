//! # Alarm service: client operations and runtime lifecycle.
//!
//! [`AlarmService`] owns the alarm registry, the group registry and the event
//! bus, and drives the background tasks:
//!
//! ```text
//!             launch()
//!                │
//!   ┌────────────┼─────────────┬──────────────┬───────────────┐
//!   ▼            ▼             ▼              ▼               ▼
//! listener   scheduler     discovery       reaper     (display workers,
//! (bus →     (deadline     (spawns +      (retires     spawned by discovery
//!  alive +    wakeup)       feeds)         empty)      on child tokens)
//!  subs)
//! ```
//!
//! ## Client operations
//! `start`, `change`, `cancel`, `suspend`, `reactivate` take the registry lock
//! once, validate, mutate and publish the matching alarm event. A rejected
//! request returns [`AlarmError`] and changes nothing.
//!
//! ## Shutdown
//! 1. publish `ShutdownRequested`, cancel the runtime token
//! 2. within `grace`: join scheduler/discovery/reaper, then retire every group
//! 3. publish `AllStoppedWithin` or `GraceExceeded` (stuck tasks from the alive tracker)
//! 4. stop the listener after it drained the bus, flush subscribers
//!
//! ## Example
//! ```rust
//! use alarmvisor::{AlarmId, AlarmService, Config, GroupId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = AlarmService::builder(Config::default()).build();
//!     svc.launch().await?;
//!
//!     svc.start(AlarmId(1), GroupId(1), 5, "stretch").await?;
//!     svc.suspend(AlarmId(1)).await?;
//!     assert!(!svc.snapshot_all().await[0].active);
//!
//!     svc.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::alive::AliveTracker;
use super::builder::AlarmServiceBuilder;
use super::config::Config;
use super::groups::GroupRegistry;
use super::runner::Context;
use super::{discovery, reaper, scheduler};
use crate::alarms::{Alarm, AlarmId, AlarmRegistry, GroupId, bounded_message};
use crate::error::{AlarmError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

enum Lifecycle {
    Idle { subscribers: Vec<Arc<dyn Subscribe>> },
    Running { tasks: JoinSet<()>, listener: JoinHandle<()> },
    Stopped,
}

/// Concurrent alarm scheduler with per-group display workers.
pub struct AlarmService {
    cfg: Config,
    ctx: Context,
    alive: Arc<AliveTracker>,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
}

impl AlarmService {
    /// Returns a builder; see [`AlarmServiceBuilder`].
    pub fn builder(cfg: Config) -> AlarmServiceBuilder {
        AlarmServiceBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let ctx = Context {
            alarms: Arc::new(AlarmRegistry::new()),
            groups: Arc::new(GroupRegistry::new()),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            poll: cfg.poll_interval_clamped(),
        };
        Self {
            cfg,
            ctx,
            alive: Arc::new(AliveTracker::new()),
            runtime_token: CancellationToken::new(),
            listener_token: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle::Idle { subscribers }),
        }
    }

    /// Spawns the subscriber listener and the scheduler, discovery and reaper tasks.
    ///
    /// Client operations work before launch, but nothing fires or renders
    /// until the runtime is up.
    pub async fn launch(&self) -> Result<(), RuntimeError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let subscribers = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle { subscribers } => subscribers,
            other => {
                *lifecycle = other;
                return Err(RuntimeError::AlreadyLaunched);
            }
        };

        let listener = self.subscriber_listener(subscribers);
        let mut tasks = JoinSet::new();
        tasks.spawn(scheduler::run(self.ctx.clone(), self.runtime_token.child_token()));
        tasks.spawn(discovery::run(self.ctx.clone(), self.runtime_token.child_token()));
        tasks.spawn(reaper::run(self.ctx.clone(), self.runtime_token.child_token()));

        *lifecycle = Lifecycle::Running { tasks, listener };
        tracing::info!(poll = ?self.ctx.poll, "alarm service launched");
        Ok(())
    }

    /// Forwards bus events to the alive tracker and the subscriber set.
    ///
    /// Drains every buffered event before honoring the stop signal.
    fn subscriber_listener(&self, subscribers: Vec<Arc<dyn Subscribe>>) -> JoinHandle<()> {
        let mut rx = self.ctx.bus.subscribe();
        let set = SubscriberSet::new(subscribers, self.ctx.bus.clone());
        let alive = Arc::clone(&self.alive);
        let stop = self.listener_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => {
                            alive.update(&ev).await;
                            set.emit(&ev);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Stops every task and display worker, waiting up to `grace`.
    ///
    /// Idempotent; a service that was never launched shuts down immediately.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let (mut tasks, listener) = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running { tasks, listener } => (tasks, listener),
            Lifecycle::Idle { .. } | Lifecycle::Stopped => return Ok(()),
        };

        self.ctx.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let grace = self.cfg.grace;
        let done = async {
            while tasks.join_next().await.is_some() {}
            let retired = self.ctx.groups.take_all().await;
            reaper::join_retired(&self.ctx.bus, retired).await;
        };
        let res = match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.ctx.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.alive.snapshot().await;
                tracing::error!(?grace, ?stuck, "shutdown grace exceeded");
                self.ctx.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(format!("stuck: {stuck:?}")),
                );
                tasks.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        self.listener_token.cancel();
        if let Err(err) = listener.await {
            tracing::warn!(error = %err, "subscriber listener did not exit cleanly");
        }
        res
    }

    /// Receives every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.ctx.bus.subscribe()
    }

    /// Groups that currently have a display worker, in ascending order.
    pub async fn groups(&self) -> Vec<GroupId> {
        self.ctx.groups.list().await
    }

    /// Inserts a new alarm.
    ///
    /// The message is truncated to `message_limit` bytes.
    pub async fn start(
        &self,
        id: AlarmId,
        group: GroupId,
        seconds: u32,
        message: &str,
    ) -> Result<(), AlarmError> {
        let message = bounded_message(message, self.cfg.message_limit_clamped());
        let ev = {
            let mut alarms = self.ctx.alarms.lock().await;
            if alarms.find(id).is_some() {
                return Err(AlarmError::AlreadyExists(id));
            }
            let alarm = Alarm::new(id, group, seconds, message, Instant::now());
            let ev = Event::new(EventKind::AlarmStarted).with_alarm_fields(&alarm);
            alarms.insert(alarm);
            ev
        };
        self.ctx.bus.publish(ev);
        Ok(())
    }

    /// Replaces group, duration and message of a pending alarm; expiry restarts now.
    pub async fn change(
        &self,
        id: AlarmId,
        group: GroupId,
        seconds: u32,
        message: &str,
    ) -> Result<(), AlarmError> {
        let message = bounded_message(message, self.cfg.message_limit_clamped());
        let updated = self
            .ctx
            .alarms
            .lock()
            .await
            .mutate(id, |a| a.reset(group, seconds, message, Instant::now()))
            .ok_or(AlarmError::NotFound(id))?;

        self.ctx
            .bus
            .publish(Event::new(EventKind::AlarmChanged).with_alarm_fields(&updated));
        Ok(())
    }

    /// Removes a pending alarm.
    pub async fn cancel(&self, id: AlarmId) -> Result<(), AlarmError> {
        let removed = self
            .ctx
            .alarms
            .lock()
            .await
            .remove(id)
            .ok_or(AlarmError::NotFound(id))?;

        self.ctx
            .bus
            .publish(Event::new(EventKind::AlarmCancelled).with_alarm_fields(&removed));
        Ok(())
    }

    /// Stops displaying an alarm; its expiry is unchanged.
    pub async fn suspend(&self, id: AlarmId) -> Result<(), AlarmError> {
        self.set_active(id, false).await
    }

    /// Resumes displaying a suspended alarm; its expiry is unchanged.
    pub async fn reactivate(&self, id: AlarmId) -> Result<(), AlarmError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: AlarmId, active: bool) -> Result<(), AlarmError> {
        let updated = {
            let mut alarms = self.ctx.alarms.lock().await;
            match alarms.find(id) {
                None => return Err(AlarmError::NotFound(id)),
                Some(a) if a.active && active => return Err(AlarmError::AlreadyActive(id)),
                Some(a) if !a.active && !active => return Err(AlarmError::AlreadySuspended(id)),
                Some(_) => {}
            }
            alarms
                .mutate(id, |a| a.active = active)
                .ok_or(AlarmError::NotFound(id))?
        };

        let kind = if active {
            EventKind::AlarmReactivated
        } else {
            EventKind::AlarmSuspended
        };
        self.ctx
            .bus
            .publish(Event::new(kind).with_alarm_fields(&updated));
        Ok(())
    }

    /// Copies of every pending alarm, in expiry order.
    pub async fn snapshot_all(&self) -> Vec<Alarm> {
        self.ctx.alarms.lock().await.iter().cloned().collect()
    }
}

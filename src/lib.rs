//! # alarmvisor
//!
//! **Alarmvisor** is a concurrent alarm scheduler with per-group live display
//! workers.
//!
//! Clients submit timed alarms tagged with a group id. The runtime fires each
//! alarm at its expiry, always waking for the earliest pending one even when
//! it arrives after others, and keeps one display worker per live group that
//! renders the group's active alarms until the group empties.
//!
//! ## Architecture
//! ```text
//!   start / change / cancel / suspend / reactivate
//!                       │
//!                       ▼
//!        ┌──────────────────────────────┐   rearm (Notify)   ┌─────────────┐
//!        │ AlarmRegistry                │ ─────────────────► │  Scheduler  │──► AlarmFired
//!        │ Vec<Alarm> sorted by expiry  │ ◄── pop_due ────── │ sleep_until │
//!        └──────────────┬───────────────┘                    └─────────────┘
//!                       │ copies (under Gate read/write)
//!                       ▼
//!   ┌───────────┐   ┌──────────────────────────────────────┐   ┌────────────┐
//!   │ Discovery │──►│ GroupRegistry (behind Gate)          │◄──│   Reaper   │
//!   │ spawn +   │   │ group → { worker handle, snapshot }  │   │ retire     │
//!   │ feed      │   └──────────────────┬───────────────────┘   │ empty      │
//!   └───────────┘                      ▼                       └────────────┘
//!                       DisplayWorker per group (reconcile + render)
//!
//!   every component ── publish(Event) ──► Bus ──► listener ──► AliveTracker
//!                                                          └──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ### Lock order
//! `Gate` (group table), then the alarm registry mutex, then a group's
//! snapshot mutex. Cancellation is never observed while a lock is held.
//!
//! ## Features
//! | Area               | Description                                             | Key types                              |
//! |--------------------|---------------------------------------------------------|----------------------------------------|
//! | **Service**        | Client operations, launch and graceful shutdown         | [`AlarmService`], [`Config`]           |
//! | **Alarms**         | Alarm entity and the ordered registry                   | [`Alarm`], [`AlarmRegistry`]           |
//! | **Groups**         | Reader/writer gate and group records                    | [`Gate`], [`GroupRegistry`]            |
//! | **Events**         | Everything the runtime does, as a broadcast stream      | [`Event`], [`EventKind`]               |
//! | **Subscribers**    | Consume events with panic isolation and bounded queues  | [`Subscribe`], [`LogWriter`]           |
//! | **Front end**      | Line protocol and console                               | [`Command`], [`Console`]               |
//! | **Errors**         | Typed client and runtime errors                         | [`AlarmError`], [`RuntimeError`]       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use alarmvisor::{AlarmId, AlarmService, Config, EventKind, GroupId, LogWriter, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let svc = AlarmService::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let mut events = svc.subscribe();
//!     svc.launch().await?;
//!     svc.start(AlarmId(1), GroupId(1), 0, "now").await?;
//!
//!     loop {
//!         let ev = events.recv().await?;
//!         if ev.kind == EventKind::AlarmFired {
//!             assert_eq!(ev.alarm, Some(AlarmId(1)));
//!             break;
//!         }
//!     }
//!     svc.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod alarms;
mod command;
mod console;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use alarms::{Alarm, AlarmId, AlarmQueue, AlarmRegistry, AlarmsGuard, GroupId, bounded_message};
pub use command::{Command, ParseError};
pub use console::{Console, execute};
pub use crate::core::{
    AlarmService, AlarmServiceBuilder, Config, Gate, GroupRegistry, ReadAccess, WriteAccess,
    wait_for_shutdown_signal,
};
pub use error::{AlarmError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

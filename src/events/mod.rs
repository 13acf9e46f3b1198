//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the scheduler, the display workers,
//! discovery, the reaper and the client operations of the service.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler`, `Discovery`, `DisplayWorker`, `Reaper`,
//!   `AlarmService` client operations and shutdown path.
//! - **Consumers**: the service's subscriber listener (fans out to
//!   `SubscriberSet` and updates `AliveTracker`), plus any receiver obtained
//!   through `AlarmService::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

//! Runtime core: scheduling, group workers and lifecycle.
//!
//! The only public API from this module is [`AlarmService`] (with its
//! builder and [`Config`]), plus the [`GroupRegistry`] and [`Gate`] types it
//! is built from.
//!
//! Internal modules:
//! - [`gate`]: reader/writer gate over the group table;
//! - [`groups`]: group records, snapshots and retirement;
//! - [`scheduler`]: earliest-deadline wakeup and firing;
//! - [`discovery`]: spawns display workers and feeds snapshots;
//! - [`display`]: per-group reconcile-and-render loop;
//! - [`reaper`]: retires emptied groups;
//! - [`runner`]: shared loop context and task lifecycle events;
//! - [`alive`]: task liveness for shutdown diagnostics;
//! - [`service`]: client operations, launch and graceful shutdown;
//! - [`shutdown`]: OS termination signals.

mod alive;
mod builder;
mod config;
mod discovery;
mod display;
mod gate;
mod groups;
mod reaper;
mod runner;
mod scheduler;
mod service;
mod shutdown;

pub use builder::AlarmServiceBuilder;
pub use config::Config;
pub use gate::{Gate, ReadAccess, WriteAccess};
pub use groups::GroupRegistry;
pub use service::AlarmService;
pub use shutdown::wait_for_shutdown_signal;

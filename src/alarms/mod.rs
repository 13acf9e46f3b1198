//! # Alarms and the shared alarm registry.
//!
//! - [`Alarm`], [`AlarmId`], [`GroupId`]: the alarm entity and its identifiers
//! - [`AlarmRegistry`]: expiry-ordered pending alarms behind one exclusive lock
//! - [`AlarmsGuard`]: the only way to mutate the registry; rearms the scheduler

mod alarm;
mod registry;

pub use alarm::{Alarm, AlarmId, GroupId, bounded_message};
pub use registry::{AlarmQueue, AlarmRegistry, AlarmsGuard};

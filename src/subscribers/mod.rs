//! # Event subscribers for the alarmvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Scheduler / workers ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                      │
//!                                      ┌───────────────┴──────────────┐
//!                                      ▼                              ▼
//!                                AliveTracker                   SubscriberSet
//!                           (task liveness by seq)        ┌─────────┼─────────┐
//!                                                         ▼         ▼         ▼
//!                                                     LogWriter  Custom ...  ...
//! ```

mod embedded;
mod set;
mod subscriber;

pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

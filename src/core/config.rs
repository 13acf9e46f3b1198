//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the alarm service.
//!
//! ## Sentinel values
//! - `poll_interval = 0s` → clamped to 1ms (polling loops never spin)
//! - `bus_capacity = 0` → clamped to 1
//! - `message_limit = 0` → clamped to 1 byte

use std::time::Duration;

/// Global configuration for the alarm service.
///
/// ## Field semantics
/// - `poll_interval`: period of the Discovery, Display Worker and Reaper loops
/// - `grace`: maximum wait for tasks to stop on shutdown
/// - `bus_capacity`: event bus ring buffer size
/// - `message_limit`: maximum alarm message length in bytes
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Period of every polling loop.
    ///
    /// A new alarm becomes visible to its group's worker within one interval;
    /// an emptied group is retired within two.
    pub poll_interval: Duration,

    /// Maximum time to wait for graceful shutdown.
    ///
    /// If exceeded, shutdown returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,

    /// Maximum message length in bytes; longer messages are truncated on a char boundary.
    pub message_limit: usize,
}

impl Config {
    /// Returns the poll interval clamped to at least 1ms.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the message limit clamped to a minimum of 1.
    #[inline]
    pub fn message_limit_clamped(&self) -> usize {
        self.message_limit.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 1s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `message_limit = 64`
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            message_limit: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_are_clamped() {
        let cfg = Config {
            poll_interval: Duration::ZERO,
            grace: Duration::ZERO,
            bus_capacity: 0,
            message_limit: 0,
        };
        assert_eq!(cfg.poll_interval_clamped(), Duration::from_millis(1));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.message_limit_clamped(), 1);
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.poll_interval_clamped(), Duration::from_secs(1));
        assert_eq!(cfg.message_limit_clamped(), 64);
    }
}

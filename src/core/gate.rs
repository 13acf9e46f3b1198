//! # Reader/writer gate over the group registry.
//!
//! Grants either any number of concurrent readers or exactly one writer,
//! never both. Acquisition returns an RAII guard; dropping it releases.
//!
//! ```text
//! Discovery ──┐
//! Worker 1  ──┼── acquire_read()  ─┐
//! Worker N  ──┘                    ├──► tokio::sync::RwLock<T>
//! Reaper  ─────── acquire_write() ─┘    (queued writer blocks new readers)
//! ```
//!
//! ## Rules
//! - The gate protects structural membership only; per-group content has its
//!   own lock taken after the gate and the alarm registry.
//! - A queued writer is served before readers that arrive after it, so the
//!   reaper cannot be starved by a steady stream of display passes.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader/writer gate around `T`.
#[derive(Debug, Default)]
pub struct Gate<T> {
    lock: RwLock<T>,
    readers: AtomicUsize,
}

/// Shared access; released on drop.
pub struct ReadAccess<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    readers: &'a AtomicUsize,
}

/// Exclusive access; released on drop.
pub type WriteAccess<'a, T> = RwLockWriteGuard<'a, T>;

impl<T> Gate<T> {
    pub fn new(value: T) -> Self {
        Self {
            lock: RwLock::new(value),
            readers: AtomicUsize::new(0),
        }
    }

    /// Waits for shared access.
    pub async fn acquire_read(&self) -> ReadAccess<'_, T> {
        let guard = self.lock.read().await;
        self.readers.fetch_add(1, Ordering::AcqRel);
        ReadAccess {
            guard,
            readers: &self.readers,
        }
    }

    /// Waits for exclusive access.
    pub async fn acquire_write(&self) -> WriteAccess<'_, T> {
        self.lock.write().await
    }

    /// Exclusive access if no reader or writer holds the gate right now.
    pub fn try_acquire_write(&self) -> Option<WriteAccess<'_, T>> {
        self.lock.try_write().ok()
    }

    /// Number of readers currently inside.
    pub fn readers(&self) -> usize {
        self.readers.load(Ordering::Acquire)
    }
}

impl<T> Deref for ReadAccess<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadAccess<'_, T> {
    fn drop(&mut self) {
        self.readers.fetch_sub(1, Ordering::AcqRel);
    }
}

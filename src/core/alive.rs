//! # Task liveness tracker with sequence-based ordering.
//!
//! Records which background tasks ("scheduler", "discovery", "reaper",
//! "display-group-N") are currently running, using event sequence numbers to
//! ignore out-of-order delivery.
//!
//! ```text
//! tasks ──► Bus ──► subscriber_listener() ──► AliveTracker::update()
//!                                                   │
//!                                                   ▼
//!                                      HashMap<task name, {seq, alive}>
//! ```
//!
//! ## Rules
//! - `TaskStarting` marks a task alive; `TaskStopped` and `WorkerDead` mark it dead
//! - Events with `seq <= last_seq` for the same task are stale and ignored
//! - Reads are eventually consistent with the bus

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone, Copy)]
struct TaskState {
    last_seq: u64,
    alive: bool,
}

/// Tracker of alive task names; used to name stuck tasks on shutdown.
#[derive(Debug, Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, TaskState>>,
}

impl AliveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a task event if it is newer than the last one seen for that task.
    ///
    /// Returns true if the alive flag was (re)written.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(name) = ev.task.as_deref() else {
            return false;
        };
        let alive = match ev.kind {
            EventKind::TaskStarting => true,
            EventKind::TaskStopped | EventKind::WorkerDead => false,
            _ => return false,
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(TaskState {
            last_seq: 0,
            alive: false,
        });
        if entry.last_seq != 0 && ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.alive = alive;
        true
    }

    /// Sorted names of tasks currently alive.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ts)| ts.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    pub async fn is_alive(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .is_some_and(|ts| ts.alive)
    }
}

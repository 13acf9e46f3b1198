//! # LogWriter: the text display surface.
//!
//! A subscriber that prints alarm and display events to stdout in the
//! line-oriented style of classic alarm programs. Runtime diagnostics
//! (overflow, panics, shutdown) go to `tracing` instead.
//!
//! ## Example output
//! ```text
//! Alarm(1) Group(2) fired: (5) tea is ready
//! Display thread for Group(2) created
//! Group(2) Alarm(1): tea is ready
//! Display thread for Group(2) starts to display changed message Alarm(1): tea
//! Display thread for Group(2) stopped displaying Alarm(1)
//! Display thread for Group(2) retired
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Prints events as user-facing text lines.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders one event, or `None` for events this writer does not print.
    pub fn render(e: &Event) -> Option<String> {
        let alarm = e.alarm.map(|a| a.0).unwrap_or_default();
        let group = e.group.map(|g| g.0).unwrap_or_default();
        let message = e.message.as_deref().unwrap_or("");

        let line = match e.kind {
            EventKind::AlarmFired => format!(
                "Alarm({alarm}) Group({group}) fired: ({}) {message}",
                e.seconds.unwrap_or_default()
            ),
            EventKind::GroupCreated => format!("Display thread for Group({group}) created"),
            EventKind::DisplayRendered => format!("Group({group}) Alarm({alarm}): {message}"),
            EventKind::DisplayChanged => format!(
                "Display thread for Group({group}) starts to display changed message Alarm({alarm}): {message}"
            ),
            EventKind::DisplayStopped => {
                format!("Display thread for Group({group}) stopped displaying Alarm({alarm})")
            }
            EventKind::GroupRetired => format!("Display thread for Group({group}) retired"),
            EventKind::WorkerDead => format!(
                "Display thread for Group({group}) died: {}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
            _ => return None,
        };
        Some(line)
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ShutdownRequested => tracing::info!("shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!("all tasks stopped within grace"),
            EventKind::GraceExceeded => tracing::warn!("grace exceeded"),
            EventKind::SubscriberPanicked => tracing::warn!(
                subscriber = e.task.as_deref().unwrap_or("unknown"),
                info = e.reason.as_deref().unwrap_or("unknown"),
                "subscriber panicked"
            ),
            _ => {
                if let Some(line) = Self::render(e) {
                    println!("{line}");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::{AlarmId, GroupId};

    #[test]
    fn test_render_fired() {
        let ev = Event::new(EventKind::AlarmFired)
            .with_alarm(AlarmId(1))
            .with_group(GroupId(2))
            .with_seconds(5)
            .with_message("tea is ready");
        assert_eq!(
            LogWriter::render(&ev).as_deref(),
            Some("Alarm(1) Group(2) fired: (5) tea is ready")
        );
    }

    #[test]
    fn test_render_stopped_displaying() {
        let ev = Event::new(EventKind::DisplayStopped)
            .with_alarm(AlarmId(4))
            .with_group(GroupId(9));
        assert_eq!(
            LogWriter::render(&ev).as_deref(),
            Some("Display thread for Group(9) stopped displaying Alarm(4)")
        );
    }

    #[test]
    fn test_render_skips_task_events() {
        let ev = Event::new(EventKind::TaskStarting).with_task("scheduler");
        assert!(LogWriter::render(&ev).is_none());
    }
}

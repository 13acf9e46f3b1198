//! # Line-oriented console front end.
//!
//! Reads commands from any [`AsyncBufRead`], applies them to an
//! [`AlarmService`] and writes one reply per command to any [`AsyncWrite`].
//! Display output (fired alarms, renders) does not go through the console;
//! it is produced by subscribers such as [`LogWriter`](crate::LogWriter).
//!
//! Blank lines are ignored; end of input ends the session.

use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::command::{Command, ParseError};
use crate::core::AlarmService;

const PROMPT: &str = "Alarm> ";

/// Console session over an input and an output stream.
pub struct Console<R, W> {
    service: Arc<AlarmService>,
    input: R,
    output: W,
    prompt: bool,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: Arc<AlarmService>, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
            prompt: false,
        }
    }

    /// Writes `Alarm> ` before reading each line.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Runs until end of input; returns the output stream.
    pub async fn run(self) -> io::Result<W> {
        let Console {
            service,
            input,
            mut output,
            prompt,
        } = self;
        let mut lines = input.lines();

        loop {
            if prompt {
                output.write_all(PROMPT.as_bytes()).await?;
                output.flush().await?;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if let Some(reply) = execute(&service, &line).await {
                output.write_all(reply.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }
        Ok(output)
    }
}

/// Applies one command line; `None` for blank lines.
pub async fn execute(service: &AlarmService, line: &str) -> Option<String> {
    let cmd = match line.parse::<Command>() {
        Ok(cmd) => cmd,
        Err(ParseError::Empty) => return None,
        Err(err) => {
            tracing::debug!(label = err.as_label(), %line, "rejected command");
            return Some(err.to_string());
        }
    };

    let reply = match cmd {
        Command::Start {
            id,
            group,
            seconds,
            message,
        } => service
            .start(id, group, seconds, &message)
            .await
            .map(|()| format!("Alarm({id}) Inserted into alarm list")),
        Command::Change {
            id,
            group,
            seconds,
            message,
        } => service
            .change(id, group, seconds, &message)
            .await
            .map(|()| format!("Alarm({id}) updated successfully")),
        Command::Cancel(id) => service
            .cancel(id)
            .await
            .map(|()| format!("Alarm({id}) cancelled")),
        Command::Suspend(id) => service
            .suspend(id)
            .await
            .map(|()| format!("Alarm({id}) suspended")),
        Command::Reactivate(id) => service
            .reactivate(id)
            .await
            .map(|()| format!("Alarm({id}) reactivated")),
        Command::View => Ok(view(service).await),
    };
    Some(reply.unwrap_or_else(|err| err.to_string()))
}

async fn view(service: &AlarmService) -> String {
    let alarms = service.snapshot_all().await;
    if alarms.is_empty() {
        return "No alarms pending".to_string();
    }

    let now = Instant::now();
    let mut out = format!("{} alarm(s) pending:", alarms.len());
    for a in &alarms {
        let state = if a.active { "active" } else { "suspended" };
        let _ = write!(
            out,
            "\nAlarm({}): Group({}) {}s, {}s left, {} {}",
            a.id,
            a.group,
            a.seconds,
            a.remaining(now).as_secs(),
            state,
            a.message
        );
    }
    out
}

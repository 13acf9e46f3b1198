//! # Line protocol.
//!
//! One command per line:
//!
//! ```text
//! Start_Alarm(<id>): Group(<gid>) <seconds> <message>
//! Change_Alarm(<id>): Group(<gid>) <seconds> <message>
//! Cancel_Alarm(<id>)
//! Suspend_Alarm(<id>)
//! Reactivate_Alarm(<id>)
//! View_Alarms
//! ```
//!
//! Ids, group ids and seconds are unsigned integers; the message is the rest
//! of the line, trimmed, and must not be empty.
//!
//! ## Example
//! ```rust
//! use alarmvisor::{AlarmId, Command, GroupId};
//!
//! let cmd: Command = "Start_Alarm(3): Group(1) 10 tea is ready".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Start { id: AlarmId(3), group: GroupId(1), seconds: 10, message: "tea is ready".into() }
//! );
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::alarms::{AlarmId, GroupId};

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        id: AlarmId,
        group: GroupId,
        seconds: u32,
        message: String,
    },
    Change {
        id: AlarmId,
        group: GroupId,
        seconds: u32,
        message: String,
    },
    Cancel(AlarmId),
    Suspend(AlarmId),
    Reactivate(AlarmId),
    View,
}

/// Rejected command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// Known command name, malformed arguments.
    #[error("Bad {0} command format")]
    BadFormat(&'static str),

    /// Unrecognized command name.
    #[error("Unknown command: {0}")]
    Unknown(String),
}

impl ParseError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ParseError::Empty => "command_empty",
            ParseError::BadFormat(_) => "command_bad_format",
            ParseError::Unknown(_) => "command_unknown",
        }
    }
}

const START: &str = "Start_Alarm";
const CHANGE: &str = "Change_Alarm";
const CANCEL: &str = "Cancel_Alarm";
const SUSPEND: &str = "Suspend_Alarm";
const REACTIVATE: &str = "Reactivate_Alarm";
const VIEW: &str = "View_Alarms";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let split = line
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(line.len());
        let (name, rest) = line.split_at(split);

        match name {
            START => {
                let (id, group, seconds, message) =
                    timed_args(rest).ok_or(ParseError::BadFormat(START))?;
                Ok(Command::Start { id, group, seconds, message })
            }
            CHANGE => {
                let (id, group, seconds, message) =
                    timed_args(rest).ok_or(ParseError::BadFormat(CHANGE))?;
                Ok(Command::Change { id, group, seconds, message })
            }
            CANCEL => id_only(rest).map(Command::Cancel).ok_or(ParseError::BadFormat(CANCEL)),
            SUSPEND => id_only(rest).map(Command::Suspend).ok_or(ParseError::BadFormat(SUSPEND)),
            REACTIVATE => id_only(rest)
                .map(Command::Reactivate)
                .ok_or(ParseError::BadFormat(REACTIVATE)),
            VIEW if rest.trim().is_empty() => Ok(Command::View),
            VIEW => Err(ParseError::BadFormat(VIEW)),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// `(<n>)` followed by the unparsed tail.
fn parenthesized(rest: &str) -> Option<(u32, &str)> {
    let (digits, tail) = rest.strip_prefix('(')?.split_once(')')?;
    Some((digits.trim().parse().ok()?, tail))
}

fn id_only(rest: &str) -> Option<AlarmId> {
    let (id, tail) = parenthesized(rest)?;
    tail.trim().is_empty().then_some(AlarmId(id))
}

fn timed_args(rest: &str) -> Option<(AlarmId, GroupId, u32, String)> {
    let (id, tail) = parenthesized(rest)?;
    let tail = tail.strip_prefix(':')?.trim_start();
    let (group, tail) = parenthesized(tail.strip_prefix("Group")?)?;
    let (seconds, message) = tail.trim_start().split_once(char::is_whitespace)?;
    let seconds = seconds.parse().ok()?;
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some((AlarmId(id), GroupId(group), seconds, message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        line.parse()
    }

    #[test]
    fn test_start_and_change() {
        assert_eq!(
            parse("Start_Alarm(12): Group(3) 45 call  mom  ").unwrap(),
            Command::Start {
                id: AlarmId(12),
                group: GroupId(3),
                seconds: 45,
                message: "call  mom".into(),
            }
        );
        assert_eq!(
            parse("  Change_Alarm(1): Group(2) 5 x").unwrap(),
            Command::Change {
                id: AlarmId(1),
                group: GroupId(2),
                seconds: 5,
                message: "x".into(),
            }
        );
    }

    #[test]
    fn test_id_commands() {
        assert_eq!(parse("Cancel_Alarm(4)").unwrap(), Command::Cancel(AlarmId(4)));
        assert_eq!(parse("Suspend_Alarm( 5 )").unwrap(), Command::Suspend(AlarmId(5)));
        assert_eq!(parse("Reactivate_Alarm(6)").unwrap(), Command::Reactivate(AlarmId(6)));
        assert_eq!(parse("View_Alarms").unwrap(), Command::View);
    }

    #[test]
    fn test_malformed_arguments() {
        for (line, name) in [
            ("Start_Alarm(1): Group(1) 10", START),
            ("Start_Alarm(1): Group(1) ten minutes", START),
            ("Start_Alarm(-1): Group(1) 10 m", START),
            ("Start_Alarm(1) Group(1) 10 m", START),
            ("Change_Alarm(1): Grp(1) 10 m", CHANGE),
            ("Cancel_Alarm", CANCEL),
            ("Cancel_Alarm(1) now", CANCEL),
            ("Suspend_Alarm(x)", SUSPEND),
            ("Reactivate_Alarm()", REACTIVATE),
            ("View_Alarms please", VIEW),
        ] {
            assert_eq!(parse(line), Err(ParseError::BadFormat(name)), "{line}");
        }
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(
            parse("Snooze_Alarm(1)"),
            Err(ParseError::Unknown("Snooze_Alarm".into()))
        );
        assert_eq!(
            ParseError::BadFormat(START).to_string(),
            "Bad Start_Alarm command format"
        );
    }
}

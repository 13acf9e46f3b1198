//! # Built-in subscribers
//!
//! - [`LogWriter`]: prints alarm and display events as text lines.

mod log;

pub use log::LogWriter;

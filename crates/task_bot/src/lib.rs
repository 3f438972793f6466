//! task_bot - chat commands for managing Google Tasks lists
//!
//! - `command` - parsing of `/command args...` messages
//! - `dispatcher` - per-command validation, remote calls and reply formatting
//! - `messages` - reply templates
//! - `transport` - Telegram long-polling front end

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod transport;

pub use command::{Command, ParsedCommand};
pub use dispatcher::Dispatcher;
pub use error::CommandError;

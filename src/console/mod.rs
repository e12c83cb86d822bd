//! Launcher console
//!
//! Reads commands typed by the user, applies them to the server settings
//! and the launcher, and shows the server's output.

pub mod commands;
pub mod handlers;
pub mod responses;
pub mod session;
pub mod state;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::handle_command;
pub use session::Console;
pub use state::ConsoleState;

//! Terminal sessions
//!
//! The launcher drives a terminal that runs a shell, receives the server
//! script as typed input and displays whatever the server prints. Session
//! lifecycle is reported asynchronously as `SessionEvent`s.

pub mod shell;

pub use shell::ShellTerminal;

use crate::error::TerminalError;

/// Monotonically increasing id of one spawned shell
pub type SessionId = u64;

/// Shell used when neither the configuration nor `$SHELL` names one
const FALLBACK_SHELL: &str = "/bin/sh";

/// Lifecycle and output notifications from a terminal session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The shell is up and accepts input
    Ready { session: SessionId, pid: u32 },
    /// One line printed by the session
    Output { session: SessionId, line: String },
    /// The shell exited; `code` is `None` when its status could not be read
    Exited { session: SessionId, code: Option<i32> },
}

impl SessionEvent {
    pub fn session(&self) -> SessionId {
        match self {
            SessionEvent::Ready { session, .. }
            | SessionEvent::Output { session, .. }
            | SessionEvent::Exited { session, .. } => *session,
        }
    }
}

/// An interactive terminal surface that runs shell sessions.
///
/// Spawning returns immediately; `SessionEvent::Ready` follows once the
/// session accepts input. Nothing should be fed before that event.
pub trait Terminal {
    fn spawn_session(&mut self, argv: &[String]) -> Result<SessionId, TerminalError>;

    /// Types `text` into the current session. Fails while input is disabled.
    fn feed_input(&mut self, text: &str) -> Result<(), TerminalError>;

    /// Asks the current session to terminate, like pressing Ctrl-C.
    fn send_interrupt(&mut self) -> Result<(), TerminalError>;

    /// Detaches from the current session and returns to a blank state
    fn reset(&mut self);

    fn set_input_enabled(&mut self, enabled: bool);

    fn input_enabled(&self) -> bool;
}

/// Resolves the user's shell command line into an argument vector
pub fn user_shell(configured: Option<&str>) -> Result<Vec<String>, TerminalError> {
    let line = match configured {
        Some(shell) => shell.to_string(),
        None => std::env::var("SHELL").unwrap_or_else(|_| FALLBACK_SHELL.to_string()),
    };

    match shlex::split(&line) {
        Some(argv) if !argv.is_empty() => Ok(argv),
        _ => Err(TerminalError::NoShell),
    }
}

//! Server launcher
//!
//! Turns server settings into the shell command that runs PHP's built-in
//! web server and tracks whether that server is running.

pub mod command;
pub mod elevation;
pub mod guard;
pub mod state;
pub mod url;

pub use command::{ServerConfig, build_command, build_server_invocation};
pub use elevation::{ElevationCandidate, ElevationTemplate, determine_elevation_template};
pub use guard::{CloseDecision, on_close_request};
pub use state::{
    ServerLauncher, ServerProcessState, ToggleAction, ToggleRequest, Transition, next_transition,
};
pub use url::build_browser_url;

//! Close guard
//!
//! Closing the launcher while the server runs needs confirmation.

use crate::launcher::ServerProcessState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Nothing is running; close right away
    Close,
    /// Suppress the close and ask the user first
    Confirm,
}

pub fn on_close_request(state: ServerProcessState) -> CloseDecision {
    if state.is_running() {
        CloseDecision::Confirm
    } else {
        CloseDecision::Close
    }
}

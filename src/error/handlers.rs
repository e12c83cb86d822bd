//! Error handlers
//!
//! Logs errors and turns them into console responses.

use crate::console::responses::{ResponseKind, format_response};
use crate::error::types::LauncherError;
use log::{error, warn};

/// Handle a launcher error
pub fn handle_error(err: &LauncherError) {
    error!("Launcher error: {}", err);
}

/// Convert error to the console response shown to the user
///
/// Rejected settings are the user's to fix and are only logged as warnings.
pub fn error_to_response(err: &LauncherError) -> String {
    match err {
        LauncherError::Settings(e) => {
            warn!("Rejected setting: {}", e);
            format_response(ResponseKind::Rejected, &e.to_string())
        }
        _ => {
            handle_error(err);
            format_response(ResponseKind::Error, &err.to_string())
        }
    }
}

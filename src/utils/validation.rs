//! Input validation utilities
//!
//! Provides input validation and parsing for console-edited settings.

use crate::error::SettingsError;

/// Validate that input is not empty and doesn't contain control characters
pub fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty() && !input.chars().any(char::is_control)
}

/// Parse port text into a TCP port number
///
/// Non-numeric and out-of-range text is rejected instead of being coerced to 0.
pub fn parse_port(text: &str) -> Result<u16, SettingsError> {
    text.trim()
        .parse::<u16>()
        .map_err(|_| SettingsError::InvalidPort(text.to_string()))
}

//! Error types
//!
//! Defines domain-specific error types for each part of the launcher.

use std::fmt;
use std::io;

/// Errors raised while editing or validating server settings
#[derive(Debug, PartialEq)]
pub enum SettingsError {
    InvalidPort(String),
    EmptyValue(&'static str),
    FileNotFound(String),
    DirectoryNotFound(String),
    UnknownField(String),
    InvalidTemplate(String),
    MalformedInput(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidPort(p) => {
                write!(f, "Invalid port '{}': expected a number between 0 and 65535", p)
            }
            SettingsError::EmptyValue(field) => write!(f, "{} cannot be empty", field),
            SettingsError::FileNotFound(p) => write!(f, "File not found: {}", p),
            SettingsError::DirectoryNotFound(p) => write!(f, "Directory not found: {}", p),
            SettingsError::UnknownField(name) => write!(f, "Unknown setting: {}", name),
            SettingsError::InvalidTemplate(t) => {
                write!(f, "Invalid elevation template '{}': must contain one %s", t)
            }
            SettingsError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Terminal collaborator errors
#[derive(Debug)]
pub enum TerminalError {
    NoShell,
    PtyUnavailable(String),
    SpawnFailed(String, String),
    NoSession,
    InputDisabled,
    SessionClosed,
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::NoShell => write!(f, "No shell configured"),
            TerminalError::PtyUnavailable(e) => write!(f, "Failed to open a pseudo-terminal: {}", e),
            TerminalError::SpawnFailed(shell, e) => write!(f, "Failed to spawn {}: {}", shell, e),
            TerminalError::NoSession => write!(f, "No terminal session running"),
            TerminalError::InputDisabled => write!(f, "Terminal input is disabled"),
            TerminalError::SessionClosed => write!(f, "Terminal session input is closed"),
        }
    }
}

impl std::error::Error for TerminalError {}

/// General launcher error that encompasses all error types
#[derive(Debug)]
pub enum LauncherError {
    Settings(SettingsError),
    Terminal(TerminalError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for LauncherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherError::Settings(e) => write!(f, "Settings error: {}", e),
            LauncherError::Terminal(e) => write!(f, "Terminal error: {}", e),
            LauncherError::Config(e) => write!(f, "Configuration error: {}", e),
            LauncherError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for LauncherError {}

impl From<SettingsError> for LauncherError {
    fn from(error: SettingsError) -> Self {
        LauncherError::Settings(error)
    }
}

impl From<TerminalError> for LauncherError {
    fn from(error: TerminalError) -> Self {
        LauncherError::Terminal(error)
    }
}

impl From<config::ConfigError> for LauncherError {
    fn from(error: config::ConfigError) -> Self {
        LauncherError::Config(error)
    }
}

impl From<io::Error> for LauncherError {
    fn from(error: io::Error) -> Self {
        LauncherError::IoError(error)
    }
}

impl From<SettingsError> for config::ConfigError {
    fn from(error: SettingsError) -> Self {
        config::ConfigError::Message(error.to_string())
    }
}

//! Error handling
//!
//! Defines error types and handling for the launcher.

pub mod handlers;
pub mod types;

pub use types::*;

//! Utility functions
//!
//! Provides logging and validation utilities.

pub mod logging;
pub mod validation;

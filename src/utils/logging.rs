//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Setup logging for the launcher
///
/// Honours `RUST_LOG`, defaulting to `info`. Logs go to stderr so they do not
/// interleave with console responses on stdout.
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}

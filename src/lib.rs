pub mod browser;
pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod terminal;
pub mod utils;

pub use launcher::ServerLauncher;

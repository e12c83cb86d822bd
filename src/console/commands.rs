//! Module `commands`
//!
//! Defines console command parsing and the data structures used to
//! represent commands and their results.

/// A command typed at the launcher console.
///
/// Commands that require arguments store them as `String` variants.
#[derive(Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Open,
    Status,
    Set(String, String), // Setting name and value
    ClearIni,
    Config, // Show or hide the settings panel
    Help,
    Quit,
    Yes,
    No,
    Unknown(String),
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    Close,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Parses a raw console line into the `Command` enum.
///
/// Returns `Unknown` if a known command is misused.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "START" | "ON" => Command::Start,
        "STOP" | "OFF" => Command::Stop,
        "OPEN" | "BROWSE" => Command::Open,
        "STATUS" => Command::Status,
        "SET" => match arg.split_once(char::is_whitespace) {
            Some((field, value)) if !value.trim().is_empty() => {
                Command::Set(field.to_string(), value.trim().to_string())
            }
            _ => Command::Unknown(trimmed.to_string()),
        },
        "CLEARINI" => Command::ClearIni,
        "CONFIG" => Command::Config,
        "HELP" | "?" => Command::Help,
        "QUIT" | "Q" | "EXIT" => Command::Quit,
        "YES" | "Y" => Command::Yes,
        "NO" | "N" => Command::No,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

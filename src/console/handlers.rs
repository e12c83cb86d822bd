//! Command handlers for the launcher console.
//!
//! Each handler plays the part of one window control: the server switch,
//! the browser button, the settings form and the close button.

use log::{info, warn};

use crate::browser::UriOpener;
use crate::config::SettingField;
use crate::console::responses::{ResponseKind, format_response};
use crate::console::{Command, CommandResult, CommandStatus, ConsoleState};
use crate::error::LauncherError;
use crate::error::handlers::error_to_response;
use crate::launcher::{
    CloseDecision, ServerLauncher, ToggleAction, ToggleRequest, build_browser_url, on_close_request,
};
use crate::terminal::Terminal;

const HELP: &str = "\
Commands:
  START                 start the server
  STOP                  stop the server
  OPEN                  open the server in the default browser
  STATUS                show whether the server is running
  SET <field> <value>   change a setting (php, address, port, root, ini)
  CLEARINI              stop using a custom ini file
  CONFIG                show or hide the settings panel
  QUIT                  quit the launcher";

/// Dispatches a console command to its handler.
///
/// Anything other than an answer dismisses a pending close confirmation.
pub fn handle_command<T: Terminal, B: UriOpener>(
    state: &mut ConsoleState,
    launcher: &mut ServerLauncher<T>,
    browser: &B,
    command: &Command,
) -> CommandResult {
    if state.is_close_pending() && !matches!(command, Command::Yes | Command::No | Command::Quit) {
        state.set_close_pending(false);
    }

    match command {
        Command::Start => handle_cmd_start(state, launcher),
        Command::Stop => handle_cmd_stop(launcher),
        Command::Open => handle_cmd_open(launcher, browser),
        Command::Status => handle_cmd_status(launcher),
        Command::Set(field, value) => handle_cmd_set(state, launcher, field, value),
        Command::ClearIni => handle_cmd_clear_ini(state),
        Command::Config => handle_cmd_config(state),
        Command::Help => success(ResponseKind::Info, HELP),
        Command::Quit => handle_cmd_quit(state, launcher),
        Command::Yes => handle_cmd_answer(state, true),
        Command::No => handle_cmd_answer(state, false),
        Command::Unknown(raw) => handle_cmd_unknown(raw),
    }
}

/// Handles START: snapshots the settings and flips the server switch on.
fn handle_cmd_start<T: Terminal>(
    state: &ConsoleState,
    launcher: &mut ServerLauncher<T>,
) -> CommandResult {
    let config = match state.settings().server_config() {
        Ok(config) => config,
        Err(e) => return failure(e.into()),
    };

    let url = build_browser_url(&config);
    let unprivileged = config.needs_elevation() && launcher.elevation().is_identity();

    match launcher.on_server_toggle(ToggleRequest::On(config)) {
        Ok(ToggleAction::Spawned(_)) => {
            let mut message =
                format_response(ResponseKind::Ok, &format!("Starting server at {}", url));
            if unprivileged {
                warn!("No elevation tool available for {}", url);
                message.push_str(&format_response(
                    ResponseKind::Info,
                    "No elevation tool found; ports below 1024 may fail to bind",
                ));
            }
            CommandResult {
                status: CommandStatus::Success,
                message: Some(message),
            }
        }
        Ok(_) => rejected("Server is already running"),
        Err(e) => failure(e),
    }
}

/// Handles STOP: flips the server switch off.
fn handle_cmd_stop<T: Terminal>(launcher: &mut ServerLauncher<T>) -> CommandResult {
    match launcher.on_server_toggle(ToggleRequest::Off) {
        Ok(ToggleAction::Terminated(_)) => success(ResponseKind::Ok, "Server stopped"),
        Ok(_) => rejected("Server is not running"),
        Err(e) => failure(e),
    }
}

/// Handles OPEN: only available while the server runs.
fn handle_cmd_open<T: Terminal, B: UriOpener>(
    launcher: &ServerLauncher<T>,
    browser: &B,
) -> CommandResult {
    match launcher.browser_url() {
        Some(url) => {
            browser.open(&url);
            success(ResponseKind::Ok, &format!("Opened {}", url))
        }
        None => rejected("Server is not running"),
    }
}

fn handle_cmd_status<T: Terminal>(launcher: &ServerLauncher<T>) -> CommandResult {
    let message = match (launcher.browser_url(), launcher.current_session()) {
        (Some(url), Some(session)) => format!("Server running at {} (session {})", url, session),
        _ => "Server stopped".to_string(),
    };
    success(ResponseKind::Info, &message)
}

/// Handles SET: edits one setting. Takes effect on the next start.
fn handle_cmd_set<T: Terminal>(
    state: &mut ConsoleState,
    launcher: &ServerLauncher<T>,
    field: &str,
    value: &str,
) -> CommandResult {
    let field = match SettingField::parse(field) {
        Ok(field) => field,
        Err(e) => return failure(e.into()),
    };

    if let Err(e) = state.settings_mut().set(field, value) {
        return failure(e.into());
    }

    info!("{} set to {}", field.label(), value);
    let mut message = format!("{} set to {}", field.label(), value);
    if launcher.is_running() {
        message.push_str(" (restart the server to apply)");
    }
    success(ResponseKind::Ok, &message)
}

fn handle_cmd_clear_ini(state: &mut ConsoleState) -> CommandResult {
    state.settings_mut().clear_ini();
    success(ResponseKind::Ok, "INI file cleared")
}

fn handle_cmd_config(state: &mut ConsoleState) -> CommandResult {
    if state.toggle_panel() {
        success(ResponseKind::Ok, "Settings panel shown")
    } else {
        success(ResponseKind::Ok, "Settings panel hidden")
    }
}

/// Handles QUIT: closes right away unless the server is running.
fn handle_cmd_quit<T: Terminal>(
    state: &mut ConsoleState,
    launcher: &ServerLauncher<T>,
) -> CommandResult {
    match on_close_request(launcher.state()) {
        CloseDecision::Close => CommandResult {
            status: CommandStatus::Close,
            message: Some(format_response(ResponseKind::Ok, "Goodbye")),
        },
        CloseDecision::Confirm => {
            state.set_close_pending(true);
            success(
                ResponseKind::Confirm,
                "The server is still running. Stop it and quit? (yes/no)",
            )
        }
    }
}

/// Handles YES/NO answers to the close confirmation.
fn handle_cmd_answer(state: &mut ConsoleState, confirmed: bool) -> CommandResult {
    if !state.is_close_pending() {
        return rejected("Nothing to confirm");
    }
    state.set_close_pending(false);

    if confirmed {
        CommandResult {
            status: CommandStatus::Close,
            message: Some(format_response(ResponseKind::Ok, "Stopping server and quitting")),
        }
    } else {
        success(ResponseKind::Ok, "Quit cancelled")
    }
}

fn handle_cmd_unknown(raw: &str) -> CommandResult {
    if raw.is_empty() {
        return CommandResult {
            status: CommandStatus::Success,
            message: None,
        };
    }
    rejected(&format!("Unknown command '{}', type HELP", raw))
}

fn success(kind: ResponseKind, message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(kind, message)),
    }
}

fn rejected(message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(message.to_string()),
        message: Some(format_response(ResponseKind::Rejected, message)),
    }
}

fn failure(err: LauncherError) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(err.to_string()),
        message: Some(error_to_response(&err)),
    }
}

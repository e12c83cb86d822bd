//! Console session
//!
//! The launcher's event loop: console lines, terminal session events and
//! Ctrl-C all arrive here and are handled one at a time.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::browser::UriOpener;
use crate::console::responses::{ResponseKind, format_output, format_response};
use crate::console::{Command, CommandStatus, ConsoleState, handle_command, parse_command};
use crate::error::LauncherError;
use crate::error::handlers::error_to_response;
use crate::launcher::{ServerLauncher, ToggleAction, ToggleRequest};
use crate::terminal::{SessionEvent, Terminal};

const BANNER: &str = "PHP webserver launcher. Type HELP for commands.\n";

pub struct Console<T: Terminal, B: UriOpener> {
    state: ConsoleState,
    launcher: ServerLauncher<T>,
    browser: B,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    max_command_length: usize,
    stop_grace: Duration,
}

impl<T: Terminal, B: UriOpener> Console<T, B> {
    pub fn new(
        state: ConsoleState,
        launcher: ServerLauncher<T>,
        browser: B,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        max_command_length: usize,
        stop_grace: Duration,
    ) -> Self {
        Self {
            state,
            launcher,
            browser,
            events,
            max_command_length,
            stop_grace,
        }
    }

    pub fn launcher(&self) -> &ServerLauncher<T> {
        &self.launcher
    }

    /// Runs until the user quits or input ends, then stops the server and
    /// waits for its session to exit.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), LauncherError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(BANNER.as_bytes()).await?;
        output.flush().await?;

        loop {
            let close = tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.on_line(&line, &mut output).await?,
                    None => {
                        info!("Console input closed");
                        true
                    }
                },
                Some(event) = self.events.recv() => {
                    self.on_session_event(event, &mut output).await?;
                    false
                }
                _ = tokio::signal::ctrl_c() => {
                    // A second Ctrl-C answers the confirmation it raised
                    let command = if self.state.is_close_pending() {
                        Command::Yes
                    } else {
                        Command::Quit
                    };
                    self.dispatch(&command, &mut output).await?
                }
            };

            output.flush().await?;
            if close {
                break;
            }
        }

        self.shutdown(&mut output).await
    }

    async fn on_line<W: AsyncWrite + Unpin>(
        &mut self,
        line: &str,
        output: &mut W,
    ) -> Result<bool, LauncherError> {
        if line.len() > self.max_command_length {
            let msg = format_response(ResponseKind::Rejected, "Command too long");
            output.write_all(msg.as_bytes()).await?;
            return Ok(false);
        }

        let command = parse_command(line);
        debug!("Console command: {:?}", command);
        self.dispatch(&command, output).await
    }

    /// Runs one command; returns `true` when the console should close
    async fn dispatch<W: AsyncWrite + Unpin>(
        &mut self,
        command: &Command,
        output: &mut W,
    ) -> Result<bool, LauncherError> {
        let result = handle_command(&mut self.state, &mut self.launcher, &self.browser, command);

        if let Some(msg) = &result.message {
            output.write_all(msg.as_bytes()).await?;
        }

        match result.status {
            CommandStatus::Close => return Ok(true),
            CommandStatus::Failure(reason) => debug!("Command {:?} failed: {}", command, reason),
            CommandStatus::Success => {}
        }

        if self.state.is_panel_visible() {
            output.write_all(self.state.render_panel().as_bytes()).await?;
        }
        Ok(false)
    }

    async fn on_session_event<W: AsyncWrite + Unpin>(
        &mut self,
        event: SessionEvent,
        output: &mut W,
    ) -> Result<(), LauncherError> {
        match event {
            SessionEvent::Ready { session, pid } => {
                debug!("Session {} ready (pid {})", session, pid);
                if let Err(e) = self.launcher.on_session_ready(session) {
                    output.write_all(error_to_response(&e).as_bytes()).await?;
                }
            }
            SessionEvent::Output { session, line } => {
                if self.launcher.current_session() == Some(session) {
                    output.write_all(format_output(&line).as_bytes()).await?;
                } else {
                    debug!("[session {}] {}", session, line);
                }
            }
            SessionEvent::Exited { session, code } => {
                if self.launcher.on_session_exited(session, code) {
                    let message = match code {
                        Some(0) => "Server exited".to_string(),
                        Some(code) => format!("Server exited with status {}", code),
                        None => "Server exited with an unknown status".to_string(),
                    };
                    output
                        .write_all(format_response(ResponseKind::Info, &message).as_bytes())
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Stops a running server and waits, bounded, for its session to exit
    async fn shutdown<W: AsyncWrite + Unpin>(
        &mut self,
        output: &mut W,
    ) -> Result<(), LauncherError> {
        let session = match self.launcher.on_server_toggle(ToggleRequest::Off) {
            Ok(ToggleAction::Terminated(session)) => session,
            Ok(_) => return Ok(()),
            Err(e) => {
                output.write_all(error_to_response(&e).as_bytes()).await?;
                return Ok(());
            }
        };

        info!("Waiting for session {} to exit", session);
        let events = &mut self.events;
        let exited = async {
            while let Some(event) = events.recv().await {
                if let SessionEvent::Exited { session: id, code } = event {
                    if id == session {
                        return Some(code);
                    }
                }
            }
            None
        };

        let budget = self.stop_grace * 3;
        match tokio::time::timeout(budget, exited).await {
            Ok(Some(code)) => info!("Session {} exited with {:?}", session, code),
            Ok(None) => debug!("Session events closed before session {} exited", session),
            Err(_) => warn!("Session {} still running after {:?}", session, budget),
        }

        output
            .write_all(format_response(ResponseKind::Ok, "Server stopped").as_bytes())
            .await?;
        output.flush().await?;
        Ok(())
    }
}

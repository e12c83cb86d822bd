//! Server process state
//!
//! Tracks whether the server is running and drives the terminal through
//! start and stop transitions.

use log::{debug, info, warn};

use crate::error::LauncherError;
use crate::launcher::{ElevationTemplate, ServerConfig, build_browser_url, build_command};
use crate::terminal::{SessionId, Terminal};

/// On/off state of the server, as shown by the server switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerProcessState {
    #[default]
    Stopped,
    Running,
}

impl ServerProcessState {
    pub fn is_running(&self) -> bool {
        matches!(self, ServerProcessState::Running)
    }
}

/// What the server switch was flipped to
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleRequest {
    On(ServerConfig),
    Off,
}

impl ToggleRequest {
    pub fn desired_on(&self) -> bool {
        matches!(self, ToggleRequest::On(_))
    }
}

/// Work required to move between two states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
    None,
}

/// Outcome of a toggle as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// A session was spawned; the server command follows on its ready event
    Spawned(SessionId),
    /// The session was interrupted and the terminal reset
    Terminated(SessionId),
    Unchanged,
}

/// Computes the next state for a switch position
pub fn next_transition(
    state: ServerProcessState,
    desired_on: bool,
) -> (ServerProcessState, Transition) {
    match (state, desired_on) {
        (ServerProcessState::Stopped, true) => (ServerProcessState::Running, Transition::Start),
        (ServerProcessState::Running, false) => (ServerProcessState::Stopped, Transition::Stop),
        (state, _) => (state, Transition::None),
    }
}

/// Runs PHP's built-in server through a terminal collaborator.
pub struct ServerLauncher<T: Terminal> {
    terminal: T,
    elevation: ElevationTemplate,
    shell: Vec<String>,
    state: ServerProcessState,
    browser_enabled: bool,
    session: Option<SessionId>,
    /// Config waiting for the session's ready event
    pending: Option<ServerConfig>,
    /// Config the current server was started with
    active: Option<ServerConfig>,
}

impl<T: Terminal> ServerLauncher<T> {
    pub fn new(terminal: T, elevation: ElevationTemplate, shell: Vec<String>) -> Self {
        Self {
            terminal,
            elevation,
            shell,
            state: ServerProcessState::Stopped,
            browser_enabled: false,
            session: None,
            pending: None,
            active: None,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn state(&self) -> ServerProcessState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Whether the "open in browser" action is available
    pub fn browser_enabled(&self) -> bool {
        self.browser_enabled
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn active_config(&self) -> Option<&ServerConfig> {
        self.active.as_ref()
    }

    pub fn elevation(&self) -> &ElevationTemplate {
        &self.elevation
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// URL of the running server, while the browser action is enabled
    pub fn browser_url(&self) -> Option<String> {
        match (&self.active, self.browser_enabled) {
            (Some(config), true) => Some(build_browser_url(config)),
            _ => None,
        }
    }

    // --------------------
    // Transitions
    // --------------------

    /// Handles the server switch. Never blocks: the server command is only
    /// fed once `on_session_ready` is called for the spawned session.
    pub fn on_server_toggle(
        &mut self,
        request: ToggleRequest,
    ) -> Result<ToggleAction, LauncherError> {
        let (_, transition) = next_transition(self.state, request.desired_on());

        match (transition, request) {
            (Transition::Start, ToggleRequest::On(config)) => self.start(config),
            (Transition::Stop, _) => self.stop(),
            _ => Ok(ToggleAction::Unchanged),
        }
    }

    fn start(&mut self, config: ServerConfig) -> Result<ToggleAction, LauncherError> {
        let session = match self.terminal.spawn_session(&self.shell) {
            Ok(session) => session,
            Err(e) => {
                self.clear();
                return Err(e.into());
            }
        };

        info!(
            "Starting server session {} on {}:{}",
            session, config.bind_address, config.port
        );

        self.state = ServerProcessState::Running;
        self.session = Some(session);
        self.pending = Some(config.clone());
        self.active = Some(config);
        self.browser_enabled = true;
        Ok(ToggleAction::Spawned(session))
    }

    /// Interrupts the session and resets the terminal. The launcher is
    /// Stopped afterwards even when the interrupt could not be delivered.
    fn stop(&mut self) -> Result<ToggleAction, LauncherError> {
        let session = self.session;
        self.clear();

        self.terminal.set_input_enabled(true);
        let interrupted = self.terminal.send_interrupt();
        self.terminal.reset();

        if let Err(e) = interrupted {
            warn!("Failed to interrupt server session {:?}: {}", session, e);
            return Err(e.into());
        }

        match session {
            Some(session) => {
                info!("Stopped server session {}", session);
                Ok(ToggleAction::Terminated(session))
            }
            None => Ok(ToggleAction::Unchanged),
        }
    }

    /// Feeds the server command once the session accepts input, then locks
    /// the terminal so it only displays output.
    ///
    /// Returns `false` when the event belongs to a session that is no
    /// longer current.
    pub fn on_session_ready(&mut self, session: SessionId) -> Result<bool, LauncherError> {
        if self.session != Some(session) {
            debug!("Ignoring ready signal from stale session {}", session);
            return Ok(false);
        }

        let Some(config) = self.pending.take() else {
            return Ok(false);
        };

        let script = build_command(&config, &self.elevation);
        debug!("Session {} <- {}", session, script.trim_end());

        self.terminal.feed_input(&script)?;
        self.terminal.set_input_enabled(false);
        Ok(true)
    }

    /// Records that a session's shell exited on its own.
    ///
    /// Returns `true` when this stopped the running server.
    pub fn on_session_exited(&mut self, session: SessionId, code: Option<i32>) -> bool {
        if self.session != Some(session) {
            return false;
        }

        match code {
            Some(0) => info!("Server session {} exited", session),
            Some(code) => warn!("Server session {} exited with status {}", session, code),
            None => warn!("Server session {} exited with an unknown status", session),
        }

        self.clear();
        self.terminal.set_input_enabled(true);
        self.terminal.reset();
        true
    }

    fn clear(&mut self) {
        self.state = ServerProcessState::Stopped;
        self.browser_enabled = false;
        self.session = None;
        self.pending = None;
        self.active = None;
    }
}

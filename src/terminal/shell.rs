//! Shell terminal
//!
//! Runs each session as a shell on a pseudo-terminal. Input is typed into the
//! master side, so an interrupt is delivered by the terminal driver to the
//! foreground job whatever user it runs as. Output comes back line by line as
//! `SessionEvent::Output`.

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::TerminalError;
use crate::terminal::{SessionEvent, SessionId, Terminal};

/// End of Text, what a terminal sends for Ctrl-C
const INTERRUPT: &[u8] = b"\x03";

const TERMINAL_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 120,
    pixel_width: 0,
    pixel_height: 0,
};

pub struct ShellTerminal {
    events: mpsc::UnboundedSender<SessionEvent>,
    stop_grace: Duration,
    next_session: SessionId,
    session: Option<ShellSession>,
    input_enabled: bool,
}

struct ShellSession {
    id: SessionId,
    /// The shell leads its own session and process group
    pid: Pid,
    master: Box<dyn MasterPty + Send>,
    input: mpsc::UnboundedSender<Vec<u8>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    exited: Arc<AtomicBool>,
}

impl ShellTerminal {
    /// Creates a terminal reporting to `events`. Interrupted sessions still
    /// alive after `stop_grace` are killed.
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>, stop_grace: Duration) -> Self {
        Self {
            events,
            stop_grace,
            next_session: 1,
            session: None,
            input_enabled: true,
        }
    }

    fn current(&self) -> Result<&ShellSession, TerminalError> {
        self.session.as_ref().ok_or(TerminalError::NoSession)
    }
}

fn pty_error(e: impl std::fmt::Display) -> TerminalError {
    TerminalError::PtyUnavailable(e.to_string())
}

impl Terminal for ShellTerminal {
    fn spawn_session(&mut self, argv: &[String]) -> Result<SessionId, TerminalError> {
        let (program, args) = argv.split_first().ok_or(TerminalError::NoShell)?;
        self.session = None;

        let pair = native_pty_system().openpty(TERMINAL_SIZE).map_err(pty_error)?;
        let reader = pair.master.try_clone_reader().map_err(pty_error)?;
        let writer = pair.master.take_writer().map_err(pty_error)?;

        let mut command = CommandBuilder::new(program);
        command.args(args);
        if let Ok(cwd) = std::env::current_dir() {
            command.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|e| TerminalError::SpawnFailed(program.clone(), e.to_string()))?;
        drop(pair.slave);

        let mut killer = child.clone_killer();
        let Some(pid) = child.process_id() else {
            let _ = killer.kill();
            return Err(TerminalError::NoSession);
        };

        let session = self.next_session;
        self.next_session += 1;
        info!("Spawned {} (pid {}) as session {}", program, pid, session);

        // Ready goes out before any output so listeners see it first
        let _ = self.events.send(SessionEvent::Ready { session, pid });

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        thread::spawn(move || write_input(session, writer, input_rx));

        let (output_done, output_closed) = std_mpsc::channel();
        let events = self.events.clone();
        thread::spawn(move || forward_output(session, reader, events, output_done));

        let exited = Arc::new(AtomicBool::new(false));
        let watcher = WatchExit {
            session,
            output_closed,
            exited: Arc::clone(&exited),
            events: self.events.clone(),
            drain: self.stop_grace,
        };
        thread::spawn(move || watcher.run(child));

        self.session = Some(ShellSession {
            id: session,
            pid: Pid::from_raw(pid as i32),
            master: pair.master,
            input: input_tx,
            killer,
            exited,
        });
        Ok(session)
    }

    fn feed_input(&mut self, text: &str) -> Result<(), TerminalError> {
        if !self.input_enabled {
            return Err(TerminalError::InputDisabled);
        }

        self.current()?
            .input
            .send(text.as_bytes().to_vec())
            .map_err(|_| TerminalError::SessionClosed)
    }

    fn send_interrupt(&mut self) -> Result<(), TerminalError> {
        if !self.input_enabled {
            return Err(TerminalError::InputDisabled);
        }

        let session = self.current()?;
        if session.exited.load(Ordering::SeqCst) {
            return Ok(());
        }

        // Foreground job first, then the shell's own group
        let mut groups = Vec::with_capacity(2);
        if let Some(leader) = session.master.process_group_leader() {
            groups.push(Pid::from_raw(leader));
        }
        if !groups.contains(&session.pid) {
            groups.push(session.pid);
        }

        session
            .input
            .send(INTERRUPT.to_vec())
            .map_err(|_| TerminalError::SessionClosed)?;

        tokio::spawn(kill_after_grace(
            session.id,
            groups,
            session.killer.clone_killer(),
            Arc::clone(&session.exited),
            self.stop_grace,
        ));
        Ok(())
    }

    fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Detached from session {}", session.id);
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn input_enabled(&self) -> bool {
        self.input_enabled
    }
}

/// Writes queued input to the terminal until the sender is dropped
fn write_input(
    session: SessionId,
    mut writer: Box<dyn Write + Send>,
    mut input: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(bytes) = input.blocking_recv() {
        if let Err(e) = writer.write_all(&bytes).and_then(|()| writer.flush()) {
            debug!("Session {} stopped accepting input: {}", session, e);
            break;
        }
    }
}

/// Streams terminal output as lines; invalid UTF-8 is replaced.
///
/// `_done` is dropped on return, which tells the exit watcher the output
/// has been drained.
fn forward_output(
    session: SessionId,
    stream: Box<dyn Read + Send>,
    events: mpsc::UnboundedSender<SessionEvent>,
    _done: std_mpsc::Sender<()>,
) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\r', '\n']).to_string();
                if events.send(SessionEvent::Output { session, line }).is_err() {
                    break;
                }
            }
            // Linux reports EIO once every process holding the terminal is gone
            Err(e) => {
                debug!("Output of session {} closed: {}", session, e);
                break;
            }
        }
    }
}

struct WatchExit {
    session: SessionId,
    output_closed: std_mpsc::Receiver<()>,
    exited: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<SessionEvent>,
    drain: Duration,
}

impl WatchExit {
    /// Waits for the shell to exit, drains its output, then reports the exit
    fn run(self, mut child: Box<dyn Child + Send + Sync>) {
        let code = match child.wait() {
            Ok(status) => i32::try_from(status.exit_code()).ok(),
            Err(e) => {
                warn!("Failed to wait for session {}: {}", self.session, e);
                None
            }
        };
        self.exited.store(true, Ordering::SeqCst);

        if let Err(RecvTimeoutError::Timeout) = self.output_closed.recv_timeout(self.drain) {
            debug!("Output of session {} still open after exit", self.session);
        }

        let _ = self.events.send(SessionEvent::Exited {
            session: self.session,
            code,
        });
    }
}

async fn kill_after_grace(
    session: SessionId,
    groups: Vec<Pid>,
    mut killer: Box<dyn ChildKiller + Send + Sync>,
    exited: Arc<AtomicBool>,
    grace: Duration,
) {
    tokio::time::sleep(grace).await;
    if exited.load(Ordering::SeqCst) {
        return;
    }

    warn!("Session {} ignored interrupt for {:?}, killing it", session, grace);
    for group in groups {
        match killpg(group, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(
                "Failed to kill process group {} of session {}: {}",
                group, session, e
            ),
        }
    }
    if let Err(e) = killer.kill() {
        debug!("Failed to kill shell of session {}: {}", session, e);
    }
}

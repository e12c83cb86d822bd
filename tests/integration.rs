use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use php_webserver_launcher::browser::UriOpener;
use php_webserver_launcher::config::ServerSettings;
use php_webserver_launcher::console::{Console, ConsoleState};
use php_webserver_launcher::launcher::{
    ElevationTemplate, ServerConfig, ServerLauncher, ServerProcessState, ToggleAction,
    ToggleRequest,
};
use php_webserver_launcher::terminal::{SessionEvent, ShellTerminal, Terminal};

const BASH: &str = "/bin/bash";
const WAIT: Duration = Duration::from_secs(10);

struct NoBrowser;

impl UriOpener for NoBrowser {
    fn open(&self, _url: &str) {}
}

// Helper to write an executable stand-in for the php binary
fn fake_php(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("php");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn server_config(php: &Path, root: &Path) -> ServerConfig {
    ServerConfig {
        executable_path: php.to_string_lossy().to_string(),
        bind_address: "127.0.0.1".to_string(),
        port: 8080,
        document_root: root.to_string_lossy().to_string(),
        ini_path: None,
    }
}

// Helper to wait for the next event matching `pred`
async fn next_event(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

// True for a line the session printed, as opposed to the terminal's echo of
// the command that printed it
fn printed(event: &SessionEvent, text: &str) -> bool {
    matches!(
        event,
        SessionEvent::Output { line, .. } if line.ends_with(text) && !line.contains("echo")
    )
}

#[tokio::test]
async fn test_shell_session_reports_ready_output_and_exit() {
    let (tx, mut events) = mpsc::unbounded_channel();
    let mut terminal = ShellTerminal::new(tx, Duration::from_millis(500));

    let session = terminal.spawn_session(&["/bin/sh".to_string()]).unwrap();
    let first = next_event(&mut events, |_| true).await;
    assert!(matches!(first, SessionEvent::Ready { session: s, .. } if s == session));

    terminal.feed_input("echo hello from shell; exit 3\n").unwrap();

    let output = next_event(&mut events, |e| printed(e, "hello from shell")).await;
    assert_eq!(output.session(), session);

    let exited = next_event(&mut events, |e| matches!(e, SessionEvent::Exited { .. })).await;
    assert_eq!(exited, SessionEvent::Exited { session, code: Some(3) });
}

#[tokio::test]
async fn test_interrupt_reaches_foreground_job() {
    let (tx, mut events) = mpsc::unbounded_channel();
    // Grace outlasts the test, so only the typed Ctrl-C can end the job
    let mut terminal = ShellTerminal::new(tx, Duration::from_secs(60));
    let session = terminal.spawn_session(&["/bin/sh".to_string()]).unwrap();

    terminal.feed_input("echo started; sleep 30\n").unwrap();
    next_event(&mut events, |e| printed(e, "started")).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    terminal.send_interrupt().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    terminal.feed_input("echo interrupted; exit 4\n").unwrap();

    next_event(&mut events, |e| printed(e, "interrupted")).await;
    let exited = next_event(&mut events, |e| matches!(e, SessionEvent::Exited { .. })).await;
    assert_eq!(exited, SessionEvent::Exited { session, code: Some(4) });
}

#[tokio::test]
async fn test_disabled_input_is_refused() {
    let (tx, _events) = mpsc::unbounded_channel();
    let mut terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    terminal.spawn_session(&["/bin/sh".to_string()]).unwrap();

    terminal.set_input_enabled(false);
    assert!(terminal.feed_input("echo nope\n").is_err());
    assert!(terminal.send_interrupt().is_err());

    terminal.set_input_enabled(true);
    terminal.feed_input("exit 0\n").unwrap();
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let (tx, _events) = mpsc::unbounded_channel();
    let mut terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    assert!(
        terminal
            .spawn_session(&["/definitely/not/a/shell".to_string()])
            .is_err()
    );
    assert!(terminal.spawn_session(&[]).is_err());
}

#[tokio::test]
async fn test_launcher_runs_server_script_to_completion() {
    if !Path::new(BASH).exists() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let php = fake_php(dir.path(), "echo \"served $*\"");

    let (tx, mut events) = mpsc::unbounded_channel();
    let terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    let mut launcher =
        ServerLauncher::new(terminal, ElevationTemplate::identity(), vec![BASH.to_string()]);

    let action = launcher
        .on_server_toggle(ToggleRequest::On(server_config(&php, dir.path())))
        .unwrap();
    let ToggleAction::Spawned(session) = action else {
        panic!("expected a spawned session, got {:?}", action);
    };

    next_event(&mut events, |e| matches!(e, SessionEvent::Ready { .. })).await;
    assert!(launcher.on_session_ready(session).unwrap());
    assert!(!launcher.terminal().input_enabled());

    let expected = format!("served -S 127.0.0.1:8080 -t {}", dir.path().display());
    let output = next_event(&mut events, |e| {
        matches!(e, SessionEvent::Output { line, .. } if line.contains("served"))
    })
    .await;
    match output {
        SessionEvent::Output { line, .. } => assert!(line.ends_with(&expected), "{:?}", line),
        other => panic!("unexpected event {:?}", other),
    }

    let exited = next_event(&mut events, |e| matches!(e, SessionEvent::Exited { .. })).await;
    assert_eq!(exited, SessionEvent::Exited { session, code: Some(0) });
    assert!(launcher.on_session_exited(session, Some(0)));
    assert_eq!(launcher.state(), ServerProcessState::Stopped);
}

#[tokio::test]
async fn test_stop_terminates_long_running_server() {
    if !Path::new(BASH).exists() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let php = fake_php(dir.path(), "echo listening; exec sleep 30");

    let (tx, mut events) = mpsc::unbounded_channel();
    let terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    let mut launcher =
        ServerLauncher::new(terminal, ElevationTemplate::identity(), vec![BASH.to_string()]);

    launcher
        .on_server_toggle(ToggleRequest::On(server_config(&php, dir.path())))
        .unwrap();
    let session = launcher.current_session().unwrap();
    next_event(&mut events, |e| matches!(e, SessionEvent::Ready { .. })).await;
    launcher.on_session_ready(session).unwrap();
    next_event(&mut events, |e| {
        matches!(e, SessionEvent::Output { line, .. } if line.contains("listening"))
    })
    .await;

    let action = launcher.on_server_toggle(ToggleRequest::Off).unwrap();
    assert_eq!(action, ToggleAction::Terminated(session));
    assert!(!launcher.browser_enabled());

    let exited = next_event(&mut events, |e| matches!(e, SessionEvent::Exited { .. })).await;
    assert_eq!(exited.session(), session);
}

#[tokio::test]
async fn test_console_quit_when_stopped() {
    let (tx, events) = mpsc::unbounded_channel();
    let terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    let launcher =
        ServerLauncher::new(terminal, ElevationTemplate::identity(), vec!["/bin/sh".to_string()]);
    let mut console = Console::new(
        ConsoleState::new(ServerSettings::default()),
        launcher,
        NoBrowser,
        events,
        4096,
        Duration::from_millis(500),
    );

    let mut out = Vec::new();
    console
        .run(&b"STATUS\nbogus\nQUIT\nSTATUS\n"[..], &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("[info] Server stopped"));
    assert!(out.contains("[rejected] Unknown command 'bogus'"));
    assert!(out.ends_with("[ok] Goodbye\n"));
}

#[tokio::test]
async fn test_console_confirms_quit_while_running() {
    if !Path::new(BASH).exists() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let php = fake_php(dir.path(), "exec sleep 30");

    let mut settings = ServerSettings::default();
    settings.executable_path = php.to_string_lossy().to_string();
    settings.bind_address = "127.0.0.1".to_string();
    settings.port = "8080".to_string();
    settings.document_root = dir.path().to_string_lossy().to_string();

    let (tx, events) = mpsc::unbounded_channel();
    let terminal = ShellTerminal::new(tx, Duration::from_millis(500));
    let launcher =
        ServerLauncher::new(terminal, ElevationTemplate::identity(), vec![BASH.to_string()]);
    let mut console = Console::new(
        ConsoleState::new(settings),
        launcher,
        NoBrowser,
        events,
        4096,
        Duration::from_millis(500),
    );

    let (mut user, console_input) = tokio::io::duplex(1024);
    let typing = tokio::spawn(async move {
        for (line, pause) in [("START", 500), ("STATUS", 50), ("QUIT", 50), ("YES", 0)] {
            user.write_all(format!("{}\n", line).as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
        user
    });

    let mut out = Vec::new();
    tokio::time::timeout(WAIT, console.run(BufReader::new(console_input), &mut out))
        .await
        .expect("console did not close")
        .unwrap();
    drop(typing.await.unwrap());

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("[ok] Starting server at http://127.0.0.1:8080/"));
    assert!(out.contains("Server running at http://127.0.0.1:8080/"));
    assert!(out.contains("[confirm] The server is still running"));
    assert!(out.contains("[ok] Stopping server and quitting"));
    assert!(out.ends_with("[ok] Server stopped\n"));
    assert!(!console.launcher().is_running());
}

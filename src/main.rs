//! PHP Webserver Launcher - Entry Point
//!
//! Configures and runs PHP's built-in development web server from a console.

use log::info;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use php_webserver_launcher::browser::SystemBrowser;
use php_webserver_launcher::config::LauncherConfig;
use php_webserver_launcher::console::{Console, ConsoleState};
use php_webserver_launcher::error::LauncherError;
use php_webserver_launcher::error::handlers::handle_error;
use php_webserver_launcher::launcher::ServerLauncher;
use php_webserver_launcher::launcher::elevation::resolve_elevation;
use php_webserver_launcher::terminal::{ShellTerminal, user_shell};
use php_webserver_launcher::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    setup_logging();

    info!("Launching PHP webserver launcher...");

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LauncherError> {
    // An explicit config file may be passed as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => LauncherConfig::load_from(&path)?,
        None => LauncherConfig::load()?,
    };
    let (startup, settings) = config.split();

    // Probed once; every start below reuses it
    let elevation = resolve_elevation(&startup)?;
    let shell = user_shell(startup.shell.as_deref())?;
    info!("Terminal sessions run {:?}", shell);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let terminal = ShellTerminal::new(events_tx, startup.stop_grace());
    let launcher = ServerLauncher::new(terminal, elevation, shell);

    let mut console = Console::new(
        ConsoleState::new(settings),
        launcher,
        SystemBrowser,
        events_rx,
        startup.max_command_length,
        startup.stop_grace(),
    );

    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Launcher closed");
    Ok(())
}

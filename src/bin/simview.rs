//! simview - headless viewer for a remote agent simulation
//!
//! Connects to the simulation server, mirrors its state and prints one line
//! per completed frame. Commands typed on stdin are forwarded to the server.
//!
//! # Usage
//!
//! ```text
//! simview                      # Same as `simview watch`
//! simview watch --json         # One JSON object per event
//! simview send SPEED:3         # Send one command and exit
//! simview scenario 2           # Start scenario 2 at the default speed
//! simview stop                 # Stop the running scenario
//! ```

use std::fs::OpenOptions;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use simview_client::{ClientConfig, CommandSender, SimClient};
use simview_core::{ConnectionState, GridConfig, Snapshot};
use simview_protocol::{Command, CommandParseError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "simview=info,simview_client=info";

// ============================================================================
// CLI Arguments
// ============================================================================

/// simview - live mirror of a remote agent simulation
#[derive(Parser, Debug)]
#[command(name = "simview")]
#[command(about = "Watch and control a running agent simulation")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Action>,

    /// Simulation server host (overrides config file and SIMVIEW_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Simulation server port (overrides config file and SIMVIEW_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print every new frame and forward stdin commands (default)
    Watch {
        /// Emit one JSON object per line instead of text
        #[arg(long)]
        json: bool,
    },
    /// Send a single command, e.g. `SPEED:3` or `scenario 1`
    Send {
        command: String,

        /// Seconds to wait for a connection
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
    /// Start a scenario at the default speed
    Scenario {
        id: u32,

        /// Seconds to wait for a connection
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
    /// Stop the running scenario
    Stop {
        /// Seconds to wait for a connection
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Builds the client config: defaults, then file, then environment, then flags.
fn load_config(args: &Args) -> Result<ClientConfig> {
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::load_default().context("Failed to load default config")?,
    };

    let mut config = config
        .with_env_overrides()
        .context("Invalid environment override")?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Cancels `token` on Ctrl-C or SIGTERM.
fn spawn_signal_task(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        token.cancel();
    });
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("Received SIGTERM");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                debug!("Received Ctrl+C");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        debug!("Received Ctrl+C");
    }

    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_snapshot(snapshot: &Snapshot, as_json: bool) {
    if as_json {
        println!("{}", json!({ "event": "snapshot", "snapshot": snapshot }));
        return;
    }

    let counts = snapshot.condition_counts();
    let averages = match snapshot.stats() {
        Some(stats) => format!(
            "energy={:.1} stress={:.1} money={:.2} alive={} dead={} occupied={}",
            stats.avg_energy, stats.avg_stress, stats.avg_money, stats.alive, stats.dead, stats.occupied
        ),
        None => "stats=-".to_string(),
    };

    println!(
        "#{} agents={} places={} {} healthy/critical/busy/dead={}/{}/{}/{}",
        snapshot.sequence(),
        snapshot.agents().len(),
        snapshot.places().len(),
        averages,
        counts.healthy,
        counts.critical,
        counts.busy,
        counts.dead,
    );
}

fn print_connection(state: ConnectionState, address: &str, as_json: bool) {
    if as_json {
        println!("{}", json!({ "event": "connection", "state": state, "server": address }));
    } else {
        println!("[{state}] {address}");
    }
}

fn print_grid(grid: GridConfig, as_json: bool) {
    if as_json {
        println!(
            "{}",
            json!({ "event": "grid", "width": grid.width, "height": grid.height })
        );
    } else {
        println!("[grid] {grid}");
    }
}

/// Reads stdin lines on a plain thread.
///
/// A blocking read must not hold up runtime shutdown, so this stays off the
/// tokio blocking pool. The channel closes at EOF or on a read error.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Parses typed command text. Unknown keywords are sent verbatim.
fn parse_command(text: &str) -> Result<Command, CommandParseError> {
    match text.parse::<Command>() {
        Err(CommandParseError::Unknown(_)) => Command::raw(text.trim()),
        other => other,
    }
}

/// Parses one stdin line and forwards it.
fn forward_input(commands: &CommandSender, line: &str) {
    let text = line.trim();
    if text.is_empty() {
        return;
    }

    match parse_command(text) {
        Ok(command) => {
            if !commands.send(command.clone()) {
                eprintln!("not connected, dropped {command}");
            }
        }
        Err(e) => eprintln!("invalid command {text:?}: {e}"),
    }
}

// ============================================================================
// Actions
// ============================================================================

async fn watch(config: ClientConfig, as_json: bool) -> Result<()> {
    let address = config.address();
    let client = SimClient::spawn(config);
    let cancel_token = client.cancel_token();
    spawn_signal_task(cancel_token.clone());

    let store = client.store();
    let mut snapshots = store.subscribe();
    let mut connection = store.subscribe_connection();
    let mut grid = store.subscribe_grid();
    let commands = client.commands();

    let mut stdin = spawn_stdin_reader();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot, as_json);
            }

            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                print_connection(state, &address, as_json);
            }

            changed = grid.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *grid.borrow_and_update();
                print_grid(current, as_json);
            }

            line = stdin.recv() => match line {
                Some(line) => forward_input(&commands, &line),
                None => {
                    info!("stdin closed, exiting");
                    break;
                }
            },
        }
    }

    client.shutdown().await;
    Ok(())
}

/// Connects, runs `send` against the live connection and shuts down.
async fn send_once<F>(config: ClientConfig, timeout_secs: u64, send: F) -> Result<()>
where
    F: FnOnce(&CommandSender) -> bool,
{
    let address = config.address();
    let client = SimClient::spawn(config);

    if !client.wait_connected(Duration::from_secs(timeout_secs)).await {
        client.shutdown().await;
        bail!("Could not connect to {address} within {timeout_secs}s");
    }

    let sent = send(&client.commands());
    client.shutdown().await;

    if !sent {
        bail!("Connection to {address} was lost before the command was sent");
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config = load_config(&args)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        server = %config.address(),
        "simview starting"
    );

    match args.command.unwrap_or(Action::Watch { json: false }) {
        Action::Watch { json } => watch(config, json).await,
        Action::Send { command, timeout } => {
            let command = parse_command(&command)
                .with_context(|| format!("Invalid command {command:?}"))?;
            send_once(config, timeout, |commands| commands.send(command)).await
        }
        Action::Scenario { id, timeout } => {
            send_once(config, timeout, |commands| commands.launch_scenario(id)).await
        }
        Action::Stop { timeout } => send_once(config, timeout, CommandSender::stop).await,
    }
}

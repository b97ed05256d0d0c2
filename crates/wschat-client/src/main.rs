//! wschat terminal client entry point.
//!
//! Wires together the WebSocket channel, the REST online-count source, the
//! terminal presenter and the chat session, then runs the event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + CLI overrides  -> SessionConfig
//!  └─ ChatSession::new(WebSocketChannel, TerminalPresenter, HttpOnlineCount)
//!  └─ stdin thread       -- parses lines into UserIntents
//!  └─ Ctrl-C task        -- posts UserIntent::Quit
//!  └─ run_event_loop()   -- the only place session state changes
//! ```
//!
//! # Usage
//!
//! ```text
//! wschat [--server HOST:PORT] [--heartbeat-secs N] [--config PATH]
//!        [--user-id ID --username NAME] [--init-config]
//! ```
//!
//! Logs go to stderr; the chat transcript goes to stdout.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wschat_client::application::connection::ChatSession;
use wschat_client::application::events::{
    event_channel, run_event_loop, ClientEvent, EventSender, UserIntent,
};
use wschat_client::infrastructure::network::{HttpOnlineCount, WebSocketChannel};
use wschat_client::infrastructure::storage::config::{
    config_file_path, load_config, save_config, AppConfig,
};
use wschat_client::infrastructure::ui_bridge::commands::{parse_line, Command, HELP};
use wschat_client::infrastructure::ui_bridge::TerminalPresenter;

/// Time given to the socket task to send its close frame before exit.
const EXIT_GRACE: Duration = Duration::from_millis(200);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Terminal client for the wschat WebSocket chat server.
#[derive(Debug, Parser)]
#[command(name = "wschat", about = "Terminal client for the wschat chat server", version)]
struct Cli {
    /// Chat server as host[:port]. Overrides `server.host` from the config file.
    #[arg(long, env = "WSCHAT_SERVER")]
    server: Option<String>,

    /// Heartbeat interval in seconds. Overrides `heartbeat.interval_secs`.
    #[arg(long, env = "WSCHAT_HEARTBEAT_SECS")]
    heartbeat_secs: Option<u64>,

    /// Path to the config file. Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connect on start as this user ID (requires --username).
    #[arg(long, requires = "username")]
    user_id: Option<String>,

    /// Connect on start with this username (requires --user-id).
    #[arg(long, requires = "user_id")]
    username: Option<String>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(server) = &self.server {
            config.server.host = server.clone();
        }
        if let Some(secs) = self.heartbeat_secs {
            config.heartbeat.interval_secs = secs;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load config")?;
    cli.apply_overrides(&mut config);

    // `RUST_LOG` wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => config_file_path().context("no config path available")?,
        };
        save_config(&config, &path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let session_config = config.session_config().context("invalid configuration")?;
    info!(
        "wschat starting (server {}, heartbeat every {:?})",
        session_config.server_host, session_config.heartbeat_interval
    );

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (events, event_rx) = event_channel();
    let presenter = Arc::new(TerminalPresenter::stdout());
    let channel = Arc::new(WebSocketChannel::new(events.clone()));
    let counts = Arc::new(HttpOnlineCount::new(
        &session_config.server_host,
        events.clone(),
    ));
    let session = ChatSession::new(
        session_config,
        channel,
        presenter.clone(),
        counts,
        events.clone(),
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let quit_tx = events.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = quit_tx.send(ClientEvent::Intent(UserIntent::Quit));
        }
    });

    // ── Input ─────────────────────────────────────────────────────────────────
    presenter.print_line(HELP);
    if let (Some(user_id), Some(username)) = (cli.user_id, cli.username) {
        let _ = events.send(ClientEvent::Intent(UserIntent::Connect { user_id, username }));
    }
    spawn_stdin_reader(events, Arc::clone(&presenter));

    run_event_loop(session, event_rx).await;

    tokio::time::sleep(EXIT_GRACE).await;
    info!("wschat stopped");
    Ok(())
}

/// Reads stdin on a dedicated thread and posts parsed intents.
///
/// Help, status and parse errors are answered directly on the terminal.
/// End of input posts [`UserIntent::Quit`].
fn spawn_stdin_reader(events: EventSender, presenter: Arc<TerminalPresenter>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_line(&line) {
                Ok(Some(Command::Intent(intent))) => {
                    if events.send(ClientEvent::Intent(intent)).is_err() {
                        return;
                    }
                }
                Ok(Some(Command::Help)) => presenter.print_line(HELP),
                Ok(Some(Command::Status)) => presenter.print_line(&presenter.snapshot().summary()),
                Ok(None) => {}
                Err(e) => presenter.print_line(&format!("!! {e}")),
            }
        }
        debug!("stdin closed");
        let _ = events.send(ClientEvent::Intent(UserIntent::Quit));
    });
}

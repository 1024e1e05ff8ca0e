//! Group welcome bot: entry point.
//!
//! Connects to a OneBot v11 implementation over a forward WebSocket, greets
//! members who join an enabled group and answers the `welcome_*` admin
//! commands.
//!
//! # Usage
//!
//! ```text
//! welcome-bot [OPTIONS]
//!
//! Options:
//!   --ws-url <URL>            OneBot forward WebSocket [default: ws://127.0.0.1:3001]
//!   --access-token <TOKEN>    Bearer token for the OneBot endpoint
//!   --config <PATH>           Welcome settings file [default: welcome.toml]
//!   --base-dir <DIR>          Directory the image folder is relative to
//!   --admin <ID,...>          Superuser IDs
//!   --command-prefix <P>      Prefix before command words [default: /]
//!   --reconnect-secs <SECS>   Delay between reconnects [default: 5]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Default               |
//! |--------------------------|-----------------------|
//! | `WELCOME_WS_URL`         | `ws://127.0.0.1:3001` |
//! | `WELCOME_ACCESS_TOKEN`   | none                  |
//! | `WELCOME_CONFIG`         | `welcome.toml`        |
//! | `WELCOME_BASE_DIR`       | config file directory |
//! | `WELCOME_ADMINS`         | none                  |
//! | `WELCOME_COMMAND_PREFIX` | `/`                   |
//! | `WELCOME_RECONNECT_SECS` | `5`                   |

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use welcome_bot::application::{load_welcome_config, AccessPolicy, Dispatcher, WelcomeService};
use welcome_bot::infrastructure::image_folder::ImageFolder;
use welcome_bot::infrastructure::onebot::{run_client, OneBotSettings, WsEventBus};
use welcome_bot::infrastructure::storage::TomlConfigStore;
use welcome_core::BotSettings;

/// Capacity of the outbound action queue.
const OUTBOUND_QUEUE: usize = 256;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// OneBot group welcome bot.
#[derive(Debug, Parser)]
#[command(
    name = "welcome-bot",
    about = "Greets new group members with a configurable message and picture",
    version
)]
struct Cli {
    /// OneBot v11 forward WebSocket endpoint.
    #[arg(long, default_value = "ws://127.0.0.1:3001", env = "WELCOME_WS_URL")]
    ws_url: String,

    /// Access token sent as `Authorization: Bearer <token>`.
    #[arg(long, env = "WELCOME_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// TOML file holding the welcome settings.  Created on first save.
    #[arg(long, default_value = "welcome.toml", env = "WELCOME_CONFIG")]
    config: PathBuf,

    /// Directory the `image_folder` setting is resolved against.
    ///
    /// Defaults to the directory containing the config file.
    #[arg(long, env = "WELCOME_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Superuser IDs, comma separated.
    #[arg(long = "admin", env = "WELCOME_ADMINS", value_delimiter = ',')]
    admins: Vec<String>,

    /// Prefix in front of command words.  May be empty.
    #[arg(long, default_value = "/", env = "WELCOME_COMMAND_PREFIX")]
    command_prefix: String,

    /// Seconds to wait before reconnecting after the connection drops.
    #[arg(long, default_value_t = 5, env = "WELCOME_RECONNECT_SECS")]
    reconnect_secs: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into [`BotSettings`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--ws-url` is not a `ws://` or `wss://` URL or if
    /// `--reconnect-secs` is zero.
    fn into_settings(self) -> anyhow::Result<BotSettings> {
        let ws_url = self.ws_url.trim().to_string();
        if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
            anyhow::bail!("invalid OneBot URL '{ws_url}': expected ws:// or wss://");
        }
        if self.reconnect_secs == 0 {
            anyhow::bail!("--reconnect-secs must be at least 1");
        }

        Ok(BotSettings {
            ws_url,
            access_token: self.access_token.filter(|t| !t.trim().is_empty()),
            config_path: self.config,
            base_dir: self.base_dir,
            superusers: self
                .admins
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            command_prefix: self.command_prefix,
            reconnect_interval: Duration::from_secs(self.reconnect_secs),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Startup order:
///
/// 1. Logging, then CLI parsing into [`BotSettings`].
/// 2. Open the config store and load the welcome settings.
/// 3. Create the image folder.  The bot refuses to start if that fails.
/// 4. Wire service, bus and dispatcher; install the Ctrl+C handler.
/// 5. Run the OneBot client until shutdown, then save the settings once more.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Cli::parse().into_settings()?;
    info!(
        "welcome bot starting: onebot={}, config={}",
        settings.ws_url,
        settings.config_path.display()
    );

    // ── Settings and image folder ─────────────────────────────────────────────
    let store = TomlConfigStore::open(&settings.config_path)
        .with_context(|| format!("failed to open {}", settings.config_path.display()))?;
    let config = load_welcome_config(&store);

    let folder_path = settings.image_base_dir().join(&config.image_folder);
    let images = ImageFolder::ensure(&folder_path).context("cannot prepare the image folder")?;

    let service = Arc::new(WelcomeService::new(config, Box::new(store), Arc::new(images)));

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (bus, outbound) = WsEventBus::channel(OUTBOUND_QUEUE);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&service),
        AccessPolicy::new(settings.superusers.iter().cloned()),
        settings.command_prefix.clone(),
        Arc::new(bus),
    ));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Main loop ─────────────────────────────────────────────────────────────
    let result = run_client(OneBotSettings::from(&settings), dispatcher, outbound, running).await;

    if let Err(e) = service.shutdown().await {
        error!("failed to save welcome settings on shutdown: {e}");
    }
    result?;

    info!("welcome bot stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

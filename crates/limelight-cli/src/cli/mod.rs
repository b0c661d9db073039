//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use limelight_core::api::OverlayApi;
use limelight_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "limelight")]
#[command(version = "0.3")]
#[command(about = "Terminal overlay for live streams: captions and a lottery wheel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the overlay socket URL from config
    #[arg(long, value_name = "URL", env = "LIMELIGHT_SOCKET_URL")]
    url: Option<String>,

    /// Override the control API base URL from config
    #[arg(long, value_name = "URL", env = "LIMELIGHT_API_URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Replay a recorded event file headlessly and print the final state
    Replay {
        /// Path to the event file (one wire event JSON per line)
        #[arg(long, value_name = "FILE")]
        events: PathBuf,

        /// Virtual time advanced between events, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 500)]
        step_ms: u64,

        /// Virtual time to keep ticking after the last event, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 0)]
        settle_ms: u64,

        /// Pretty-print the final state
        #[arg(long)]
        pretty: bool,
    },

    /// Control the lottery on the overlay server
    Lottery {
        #[command(subcommand)]
        command: LotteryCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum LotteryCommands {
    /// Start spinning the wheel
    Start,
    /// Stop the wheel so the server can draw a winner
    Stop,
    /// Clear the participant list
    Clear,
    /// Lock entry into the current round
    Lock,
    /// Reopen entry into the current round
    Unlock,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;

    if let Some(url) = cli.url.as_deref() {
        config.transport.url = url.to_string();
    }
    if let Some(api_url) = cli.api_url.as_deref() {
        config.api.base_url = api_url.to_string();
    }

    // default to the full-screen overlay
    let Some(command) = cli.command else {
        return commands::run::run(&config).await;
    };

    match command {
        Commands::Replay {
            events,
            step_ms,
            settle_ms,
            pretty,
        } => commands::replay::run(&config, &events, step_ms, settle_ms, pretty),

        Commands::Lottery { command } => {
            limelight_core::logging::init_stderr();
            let api = OverlayApi::new(&config.api);
            match command {
                LotteryCommands::Start => commands::lottery::start(&api).await,
                LotteryCommands::Stop => commands::lottery::stop(&api).await,
                LotteryCommands::Clear => commands::lottery::clear(&api).await,
                LotteryCommands::Lock => commands::lottery::set_locked(&api, true).await,
                LotteryCommands::Unlock => commands::lottery::set_locked(&api, false).await,
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

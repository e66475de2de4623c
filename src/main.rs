use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use lavka::cli::{Cli, Commands};
use lavka::core::{config, init_logger};
use lavka::fleet::FleetManager;
use lavka::StoreApi;

/// Main entry point for the storefront bot runtime
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // A panic in any handler must not take down the whole fleet; log it
    // and keep the process alive
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command {
        Some(Commands::Run { poll_interval }) => run_fleet(poll_interval).await,
        Some(Commands::Check) => run_check().await,
        None => {
            // No command specified - default to running the fleet
            log::info!("No command specified, running fleet in default mode");
            run_fleet(None).await
        }
    }
}

/// Run the fleet manager until Ctrl-C
async fn run_fleet(poll_interval: Option<u64>) -> Result<()> {
    let api = Arc::new(StoreApi::from_env()?);
    log::info!("Backend API: {}", api.base_url());

    let manager = FleetManager::new(api);
    let poll = poll_interval
        .map(Duration::from_secs)
        .unwrap_or_else(config::fleet::poll_interval);

    tokio::select! {
        _ = manager.run(poll) => {
            log::error!("Fleet manager loop exited unexpectedly");
        }
        _ = signal::ctrl_c() => {
            log::info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}

/// One-shot desired-state fetch for operational smoke checks
async fn run_check() -> Result<()> {
    let api = StoreApi::from_env()?;
    println!("Backend API: {}", api.base_url());

    let bots = api.active_bots().await?;
    println!("Active bots: {}", bots.len());
    for bot in bots {
        let token_state = if bot.usable_token().is_some() { "token set" } else { "NO TOKEN" };
        println!("  {} — {} ({})", bot.id, bot.name, token_state);
    }

    Ok(())
}

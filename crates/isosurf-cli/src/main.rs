mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(cancel.clone());

    info!("🚀 isosurf CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!(
            "Setting Rayon global thread pool to {} threads.",
            num_threads
        );
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let command_result = match cli.command {
        Commands::Extract(args) => {
            info!("Dispatching to 'extract' command.");
            commands::extract::run(args, cancel).await
        }
        Commands::Info(args) => {
            info!("Dispatching to 'info' command.");
            commands::info::run(args).await
        }
        Commands::Combine(args) => {
            info!("Dispatching to 'combine' command.");
            commands::combine::run(args).await
        }
        Commands::Upsample(args) => {
            info!("Dispatching to 'upsample' command.");
            commands::upsample::run(args, cancel).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}

/// Raises `cancel` on Ctrl-C so running workflows stop at their next checkpoint.
fn spawn_interrupt_listener(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, cancelling the running operation...");
                cancel.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });
}

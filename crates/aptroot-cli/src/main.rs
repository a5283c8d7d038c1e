//! aptroot - stage system packages into an isolated dependency root

use std::process::ExitCode;
use std::sync::Arc;

use aptroot_core::Reporter;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aptroot_cli::ui::ConsoleReporter;
use aptroot_cli::{Cli, Commands, cmd};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout belongs to the staging log
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::stdout());

    let result = match cli.command {
        Commands::Supply {
            staging,
            apt_get,
            dpkg,
        } => cmd::supply::supply(&staging, &apt_get, &dpkg, &reporter).await,
        Commands::Finalize { staging } => cmd::finalize::finalize(&staging, &reporter),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            tracing::error!(code = failure.code, "{failure}");
            ExitCode::from(failure.code)
        }
    }
}

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sm_cli::commands::{run, window};
use sm_cli::{Cli, Commands, Config, Outcome, RunArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries only the outcome
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let outcome = match Config::load_from(cli.config.as_deref()) {
                Ok(config) => {
                    tracing::debug!(?config, "loaded configuration");
                    run::run(&config, args, Utc::now()).await
                }
                Err(err) => Outcome::failure(format!("failed to load configuration: {err}")),
            };
            outcome.write_to(&mut io::stdout().lock(), args.json)?;
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Window => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            window::run(&mut io::stdout().lock(), &config, Utc::now())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Daily push streak monitor.
///
/// Checks whether you pushed code inside today's check window and emails
/// you the verdict.
#[derive(Debug, Parser)]
#[command(name = "streak", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check today's activity and send the status email (default).
    Run(RunArgs),

    /// Show today's check window in local time and UTC.
    Window,
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct RunArgs {
    /// Print the report instead of emailing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the invocation result as JSON.
    #[arg(long)]
    pub json: bool,
}

//! Push streak monitor CLI library.
//!
//! This crate provides the CLI interface, configuration, and run
//! orchestration for the streak monitor.

mod cli;
pub mod commands;
mod config;
mod outcome;

pub use cli::{Cli, Commands, RunArgs};
pub use config::{Config, ConfigError, GithubSettings, Settings};
pub use outcome::{Outcome, STATUS_FAILED, STATUS_OK};

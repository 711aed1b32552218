//! CLI subcommand implementations.

pub mod run;
pub mod window;

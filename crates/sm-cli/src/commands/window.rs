//! Window command for showing today's resolved check window.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::Config;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";
const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn run<W: Write>(writer: &mut W, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let window = config.window().context("invalid window settings")?;
    let resolved = window
        .resolve(now)
        .context("failed to resolve today's window")?;

    writeln!(writer, "Date:   {}", resolved.date)?;
    writeln!(writer, "Window: {window}")?;
    writeln!(
        writer,
        "Local:  {} .. {}",
        resolved.local_start().format(LOCAL_FORMAT),
        resolved.local_end().format(LOCAL_FORMAT)
    )?;
    writeln!(
        writer,
        "UTC:    {} .. {}",
        resolved.start.format(UTC_FORMAT),
        resolved.end.format(UTC_FORMAT)
    )?;
    Ok(())
}

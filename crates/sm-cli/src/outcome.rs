//! Invocation result reported back to the scheduler.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 500;

/// Success or failure of one run, with a short human-readable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Outcome {
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body.into(),
        }
    }

    pub fn failure(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_FAILED,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, json: bool) -> Result<()> {
        if json {
            serde_json::to_writer(&mut *writer, self)?;
            writeln!(writer)?;
        } else {
            writeln!(writer, "{}", self.body)?;
        }
        Ok(())
    }
}

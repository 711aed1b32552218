//! Status email for the push streak monitor.
//!
//! Renders a daily [`StatusReport`] as plain text and HTML and delivers it
//! through an authenticated SMTP relay.

mod report;
mod smtp;

use thiserror::Error;

pub use report::StatusReport;
pub use smtp::{DEFAULT_SMTP_PORT, Notifier, SmtpNotifier, SmtpSettings, compose};

/// Mail errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// A configured address could not be parsed.
    #[error("invalid {field} address: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: lettre::address::AddressError,
    },
    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(#[source] lettre::error::Error),
    /// Connecting, authenticating, or sending failed.
    #[error("SMTP error: {0}")]
    Transport(#[source] lettre::transport::smtp::Error),
}

//! SMTP delivery of status reports.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::MailError;
use crate::report::StatusReport;

/// Submission port with STARTTLS.
pub const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers a status report to its recipient.
pub trait Notifier {
    fn send(&self, report: &StatusReport) -> impl Future<Output = Result<(), MailError>>;
}

/// Mail relay connection settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Sender address, also used as the relay login.
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"[REDACTED]")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Sends reports through an authenticated STARTTLS relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// Parses both mailboxes and prepares the transport. No connection is made.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let from = parse_mailbox("sender", &settings.sender)?;
        let to = parse_mailbox("recipient", &settings.recipient)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(MailError::Transport)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    pub fn compose(&self, report: &StatusReport) -> Result<Message, MailError> {
        compose(&self.from, &self.to, report)
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, report: &StatusReport) -> Result<(), MailError> {
        let message = self.compose(report)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(MailError::Transport)?;
        tracing::info!(recipient = %self.to, code = %response.code(), "status email sent");
        Ok(())
    }
}

/// Builds a `multipart/alternative` message carrying both renderings.
pub fn compose(from: &Mailbox, to: &Mailbox, report: &StatusReport) -> Result<Message, MailError> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(report.subject())
        .multipart(MultiPart::alternative_plain_html(
            report.render_text(),
            report.render_html(),
        ))
        .map_err(MailError::Build)
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, MailError> {
    value
        .parse()
        .map_err(|source| MailError::Address { field, source })
}

//! Run command: check today's window and send the status report.

use chrono::{DateTime, Utc};
use thiserror::Error;

use sm_core::{
    ActivityCheck, ActivitySource, ActivityWindow, PageLimits, WindowError, check_activity,
};
use sm_mail::{MailError, Notifier, SmtpNotifier, StatusReport};

use crate::RunArgs;
use crate::config::{Config, ConfigError};
use crate::outcome::Outcome;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to set up {component}: {source}")]
    Setup {
        component: &'static str,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("{0}")]
    Fetch(#[source] BoxError),
    #[error("Email failed: {0}")]
    Send(#[from] MailError),
}

impl RunError {
    fn setup(component: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Setup {
            component,
            source: source.into(),
        }
    }
}

/// Validates settings, runs the check, and reports the result.
///
/// Every failure is folded into the returned [`Outcome`].
pub async fn run(config: &Config, args: RunArgs, now: DateTime<Utc>) -> Outcome {
    match prepare_and_execute(config, args, now).await {
        Ok(check) => success_outcome(&check, args.dry_run),
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            Outcome::failure(err.to_string())
        }
    }
}

async fn prepare_and_execute(
    config: &Config,
    args: RunArgs,
    now: DateTime<Utc>,
) -> Result<ActivityCheck, RunError> {
    let settings = config.settings()?;
    tracing::debug!(?settings, "validated settings");

    let source = sm_github::Client::with_base_url(
        &settings.github.api_url,
        &settings.github.username,
        &settings.github.token,
    )
    .map_err(|err| RunError::setup("GitHub client", err))?;
    let notifier =
        SmtpNotifier::new(&settings.smtp).map_err(|err| RunError::setup("mail relay", err))?;

    if args.dry_run {
        execute(&source, &StderrNotifier, settings.window, now, PageLimits::default()).await
    } else {
        execute(&source, &notifier, settings.window, now, PageLimits::default()).await
    }
}

/// Checks the window containing `now` and hands the report to `notifier`.
///
/// Nothing is sent if the feed cannot be read at all.
pub async fn execute<S, N>(
    source: &S,
    notifier: &N,
    window: ActivityWindow,
    now: DateTime<Utc>,
    limits: PageLimits,
) -> Result<ActivityCheck, RunError>
where
    S: ActivitySource,
    N: Notifier,
{
    let resolved = window.resolve(now)?;
    let check = check_activity(source, resolved, limits)
        .await
        .map_err(|err| RunError::Fetch(Box::new(err)))?;

    let report = StatusReport::new(window, &check);
    tracing::info!(
        date = %report.date_label(),
        matched = check.result.matched,
        "sending status report"
    );
    notifier.send(&report).await?;
    Ok(check)
}

pub fn success_outcome(check: &ActivityCheck, dry_run: bool) -> Outcome {
    let found = if check.result.matched {
        "commit found"
    } else {
        "no commit found"
    };
    if dry_run {
        Outcome::success(format!("Dry run, email not sent. {found}."))
    } else {
        Outcome::success(format!("Email sent. {found}."))
    }
}

/// Prints the report instead of mailing it. Stdout is left to the outcome.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    async fn send(&self, report: &StatusReport) -> Result<(), MailError> {
        eprintln!("Subject: {}", report.subject());
        eprintln!();
        eprint!("{}", report.render_text());
        eprintln!();
        Ok(())
    }
}

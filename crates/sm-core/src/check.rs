//! Paginated event collection and window classification.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::event::Event;
use crate::window::{Placement, ResolvedWindow};

/// Default number of pages requested before giving up on older history.
pub const DEFAULT_MAX_PAGES: u32 = 5;
/// Default page size; the events API caps this at 100.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// A paged, newest-first feed of user activity.
pub trait ActivitySource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches one page (1-based). An empty page means the feed is exhausted.
    fn fetch_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>>;
}

/// Bounds on how much of the feed a single check reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_pages: u32,
    pub per_page: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Errors that abort a check.
#[derive(Debug, Error)]
pub enum CheckError<E>
where
    E: std::error::Error + 'static,
{
    /// Nothing could be read from the feed.
    #[error("failed to fetch events: {0}")]
    FirstPage(#[source] E),
}

/// How much of the relevant feed a check actually saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completeness {
    /// The feed ran out or paging reached events older than the window.
    Complete,
    /// Paging stopped at the page limit while still inside the window.
    PageLimitReached,
    /// A later page failed; results cover the pages fetched before it.
    Degraded { page: u32, reason: String },
}

/// Events gathered from the feed, in fetch order.
#[derive(Debug, Clone)]
pub struct Collected {
    pub events: Vec<Event>,
    pub pages_fetched: u32,
    pub completeness: Completeness,
}

/// Window classification of a batch of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// At least one push landed inside the window.
    pub matched: bool,
    /// Instants of qualifying pushes, in fetch order.
    pub matching: Vec<DateTime<Utc>>,
    pub pushes_before: usize,
    pub pushes_after: usize,
    pub events_seen: usize,
}

impl CheckResult {
    pub fn commit_count(&self) -> usize {
        self.matching.len()
    }
}

/// A full check: the window it ran against plus how the feed was read.
#[derive(Debug, Clone)]
pub struct ActivityCheck {
    pub window: ResolvedWindow,
    pub result: CheckResult,
    pub pages_fetched: u32,
    pub completeness: Completeness,
}

/// Reads pages from `source` until the feed is exhausted, the page limit is
/// hit, or a page reaches back past the start of `window`.
///
/// A failure on the first page is an error. A failure on any later page ends
/// paging and keeps what was already fetched.
pub async fn collect_events<S>(
    source: &S,
    window: &ResolvedWindow,
    limits: PageLimits,
) -> Result<Collected, CheckError<S::Error>>
where
    S: ActivitySource,
{
    let mut events = Vec::new();
    let mut pages_fetched = 0;

    for page in 1..=limits.max_pages {
        let batch = match source.fetch_page(page, limits.per_page).await {
            Ok(batch) => batch,
            Err(err) if pages_fetched == 0 => {
                tracing::error!(page, error = %err, "failed to fetch events");
                return Err(CheckError::FirstPage(err));
            }
            Err(err) => {
                tracing::warn!(page, error = %err, "failed to fetch events, using partial data");
                return Ok(Collected {
                    events,
                    pages_fetched,
                    completeness: Completeness::Degraded {
                        page,
                        reason: err.to_string(),
                    },
                });
            }
        };

        // Minimum rather than last element, so a page that is not strictly
        // sorted cannot stop paging early.
        let Some(oldest) = batch.iter().map(|event| event.timestamp).min() else {
            tracing::debug!(page, "empty page, feed exhausted");
            return Ok(Collected {
                events,
                pages_fetched,
                completeness: Completeness::Complete,
            });
        };

        pages_fetched += 1;
        let count = batch.len();
        events.extend(batch);
        tracing::info!(page, count, total = events.len(), "fetched events page");

        if oldest < window.start {
            tracing::debug!(page, %oldest, "page reaches before window start, stopping");
            return Ok(Collected {
                events,
                pages_fetched,
                completeness: Completeness::Complete,
            });
        }
    }

    tracing::info!(max_pages = limits.max_pages, "page limit reached");
    Ok(Collected {
        events,
        pages_fetched,
        completeness: Completeness::PageLimitReached,
    })
}

/// Sorts pushes into before / within / after `window`. Other kinds are ignored.
pub fn classify(events: &[Event], window: &ResolvedWindow) -> CheckResult {
    let mut matching = Vec::new();
    let mut pushes_before = 0;
    let mut pushes_after = 0;

    for event in events.iter().filter(|event| event.is_push()) {
        let local = event.timestamp.with_timezone(&window.timezone);
        let placement = window.place(event.timestamp);
        tracing::info!(
            at = %local.format("%Y-%m-%d %H:%M:%S %Z"),
            repo = %event.repo,
            ?placement,
            "push event"
        );

        match placement {
            Placement::Before => pushes_before += 1,
            Placement::Within => matching.push(event.timestamp),
            Placement::After => pushes_after += 1,
        }
    }

    if matching.is_empty() {
        tracing::info!("no pushes found in check window");
    } else {
        tracing::info!(count = matching.len(), "found pushes in check window");
    }

    CheckResult {
        matched: !matching.is_empty(),
        matching,
        pushes_before,
        pushes_after,
        events_seen: events.len(),
    }
}

/// Collects events for `window` and classifies them.
pub async fn check_activity<S>(
    source: &S,
    window: ResolvedWindow,
    limits: PageLimits,
) -> Result<ActivityCheck, CheckError<S::Error>>
where
    S: ActivitySource,
{
    tracing::info!(
        date = %window.date,
        start = %window.start,
        end = %window.end,
        "checking activity window"
    );
    let collected = collect_events(source, &window, limits).await?;
    let result = classify(&collected.events, &window);
    Ok(ActivityCheck {
        window,
        result,
        pages_fetched: collected.pages_fetched,
        completeness: collected.completeness,
    })
}

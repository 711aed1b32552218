//! Local-time check windows and their resolution to UTC instants.

use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Step used to walk out of a DST spring-forward gap.
const GAP_STEP_MINUTES: i64 = 15;
/// Upper bound on gap steps (3 hours), well past any real transition.
const MAX_GAP_STEPS: u32 = 12;

/// Window construction and resolution errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// The window ends before it starts.
    #[error("window start {start} is after window end {end}")]
    Inverted { start: NaiveTime, end: NaiveTime },
    /// A local time could not be mapped onto the zone's timeline.
    #[error("local time {local} does not exist in {}", .timezone.name())]
    Unresolvable { local: NaiveDateTime, timezone: Tz },
}

/// Daily check window expressed in wall-clock time of a named zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    start: NaiveTime,
    end: NaiveTime,
    timezone: Tz,
}

impl ActivityWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, timezone: Tz) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self {
            start,
            end,
            timezone,
        })
    }

    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolves the window for the local calendar date that `now` falls on.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<ResolvedWindow, WindowError> {
        let today = now.with_timezone(&self.timezone).date_naive();
        self.resolve_on(today)
    }

    /// Resolves the window for an explicit local calendar date.
    ///
    /// Ambiguous local times (DST fall-back) widen the window: the start takes
    /// the earlier instant and the end the later one. Local times inside a
    /// spring-forward gap move to the first wall-clock time that exists.
    pub fn resolve_on(&self, date: NaiveDate) -> Result<ResolvedWindow, WindowError> {
        let start = local_to_utc(self.timezone, date.and_time(self.start), Edge::Start)?;
        let end = local_to_utc(self.timezone, date.and_time(self.end), Edge::End)?;
        Ok(ResolvedWindow {
            date,
            start,
            end,
            timezone: self.timezone,
        })
    }
}

impl fmt::Display for ActivityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.timezone.name()
        )
    }
}

/// Where an instant falls relative to a resolved window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    Within,
    After,
}

/// A window pinned to one calendar date, with absolute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    /// Local calendar date the window was resolved for.
    pub date: NaiveDate,
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
    pub timezone: Tz,
}

impl ResolvedWindow {
    pub fn place(&self, instant: DateTime<Utc>) -> Placement {
        if instant < self.start {
            Placement::Before
        } else if instant > self.end {
            Placement::After
        } else {
            Placement::Within
        }
    }

    pub fn local_start(&self) -> DateTime<Tz> {
        self.start.with_timezone(&self.timezone)
    }

    pub fn local_end(&self) -> DateTime<Tz> {
        self.end.with_timezone(&self.timezone)
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
}

fn local_to_utc(tz: Tz, local: NaiveDateTime, edge: Edge) -> Result<DateTime<Utc>, WindowError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, latest) => {
            let dt = match edge {
                Edge::Start => earliest,
                Edge::End => latest,
            };
            Ok(dt.with_timezone(&Utc))
        }
        LocalResult::None => {
            let mut missing = local;
            for _ in 0..MAX_GAP_STEPS {
                let candidate = missing + TimeDelta::minutes(GAP_STEP_MINUTES);
                if tz.from_local_datetime(&candidate).earliest().is_some() {
                    let first = first_existing(tz, missing, candidate);
                    tracing::debug!(%local, %first, "shifted local time out of DST gap");
                    return tz
                        .from_local_datetime(&first)
                        .earliest()
                        .map(|dt| dt.with_timezone(&Utc))
                        .ok_or(WindowError::Unresolvable {
                            local,
                            timezone: tz,
                        });
                }
                missing = candidate;
            }
            Err(WindowError::Unresolvable {
                local,
                timezone: tz,
            })
        }
    }
}

/// Narrows `(missing, existing]` down to the first local time that exists,
/// to the second. The gap is contiguous, so bisection is exact.
fn first_existing(
    tz: Tz,
    mut missing: NaiveDateTime,
    mut existing: NaiveDateTime,
) -> NaiveDateTime {
    while existing - missing > TimeDelta::seconds(1) {
        let mid = missing + TimeDelta::seconds((existing - missing).num_seconds() / 2);
        if tz.from_local_datetime(&mid).earliest().is_some() {
            existing = mid;
        } else {
            missing = mid;
        }
    }
    existing
}

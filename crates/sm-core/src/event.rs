//! Activity feed events.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository name used when the feed omits one.
pub const UNKNOWN_REPO: &str = "unknown";

/// A single record from a user's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The type of activity.
    pub kind: EventKind,
    /// When the event was created, in UTC.
    pub timestamp: DateTime<Utc>,
    /// Repository the event belongs to (`owner/name`).
    pub repo: String,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>, repo: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            repo: repo.into(),
        }
    }

    pub const fn is_push(&self) -> bool {
        matches!(self.kind, EventKind::Push)
    }
}

/// Event kinds as reported by the feed.
///
/// Only pushes count towards a streak. Every other kind is carried through
/// verbatim so it can still be logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "PushEvent",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PushEvent" => Self::Push,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(kind) = s.parse::<Self>();
        Ok(kind)
    }
}

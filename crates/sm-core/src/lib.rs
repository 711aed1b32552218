//! Core domain logic for the push streak monitor.
//!
//! This crate contains:
//! - Events: records read from a user's activity feed
//! - Windows: a daily local-time window resolved to UTC instants
//! - Checks: paging through the feed and classifying pushes against a window

pub mod check;
pub mod event;
pub mod window;

pub use check::{
    ActivityCheck, ActivitySource, CheckError, CheckResult, Collected, Completeness, PageLimits,
    check_activity, classify, collect_events,
};
pub use event::{Event, EventKind, UNKNOWN_REPO};
pub use window::{ActivityWindow, Placement, ResolvedWindow, WindowError};

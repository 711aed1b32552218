//! Daily status report rendering.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use sm_core::{ActivityCheck, ActivityWindow, CheckResult, Completeness};

const TITLE: &str = "Push Streak Monitor";
const COLOR_OK: &str = "#28a745";
const COLOR_AT_RISK: &str = "#dc3545";

/// Everything needed to tell the recipient how today went.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub date: NaiveDate,
    pub window: ActivityWindow,
    pub result: CheckResult,
    pub completeness: Completeness,
}

impl StatusReport {
    pub fn new(window: ActivityWindow, check: &ActivityCheck) -> Self {
        Self {
            date: check.window.date,
            window,
            result: check.result.clone(),
            completeness: check.completeness.clone(),
        }
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn subject(&self) -> String {
        let headline = if self.result.matched {
            "On track"
        } else {
            "Streak at risk"
        };
        format!("{TITLE} - {headline} ({})", self.date_label())
    }

    pub fn render_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{TITLE} - Daily Status").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Date: {}", self.date_label()).unwrap();
        writeln!(output, "Status: {}", self.status()).unwrap();
        writeln!(output, "{}", self.status_line()).unwrap();
        writeln!(output).unwrap();

        if self.result.matched {
            writeln!(output, "Pushes ({}):", self.timezone().name()).unwrap();
            for time in self.local_times() {
                writeln!(output, "- {time}").unwrap();
            }
            writeln!(output).unwrap();
        }

        writeln!(output, "{}", self.message()).unwrap();
        if let Some(note) = self.completeness_note() {
            writeln!(output).unwrap();
            writeln!(output, "Note: {note}").unwrap();
        }
        writeln!(output).unwrap();
        writeln!(output, "Check window: {}", self.window).unwrap();
        output
    }

    pub fn render_html(&self) -> String {
        let color = if self.result.matched {
            COLOR_OK
        } else {
            COLOR_AT_RISK
        };

        let mut output = String::new();
        writeln!(output, "<html>").unwrap();
        writeln!(output, "<body>").unwrap();
        writeln!(output, "<h2>{TITLE} - Daily Status</h2>").unwrap();
        writeln!(
            output,
            "<p><strong>Date:</strong> {}</p>",
            self.date_label()
        )
        .unwrap();
        writeln!(
            output,
            "<p><strong>Status:</strong> <span style=\"color: {color}; font-weight: bold;\">{}</span></p>",
            self.status()
        )
        .unwrap();
        writeln!(output, "<p><strong>{}</strong></p>", self.status_line()).unwrap();

        if self.result.matched {
            writeln!(output, "<ul>").unwrap();
            for time in self.local_times() {
                writeln!(output, "<li>{time}</li>").unwrap();
            }
            writeln!(output, "</ul>").unwrap();
        }

        writeln!(output, "<hr>").unwrap();
        writeln!(output, "<p>{}</p>", self.message()).unwrap();
        if let Some(note) = self.completeness_note() {
            writeln!(output, "<p><em>Note: {}</em></p>", escape_html(&note)).unwrap();
        }
        writeln!(
            output,
            "<p><strong>Check window:</strong> {}</p>",
            escape_html(&self.window.to_string())
        )
        .unwrap();
        writeln!(output, "</body>").unwrap();
        writeln!(output, "</html>").unwrap();
        output
    }

    const fn timezone(&self) -> Tz {
        self.window.timezone()
    }

    const fn status(&self) -> &'static str {
        if self.result.matched {
            "ON TRACK"
        } else {
            "AT RISK"
        }
    }

    fn status_line(&self) -> String {
        let start = self.window.start().format("%H:%M");
        let end = self.window.end().format("%H:%M");
        if self.result.matched {
            format!(
                "Found {} push(es) between {start} and {end}",
                self.result.commit_count()
            )
        } else {
            format!("No pushes found between {start} and {end}")
        }
    }

    const fn message(&self) -> &'static str {
        if self.result.matched {
            "Nice work, today's square is filled in. Keep it going tomorrow."
        } else {
            "Nothing pushed yet today. Push something before midnight to keep the streak alive."
        }
    }

    fn completeness_note(&self) -> Option<String> {
        match &self.completeness {
            Completeness::Complete => None,
            Completeness::PageLimitReached => Some(
                "stopped at the page limit, older activity in the window was not read.".to_string(),
            ),
            Completeness::Degraded { page, reason } => Some(format!(
                "page {page} of the activity feed could not be read ({reason}); results cover earlier pages only."
            )),
        }
    }

    fn local_times(&self) -> impl Iterator<Item = String> + '_ {
        let tz = self.timezone();
        self.result
            .matching
            .iter()
            .map(move |instant: &DateTime<Utc>| {
                instant.with_timezone(&tz).format("%H:%M:%S").to_string()
            })
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveTime, TimeDelta};
    use chrono_tz::Australia::Sydney;
    use insta::assert_snapshot;

    fn window() -> ActivityWindow {
        ActivityWindow::new(
            NaiveTime::from_hms_opt(0, 1, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            Sydney,
        )
        .unwrap()
    }

    /// Sydney wall-clock time on 2025-12-06 (UTC+11).
    fn local(h: u32, m: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(2025, 12, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        (naive - TimeDelta::hours(11)).and_utc()
    }

    fn report(matching: Vec<DateTime<Utc>>, completeness: Completeness) -> StatusReport {
        StatusReport {
            date: NaiveDate::from_ymd_opt(2025, 12, 6).unwrap(),
            window: window(),
            result: CheckResult {
                matched: !matching.is_empty(),
                matching,
                pushes_before: 0,
                pushes_after: 0,
                events_seen: 0,
            },
            completeness,
        }
    }

    #[test]
    fn subject_reflects_status_and_date() {
        let hit = report(vec![local(12, 0)], Completeness::Complete);
        let miss = report(Vec::new(), Completeness::Complete);
        assert_eq!(hit.subject(), "Push Streak Monitor - On track (2025-12-06)");
        assert_eq!(
            miss.subject(),
            "Push Streak Monitor - Streak at risk (2025-12-06)"
        );
    }

    #[test]
    fn text_report_with_pushes() {
        let report = report(
            vec![local(0, 1), local(12, 0), local(18, 30)],
            Completeness::Complete,
        );
        assert_snapshot!(report.render_text());
    }

    #[test]
    fn text_report_without_pushes() {
        let report = report(Vec::new(), Completeness::Complete);
        assert_snapshot!(report.render_text());
    }

    #[test]
    fn text_report_mentions_degraded_feed() {
        let report = report(
            Vec::new(),
            Completeness::Degraded {
                page: 2,
                reason: "request failed: timed out".to_string(),
            },
        );
        let text = report.render_text();
        assert!(text.contains("Note: page 2 of the activity feed could not be read"));
        assert!(text.contains("request failed: timed out"));
    }

    #[test]
    fn html_report_uses_status_colors() {
        let hit = report(vec![local(12, 0)], Completeness::Complete).render_html();
        let miss = report(Vec::new(), Completeness::Complete).render_html();

        assert!(hit.contains(COLOR_OK));
        assert!(hit.contains("<li>12:00:00</li>"));
        assert!(miss.contains(COLOR_AT_RISK));
        assert!(!miss.contains("<ul>"));
    }

    #[test]
    fn html_report_escapes_failure_reason() {
        let html = report(
            Vec::new(),
            Completeness::Degraded {
                page: 3,
                reason: "<html>gateway</html>".to_string(),
            },
        )
        .render_html();
        assert!(html.contains("&lt;html&gt;gateway&lt;/html&gt;"));
        assert!(!html.contains("<html>gateway"));
    }
}

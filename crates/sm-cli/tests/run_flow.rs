//! Integration tests for the check-and-notify flow.
//!
//! The GitHub side runs against a mock API; the mail side is a notifier that
//! records what it was asked to send.

use std::cell::RefCell;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Australia::Sydney;
use lettre::message::Mailbox;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sm_cli::commands::run::{RunError, execute};
use sm_core::{ActivityWindow, PageLimits};
use sm_mail::{MailError, Notifier, StatusReport};

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<StatusReport>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            fail: true,
        }
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, report: &StatusReport) -> Result<(), MailError> {
        if self.fail {
            let source = "relay refused".parse::<Mailbox>().unwrap_err();
            return Err(MailError::Address {
                field: "recipient",
                source,
            });
        }
        self.sent.borrow_mut().push(report.clone());
        Ok(())
    }
}

fn window() -> ActivityWindow {
    ActivityWindow::new(
        NaiveTime::from_hms_opt(0, 1, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        Sydney,
    )
    .unwrap()
}

/// 19:00 on 2025-12-06 in Sydney, after the window has closed.
fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-12-06T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn event(kind: &str, created_at: &str) -> serde_json::Value {
    json!({"type": kind, "created_at": created_at, "repo": {"name": "octocat/streak"}})
}

async fn serve_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/users/octocat/events"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> sm_github::Client {
    sm_github::Client::with_base_url(server.uri(), "octocat", "ghp_test").unwrap()
}

#[tokio::test]
async fn boundary_pushes_are_reported_in_fetch_order() {
    let server = MockServer::start().await;
    // Sydney 18:31, 18:30, 12:00, 00:01, 00:00 on 2025-12-06 (UTC+11).
    serve_page(
        &server,
        "1",
        json!([
            event("PushEvent", "2025-12-06T07:31:00Z"),
            event("PushEvent", "2025-12-06T07:30:00Z"),
            event("PushEvent", "2025-12-06T01:00:00Z"),
            event("PushEvent", "2025-12-05T13:01:00Z"),
            event("PushEvent", "2025-12-05T13:00:00Z"),
        ]),
    )
    .await;

    let notifier = RecordingNotifier::default();
    let check = execute(&client(&server), &notifier, window(), now(), PageLimits::default())
        .await
        .unwrap();

    assert!(check.result.matched);
    assert_eq!(
        check.result.matching,
        vec![
            at("2025-12-06T07:30:00Z"),
            at("2025-12-06T01:00:00Z"),
            at("2025-12-05T13:01:00Z"),
        ]
    );

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].date_label(), "2025-12-06");
    assert!(sent[0].subject().contains("On track"));
    assert!(sent[0].render_text().contains("Found 3 push(es)"));
}

#[tokio::test]
async fn non_push_activity_does_not_count() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "1",
        json!([event("IssueCommentEvent", "2025-12-05T23:00:00Z")]),
    )
    .await;
    serve_page(&server, "2", json!([])).await;

    let notifier = RecordingNotifier::default();
    let check = execute(&client(&server), &notifier, window(), now(), PageLimits::default())
        .await
        .unwrap();

    assert!(!check.result.matched);
    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject().contains("Streak at risk"));
}

#[tokio::test]
async fn empty_feed_still_sends_report() {
    let server = MockServer::start().await;
    serve_page(&server, "1", json!([])).await;

    let notifier = RecordingNotifier::default();
    let check = execute(&client(&server), &notifier, window(), now(), PageLimits::default())
        .await
        .unwrap();

    assert!(!check.result.matched);
    assert!(check.result.matching.is_empty());
    assert_eq!(notifier.sent.borrow().len(), 1);
}

#[tokio::test]
async fn first_page_failure_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "Service unavailable"})))
        .mount(&server)
        .await;

    let notifier = RecordingNotifier::default();
    let err = execute(&client(&server), &notifier, window(), now(), PageLimits::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Fetch(_)));
    assert!(err.to_string().contains("Service unavailable"));
    assert!(notifier.sent.borrow().is_empty());
}

#[tokio::test]
async fn send_failure_is_surfaced() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "1",
        json!([event("PushEvent", "2025-12-06T01:00:00Z")]),
    )
    .await;
    serve_page(&server, "2", json!([])).await;

    let notifier = RecordingNotifier::failing();
    let err = execute(&client(&server), &notifier, window(), now(), PageLimits::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Send(_)));
    assert!(err.to_string().starts_with("Email failed:"));
}

//! HTTP server for the ruleset sync bot.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if server is running
//!
//! The server does no GitHub calls itself. Verified `ruleset` events go onto
//! the queue read by [`SyncWorker`](crate::worker::SyncWorker); a full queue
//! is answered with 503 so GitHub redelivers later.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::webhooks::RulesetEvent;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Shared application state, handed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    /// Queue feeding the sync worker.
    events: mpsc::Sender<RulesetEvent>,

    /// Slug of the GitHub App the bot runs as. Deliveries it sent are not
    /// queued.
    app_slug: Option<String>,
}

impl AppState {
    /// Creates state for a server that verifies deliveries with
    /// `webhook_secret` and queues ruleset events on `events`.
    pub fn new(webhook_secret: impl Into<Vec<u8>>, events: mpsc::Sender<RulesetEvent>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                events,
                app_slug: None,
            }),
        }
    }

    /// Creates state that also drops deliveries sent by the app with slug
    /// `app_slug`.
    pub fn with_app_slug(
        webhook_secret: impl Into<Vec<u8>>,
        app_slug: impl Into<String>,
        events: mpsc::Sender<RulesetEvent>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                events,
                app_slug: Some(app_slug.into()),
            }),
        }
    }

    /// The app slug whose own deliveries are ignored, if configured.
    pub fn app_slug(&self) -> Option<&str> {
        self.inner.app_slug.as_deref()
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn events(&self) -> &mpsc::Sender<RulesetEvent> {
        &self.inner.events
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::webhooks::{RulesetAction, sign_payload};

    const SECRET: &[u8] = b"test-secret";

    fn app(capacity: usize) -> (axum::Router, mpsc::Receiver<RulesetEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (build_router(AppState::with_app_slug(SECRET, "ruleset-sync", tx)), rx)
    }

    fn payload_from(name: &str, sender: &str, sender_type: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "action": "edited",
            "ruleset": {"id": 21, "name": name, "enforcement": "active"},
            "changes": {"enforcement": {"from": "evaluate"}},
            "organization": {"login": "target-org"},
            "installation": {"id": 4242},
            "sender": {"login": sender, "type": sender_type}
        }))
        .unwrap()
    }

    fn ruleset_payload(name: &str) -> Vec<u8> {
        payload_from(name, "octocat", "User")
    }

    fn webhook_request(event_type: &str, body: Vec<u8>, signature: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
            .header("x-hub-signature-256", signature)
            .body(Body::from(body))
            .unwrap()
    }

    fn signed(event_type: &str, body: Vec<u8>) -> Request<Body> {
        let signature = sign_payload(&body, SECRET);
        webhook_request(event_type, body, signature)
    }

    #[tokio::test]
    async fn health_returns_200() {
        let (app, _rx) = app(1);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn ruleset_event_is_queued() {
        let (app, mut rx) = app(4);

        let response = app
            .oneshot(signed("ruleset", ruleset_payload("protect-main")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.action, RulesetAction::Edited);
        assert_eq!(event.organization.as_str(), "target-org");
        assert_eq!(event.ruleset.name, "protect-main");
    }

    #[tokio::test]
    async fn deliveries_sent_by_the_app_are_not_queued() {
        let (app, mut rx) = app(4);

        let response = app
            .oneshot(signed(
                "ruleset",
                payload_from("protect-main", "ruleset-sync[bot]", "Bot"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn without_app_slug_bot_deliveries_are_queued() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = build_router(AppState::new(SECRET, tx));

        let response = app
            .oneshot(signed(
                "ruleset",
                payload_from("protect-main", "ruleset-sync[bot]", "Bot"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn other_bots_are_still_queued() {
        let (app, mut rx) = app(4);

        let response = app
            .oneshot(signed(
                "ruleset",
                payload_from("protect-main", "terraform-org[bot]", "Bot"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn other_events_are_accepted_but_not_queued() {
        let (app, mut rx) = app(4);

        let response = app
            .oneshot(signed("push", br#"{"ref": "refs/heads/main"}"#.to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_parsing() {
        let (app, mut rx) = app(4);
        let body = b"not json at all".to_vec();
        let signature = sign_payload(&body, b"some-other-secret");

        let response = app
            .oneshot(webhook_request("ruleset", body, signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_headers_are_rejected() {
        let (app, _rx) = app(4);
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-github-event", "ruleset")
            .body(Body::from(ruleset_payload("protect-main")))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("x-github-delivery"));
    }

    #[tokio::test]
    async fn malformed_ruleset_payload_is_bad_request() {
        let (app, _rx) = app(4);

        let response = app
            .oneshot(signed("ruleset", br#"{"action": "edited"}"#.to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_queue_is_service_unavailable() {
        let (app, _rx) = app(1);

        let first = app
            .clone()
            .oneshot(signed("ruleset", ruleset_payload("protect-main")))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = app
            .oneshot(signed("ruleset", ruleset_payload("protect-dev")))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn stopped_worker_is_service_unavailable() {
        let (app, rx) = app(4);
        drop(rx);

        let response = app
            .oneshot(signed("ruleset", ruleset_payload("protect-main")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

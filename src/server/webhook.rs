//! Webhook endpoint handler.
//!
//! Verifies the delivery's signature, parses `ruleset` events and queues them
//! for the sync worker before answering 202 Accepted. The sync itself happens
//! asynchronously.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use super::AppState;
use crate::types::DeliveryId;
use crate::webhooks::{ParseError, parse_webhook, verify_signature};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// The sync queue is full; GitHub can redeliver later.
    #[error("sync queue is full")]
    QueueFull,

    #[error("sync worker is not running")]
    WorkerStopped,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::QueueFull | WebhookError::WorkerStopped => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// `POST /webhook`.
///
/// - 202 Accepted: event queued, or a delivery the bot ignores (other event
///   types, repository rulesets, changes made by the app itself)
/// - 400 Bad Request: missing header or malformed `ruleset` payload
/// - 401 Unauthorized: signature mismatch
/// - 503 Service Unavailable: queue full or worker gone
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(get_header(&headers, HEADER_DELIVERY)?);
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;

    debug!(delivery_id = %delivery_id, event_type = %event_type, "Received webhook");

    // Nothing is parsed before the signature checks out.
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body).inspect_err(|e| {
        warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook payload");
    })?
    else {
        debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring webhook");
        return Ok((StatusCode::ACCEPTED, "Accepted (ignored)"));
    };

    if let Some(app_slug) = app_state.app_slug()
        && event.is_sent_by_app(app_slug)
    {
        debug!(
            delivery_id = %delivery_id,
            ruleset = %event.ruleset.name,
            "Ignoring ruleset change made by this app"
        );
        return Ok((StatusCode::ACCEPTED, "Accepted (ignored)"));
    }

    let org = event.organization.clone();
    let ruleset = event.ruleset.name.clone();

    match app_state.events().try_send(event) {
        Ok(()) => {
            info!(
                delivery_id = %delivery_id,
                org = %org,
                ruleset = %ruleset,
                "Queued ruleset event"
            );
            Ok((StatusCode::ACCEPTED, "Accepted"))
        }
        Err(TrySendError::Full(_)) => {
            warn!(delivery_id = %delivery_id, "Sync queue full, rejecting delivery");
            Err(WebhookError::QueueFull)
        }
        Err(TrySendError::Closed(_)) => {
            warn!(delivery_id = %delivery_id, "Sync worker stopped, rejecting delivery");
            Err(WebhookError::WorkerStopped)
        }
    }
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

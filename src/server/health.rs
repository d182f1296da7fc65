//! Liveness endpoint.
//!
//! Answers 200 as long as the HTTP server is accepting connections. It does
//! not touch GitHub or the definition directory, so a stalled sync worker or
//! an unreachable API does not make the process look dead to an
//! orchestrator's liveness check.

use axum::http::StatusCode;

/// `GET /health` handler.
///
/// Always returns 200 with the plain-text body `OK`.
///
/// ```text
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// content-type: text/plain; charset=utf-8
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

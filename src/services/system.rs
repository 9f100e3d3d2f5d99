//! System-level endpoints: status, shutdown, restart, file upload.
//!
//! Shutdown and restart both answer 202 immediately and hand the real work
//! to the shutdown coordinator in [`super::shared`]: after the configured
//! grace period every registered device is swept to `off` and the serve
//! loop is signalled. The grace period exists so a caller can fire the
//! request and still see its response before the outputs drop.
//!
//! The upload endpoint is the field-update path for a headless device:
//! PATCH the raw file bytes with an `X-Filename` header and let the next
//! restart pick the new code up.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::traits::LineBank;

use super::shared::{ShutdownKind, TracksideState};

/// GET /api/system - Liveness and version report
pub async fn status<B: LineBank + 'static>(
    State(_state): State<Arc<TracksideState<B>>>,
) -> Response {
    Json(json!({
        "ready": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

/// DELETE /api/system - Accept a deferred shutdown
pub async fn shutdown<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
) -> Response {
    state.schedule_shutdown(ShutdownKind::Halt);
    StatusCode::ACCEPTED.into_response()
}

/// POST /api/system/restart - Accept a deferred restart
pub async fn restart<B: LineBank + 'static>(
    State(state): State<Arc<TracksideState<B>>>,
) -> Response {
    state.schedule_shutdown(ShutdownKind::Restart);
    StatusCode::ACCEPTED.into_response()
}

/// PATCH /api/system - Write the request body to a local file
///
/// Requires a `Content-Length` header (411 without one) and a non-empty
/// `X-Filename` header (422 without one). The body is written verbatim;
/// success is 204 with no body.
pub async fn upload<B: LineBank + 'static>(
    State(_state): State<Arc<TracksideState<B>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !headers.contains_key(axum::http::header::CONTENT_LENGTH) {
        return StatusCode::LENGTH_REQUIRED.into_response();
    }
    let filename = headers
        .get("x-filename")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if filename.is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    match tokio::fs::write(filename, &body).await {
        Ok(()) => {
            tracing::info!(filename, bytes = body.len(), "file written");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            tracing::error!(filename, error = %err, "file write failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

//! Relay-key authorization and request correlation middleware.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::metrics::METRICS;
use crate::state::AppState;

pub const RELAY_KEY_HEADER: &str = "x-relay-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Constant-time credential comparison. Length mismatch fails early; the
/// length of the secret is not considered sensitive.
pub fn relay_key_matches(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(key) => {
            key.len() == expected.len() && key.as_bytes().ct_eq(expected.as_bytes()).into()
        }
        None => false,
    }
}

/// Reject with 403 unless `x-relay-key` equals the configured relay key.
/// Runs before body parsing, so no ledger call can happen on failure.
pub async fn relay_key_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(RELAY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if relay_key_matches(&state.config.relay_key, provided) {
        return next.run(request).await;
    }

    let req_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.as_str())
        .unwrap_or_default();
    warn!(
        req_id = %req_id,
        path = %request.uri().path(),
        header_present = provided.is_some(),
        "Rejected relay request: bad relay key"
    );
    let err = crate::Error::Unauthorized;
    METRICS.record_error(&err);
    err.into_response()
}

/// Longest caller-supplied request id we echo back.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Caller id, if short and printable ASCII.
fn caller_request_id(request: &Request) -> Option<String> {
    let id = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let valid = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic());
    valid.then(|| id.to_string())
}

fn generate_request_id() -> String {
    format!("rel-{:016x}", rand::random::<u64>())
}

/// Tag the request with an id (the caller's, or `rel-<16 hex>`) and echo it
/// on the response as `x-request-id`.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let request_id = caller_request_id(&request).unwrap_or_else(generate_request_id);
    let header = HeaderValue::from_str(&request_id);
    request.extensions_mut().insert(RequestId(request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request correlation ID, extractable from `Request::extensions()`.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

//! HTTP request handlers.
//!
//! Every relay route is a thin adapter: pull fields out of the body, reject
//! what's missing or malformed, hand off to [`Relay`], shape the reply.
//! The relay-key check has already run in middleware by the time these execute.

use crate::error::Error;
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::relay::{AmountSource, Relay};
use crate::response::{ClaimResponse, HealthResponse, SendResponse, TrustlineResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(rename = "publicKey")]
    pub public_key: Option<String>,
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct TrustlineRequest {
    pub wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub wallet: Option<String>,
    pub amount: Option<Value>,
}

/// Trimmed, non-empty string field.
fn text(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Amounts may arrive as JSON strings or numbers. Absent, `null` and blank
/// strings are `None`; any other JSON type is rejected.
fn amount_text(field: Option<Value>) -> Result<Option<String>, Error> {
    match field {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(text(Some(s))),
        Some(Value::Number(n)) => Ok(Some(plain_decimal(&n))),
        Some(other) => Err(Error::Validation(format!(
            "Invalid amount: expected a decimal string or number, got {other}"
        ))),
    }
}

/// Render a JSON number without exponent notation, so `1e-7` reads as
/// `0.0000001`. Digits are shifted, never rounded.
fn plain_decimal(n: &Number) -> String {
    let s = n.to_string();
    let Some((mantissa, exp)) = s.split_once(['e', 'E']) else {
        return s;
    };
    let Ok(exp) = exp.parse::<i64>() else {
        return s;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int}{frac}");
    let point = int.len() as i64 + exp;

    let plain = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (head, tail) = digits.split_at(point as usize);
        format!("{head}.{tail}")
    };
    format!("{sign}{plain}")
}

fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    body.map(|Json(v)| v)
        .map_err(|e| Error::Validation(format!("Invalid JSON body: {}", e.body_text())))
}

/// Count, time and render one relay call.
fn finish<T: Serialize>(
    req_id: &RequestId,
    start: Instant,
    result: Result<T, Error>,
) -> Response {
    METRICS.record_duration(start);
    match result {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            METRICS.record_error(&e);
            warn!(req_id = %req_id.0, error = %e, "Relay request failed");
            e.into_response()
        }
    }
}

fn count(state: &AppState, counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
    state.request_count.fetch_add(1, Ordering::Relaxed);
}

/// Liveness string.
pub async fn root() -> &'static str {
    "ESKEY Relay is running"
}

/// Health check with Horizon reachability.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = match state.ledger.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Horizon health check failed");
            "degraded"
        }
    };

    Json(HealthResponse {
        status,
        distribution_account: state.config.signer.account_id(),
        asset: state.config.asset.to_string(),
        network: state.config.network.as_str(),
        horizon: state.ledger.endpoint().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        METRICS.render(),
    )
}

/// `POST /api/send-eskey`: pay the default (or given) amount to `publicKey`.
pub async fn send_eskey(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
    request: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    count(&state, &METRICS.send_requests);

    let result: Result<_, Error> = async {
        let request = body(request)?;
        let destination = text(request.public_key)
            .ok_or_else(|| Error::Validation("Missing publicKey".into()))?;
        let amount = amount_text(request.amount)?;
        let source = match &amount {
            Some(raw) => AmountSource::Caller(raw),
            None => AmountSource::Default,
        };

        info!(req_id = %req_id.0, destination = %destination, "Relaying payment");
        let submitted = Relay::new(&state.config, state.ledger.as_ref())
            .pay(&destination, source)
            .await?;
        METRICS.payments_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(SendResponse::ok(submitted.hash))
    }
    .await;

    finish(&req_id, start, result)
}

/// `POST /trustline`: unsigned change-trust envelope for `wallet`.
pub async fn trustline(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
    request: Result<Json<TrustlineRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    count(&state, &METRICS.trustline_requests);

    let result: Result<_, Error> = async {
        let request = body(request)?;
        let wallet =
            text(request.wallet).ok_or_else(|| Error::Validation("Missing wallet".into()))?;

        info!(req_id = %req_id.0, wallet = %wallet, "Building trustline envelope");
        let envelope = Relay::new(&state.config, state.ledger.as_ref())
            .trustline(&wallet)
            .await?;
        METRICS.trustline_envelopes.fetch_add(1, Ordering::Relaxed);
        Ok(TrustlineResponse::ok(state.config.asset.code(), envelope.xdr))
    }
    .await;

    finish(&req_id, start, result)
}

/// `POST /claim`: pay a caller-chosen `amount` to `wallet`.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
    request: Result<Json<ClaimRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    count(&state, &METRICS.claim_requests);

    let result: Result<_, Error> = async {
        let request = body(request)?;
        let (wallet, amount) = match (text(request.wallet), amount_text(request.amount)?) {
            (Some(w), Some(a)) => (w, a),
            (None, Some(_)) => return Err(Error::Validation("Missing wallet".into())),
            (Some(_), None) => return Err(Error::Validation("Missing amount".into())),
            (None, None) => {
                return Err(Error::Validation("Missing wallet and amount".into()))
            }
        };

        info!(req_id = %req_id.0, wallet = %wallet, amount = %amount, "Relaying claim");
        let submitted = Relay::new(&state.config, state.ledger.as_ref())
            .pay(&wallet, AmountSource::Caller(&amount))
            .await?;
        METRICS.payments_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(ClaimResponse::ok(submitted.hash, amount, wallet))
    }
    .await;

    finish(&req_id, start, result)
}

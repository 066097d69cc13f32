//! Error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Relay error type.
#[derive(Debug)]
pub enum Error {
    /// Invalid startup configuration. Fatal.
    Config(String),
    /// Missing or malformed request field.
    Validation(String),
    /// Relay credential mismatch.
    Unauthorized,
    /// Account load, build, signing or submission failure.
    Ledger(LedgerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Validation(msg) => f.write_str(msg),
            Error::Unauthorized => f.write_str("Unauthorized relay key"),
            Error::Ledger(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        Error::Ledger(e)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Validation(_) | Error::Ledger(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "message": self.to_string()
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Which ledger step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    AccountLoad,
    Build,
    Sign,
    Submit,
    /// Ledger endpoint unreachable or unhealthy.
    Unavailable,
}

/// Failure reported at the ledger-client boundary. Displays the upstream
/// message verbatim.
#[derive(Debug, Clone)]
pub struct LedgerError {
    pub kind: LedgerErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn new(kind: LedgerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn account_load(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::AccountLoad, message)
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Build, message)
    }

    pub fn sign(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Sign, message)
    }

    pub fn submit(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Submit, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(LedgerErrorKind::Unavailable, message)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LedgerError {}

//! Shared fixtures for router-level tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use eskey_relay::{
    create_router, AccountState, AppState, Config, LedgerClient, LedgerError, RelayConfig,
    SubmitOutcome,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use stellar_xdr::curr::TransactionEnvelope;
use tower::ServiceExt;

pub const RELAY_KEY: &str = "relay-secret";
pub const ISSUER: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

pub fn distribution_secret() -> String {
    stellar_strkey::ed25519::PrivateKey([7u8; 32]).to_string()
}

/// Records every call; submissions succeed with `ABC123` unless told otherwise.
#[derive(Default)]
pub struct RecordingLedger {
    pub loads: Mutex<Vec<String>>,
    pub submitted: Mutex<Vec<TransactionEnvelope>>,
    pub fail_load: Option<String>,
    pub fail_submit: Option<String>,
}

impl RecordingLedger {
    pub fn failing_submit(message: &str) -> Self {
        Self {
            fail_submit: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failing_load(message: &str) -> Self {
        Self {
            fail_load: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.loads.lock().unwrap().len() + self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerClient for RecordingLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountState, LedgerError> {
        self.loads.lock().unwrap().push(account_id.to_string());
        if let Some(msg) = &self.fail_load {
            return Err(LedgerError::account_load(msg.clone()));
        }
        Ok(AccountState {
            account_id: account_id.to_string(),
            sequence: 1000,
        })
    }

    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SubmitOutcome, LedgerError> {
        self.submitted.lock().unwrap().push(envelope.clone());
        match &self.fail_submit {
            Some(msg) => Err(LedgerError::submit(msg.clone())),
            None => Ok(SubmitOutcome {
                hash: "ABC123".into(),
                ledger: Some(42),
            }),
        }
    }

    fn endpoint(&self) -> &str {
        "memory://ledger"
    }
}

pub fn relay_config() -> RelayConfig {
    RelayConfig::try_from(Config {
        relay_api_key: Some(RELAY_KEY.into()),
        distribution_secret: Some(distribution_secret()),
        issuer_public: Some(ISSUER.into()),
        stellar_network: "testnet".into(),
        ..Config::default()
    })
    .unwrap()
}

pub fn app(ledger: Arc<RecordingLedger>) -> Router {
    let state = AppState::with_ledger(relay_config(), ledger);
    create_router(Arc::new(state))
}

pub fn post(path: &str, key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-relay-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

//! Horizon REST client.
//!
//! `GET /accounts/{id}` for sequence numbers, `POST /transactions` for
//! submission. No retries: every failure is reported to the caller with the
//! message Horizon gave us.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use stellar_xdr::curr::TransactionEnvelope;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::ledger::{AccountState, LedgerClient, SubmitOutcome};
use crate::metrics::METRICS;
use crate::transaction;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    id: String,
    sequence: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: String,
    #[serde(default)]
    ledger: Option<u32>,
    #[serde(default)]
    successful: Option<bool>,
}

/// RFC 7807 problem document returned by Horizon on errors.
#[derive(Debug, Default, Deserialize)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
    status: Option<u16>,
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl Problem {
    fn message(&self, status: reqwest::StatusCode) -> String {
        let title = self.title.as_deref().unwrap_or("Horizon error");

        if let Some(codes) = self.extras.as_ref().and_then(|e| e.result_codes.as_ref()) {
            let tx = codes.transaction.as_deref().unwrap_or("unknown");
            return if codes.operations.is_empty() {
                format!("{title}: {tx}")
            } else {
                format!("{title}: {tx} ({})", codes.operations.join(", "))
            };
        }

        match &self.detail {
            Some(detail) => format!("{title}: {detail}"),
            None => format!(
                "{title} (status {})",
                self.status.unwrap_or_else(|| status.as_u16())
            ),
        }
    }
}

impl HorizonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn problem(resp: reqwest::Response) -> String {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        serde_json::from_str::<Problem>(&body)
            .map(|p| p.message(status))
            .unwrap_or_else(|_| format!("Horizon returned status {status}"))
    }

    fn record_error(&self) {
        METRICS.ledger_http_errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, account_id: &str) -> Result<AccountState, LedgerError> {
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        let resp = self.http.get(&url).send().await.map_err(|e| {
            self.record_error();
            LedgerError::account_load(format!("account request failed: {e}"))
        })?;

        if !resp.status().is_success() {
            self.record_error();
            let message = Self::problem(resp).await;
            warn!(account = %account_id, error = %message, "Account load failed");
            return Err(LedgerError::account_load(message));
        }

        let body: AccountResponse = resp
            .json()
            .await
            .map_err(|e| LedgerError::account_load(format!("invalid account response: {e}")))?;
        let sequence = body
            .sequence
            .parse()
            .map_err(|e| LedgerError::account_load(format!("invalid sequence number: {e}")))?;

        debug!(account = %body.id, sequence, "Account loaded");
        Ok(AccountState {
            account_id: body.id,
            sequence,
        })
    }

    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SubmitOutcome, LedgerError> {
        let xdr = transaction::to_base64(envelope)?;
        let url = format!("{}/transactions", self.base_url);

        let resp = self
            .http
            .post(&url)
            .form(&[("tx", xdr.as_str())])
            .send()
            .await
            .map_err(|e| {
                self.record_error();
                LedgerError::submit(format!("submit request failed: {e}"))
            })?;

        if !resp.status().is_success() {
            self.record_error();
            return Err(LedgerError::submit(Self::problem(resp).await));
        }

        let body: SubmitResponse = resp
            .json()
            .await
            .map_err(|e| LedgerError::submit(format!("invalid submit response: {e}")))?;

        if body.successful == Some(false) {
            return Err(LedgerError::submit(format!(
                "transaction {} was not successful",
                body.hash
            )));
        }

        Ok(SubmitOutcome {
            hash: body.hash,
            ledger: body.ledger,
        })
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        let resp = self.http.get(&self.base_url).send().await.map_err(|e| {
            self.record_error();
            LedgerError::unavailable(format!("Horizon unreachable: {e}"))
        })?;
        if !resp.status().is_success() {
            self.record_error();
            return Err(LedgerError::unavailable(format!(
                "Horizon returned status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

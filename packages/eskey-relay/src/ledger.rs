//! Ledger client seam.
//!
//! Handlers never talk to Horizon directly; they go through [`LedgerClient`]
//! so a recording fake can stand in during tests.

use async_trait::async_trait;
use stellar_xdr::curr::TransactionEnvelope;

use crate::error::LedgerError;

/// Account state needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub account_id: String,
    pub sequence: i64,
}

/// Accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub hash: String,
    pub ledger: Option<u32>,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Load an account's current sequence number.
    async fn load_account(&self, account_id: &str) -> Result<AccountState, LedgerError>;

    /// Submit a signed envelope. Single attempt.
    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SubmitOutcome, LedgerError>;

    /// Endpoint reachability for `/health`.
    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    /// Endpoint URL, for logs and `/health`.
    fn endpoint(&self) -> &str;
}

//! Build → sign → submit routines behind the relay endpoints.
//!
//! Payments are signed by the distribution key and submitted; trustlines
//! come back unsigned for the wallet owner. Input is validated before the
//! first ledger call, and any ledger failure is returned as-is.

use stellar_xdr::curr::MuxedAccount;
use tracing::{debug, info};

use crate::asset::Amount;
use crate::config::RelayConfig;
use crate::error::Error;
use crate::ledger::{AccountState, LedgerClient};
use crate::transaction::{self, TxParams};

/// Where a payment amount comes from.
#[derive(Debug, Clone, Copy)]
pub enum AmountSource<'a> {
    /// The configured default amount.
    Default,
    /// A decimal string supplied by the caller.
    Caller(&'a str),
}

/// A payment accepted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub hash: String,
    pub amount: Amount,
}

/// An unsigned envelope for the account owner to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub xdr: String,
}

pub struct Relay<'a> {
    config: &'a RelayConfig,
    ledger: &'a dyn LedgerClient,
}

impl<'a> Relay<'a> {
    pub fn new(config: &'a RelayConfig, ledger: &'a dyn LedgerClient) -> Self {
        Self { config, ledger }
    }

    fn resolve_amount(&self, source: AmountSource<'_>) -> Result<Amount, Error> {
        match source {
            AmountSource::Default => Ok(self.config.default_amount),
            AmountSource::Caller(raw) => raw
                .parse()
                .map_err(|e| Error::Validation(format!("Invalid amount: {e}"))),
        }
    }

    /// Load the `G…` account behind `account`.
    async fn load(&self, account: &MuxedAccount) -> Result<AccountState, Error> {
        Ok(self
            .ledger
            .load_account(&transaction::base_account_id(account))
            .await?)
    }

    /// Pay the configured asset from the distribution account to
    /// `destination`, signed by the distribution key.
    pub async fn pay(
        &self,
        destination: &str,
        amount: AmountSource<'_>,
    ) -> Result<Submitted, Error> {
        let destination = destination.trim();
        let recipient = parse_account(destination)?;
        let amount = self.resolve_amount(amount)?;
        let signer = &self.config.signer;

        // Recipient must exist before we pay it.
        self.load(&recipient).await?;
        let source = self.ledger.load_account(&signer.account_id()).await?;
        debug!(sequence = source.sequence, "Distribution account loaded");

        let tx = transaction::payment(
            TxParams::new(signer.muxed_account(), source.sequence),
            destination,
            &self.config.asset,
            amount,
        )?;
        let tx_hash = transaction::hash(&tx, &self.config.network_id)?;
        let mut envelope = transaction::envelope(tx);
        signer.sign_envelope(&mut envelope, &self.config.network_id)?;
        debug!(hash = %hex::encode(tx_hash), "Submitting payment");

        let outcome = self.ledger.submit_transaction(&envelope).await?;
        info!(
            hash = %outcome.hash,
            destination = %destination,
            amount = %amount,
            "Payment submitted"
        );
        Ok(Submitted {
            hash: outcome.hash,
            amount,
        })
    }

    /// Build a change-trust for the configured asset with `wallet` as the
    /// source. Never signed, never submitted.
    pub async fn trustline(&self, wallet: &str) -> Result<Envelope, Error> {
        let wallet = wallet.trim();
        let account = parse_account(wallet)?;
        let state = self.load(&account).await?;
        debug!(wallet = %wallet, sequence = state.sequence, "Wallet account loaded");

        let tx = transaction::change_trust(
            TxParams::new(account, state.sequence),
            &self.config.asset,
        )?;
        let xdr = transaction::to_base64(&transaction::envelope(tx))?;
        info!(wallet = %wallet, asset = %self.config.asset, "Trustline envelope built");
        Ok(Envelope { xdr })
    }
}

fn parse_account(address: &str) -> Result<MuxedAccount, Error> {
    transaction::parse_account(address)
        .map_err(|e| Error::Validation(format!("Invalid account: {e}")))
}

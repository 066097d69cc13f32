//! Application state shared across handlers.

use crate::config::RelayConfig;
use crate::horizon::HorizonClient;
use crate::ledger::LedgerClient;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state. Immutable apart from the request counter.
pub struct AppState {
    pub config: RelayConfig,
    pub ledger: Arc<dyn LedgerClient>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Build state against the configured Horizon endpoint.
    pub fn new(config: RelayConfig) -> Result<Self, crate::Error> {
        let ledger = HorizonClient::new(&config.horizon_url, config.http_timeout)?;
        Ok(Self::with_ledger(config, Arc::new(ledger)))
    }

    /// Build state around any ledger client.
    pub fn with_ledger(config: RelayConfig, ledger: Arc<dyn LedgerClient>) -> Self {
        info!(
            account = %config.signer.account_id(),
            asset = %config.asset,
            network = %config.network,
            horizon = %ledger.endpoint(),
            "Loaded distribution key"
        );

        Self {
            config,
            ledger,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }
}

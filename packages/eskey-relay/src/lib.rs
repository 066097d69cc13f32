//! # ESKEY Relay
//!
//! Pays a Stellar asset from a custodial distribution account on behalf of
//! callers holding the relay key, and builds unsigned trustline envelopes for
//! wallets that want to hold the asset.
//!
//! ## Quick Start
//! ```bash
//! RELAY_API_KEY=... DISTRIBUTION_SECRET=S... ISSUER_PUBLIC=G... \
//!     cargo run --bin eskey-relay
//! ```
//!
//! ## Endpoints
//! - `GET /` - Liveness string
//! - `GET /health` - Distribution account, asset, network and uptime
//! - `GET /metrics` - Prometheus counters
//! - `POST /api/send-eskey` - Pay the default amount to `publicKey`
//! - `POST /trustline` - Unsigned change-trust envelope for `wallet`
//! - `POST /claim` - Pay `amount` to `wallet`

pub mod asset;
pub mod config;
mod error;
mod handlers;
pub mod horizon;
pub mod ledger;
pub mod metrics;
pub mod middleware;
pub mod relay;
mod response;
mod router;
pub mod signer;
mod state;
pub mod transaction;

pub use config::{Config, RelayConfig, StellarNetwork};
pub use error::{Error, LedgerError, LedgerErrorKind};
pub use ledger::{AccountState, LedgerClient, SubmitOutcome};
pub use router::create as create_router;
pub use state::AppState;

//! Response types for the relay API.

use serde::Serialize;

/// `POST /api/send-eskey`.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub hash: String,
}

impl SendResponse {
    pub fn ok(hash: String) -> Self {
        Self {
            success: true,
            hash,
        }
    }
}

/// `POST /trustline`.
#[derive(Debug, Serialize)]
pub struct TrustlineResponse {
    pub success: bool,
    pub message: String,
    pub xdr: String,
}

impl TrustlineResponse {
    pub fn ok(asset_code: &str, xdr: String) -> Self {
        Self {
            success: true,
            message: format!(
                "Trustline transaction for {asset_code} created. Sign it with your wallet and submit it to the network."
            ),
            xdr,
        }
    }
}

/// `POST /claim`.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub hash: String,
    pub sent_amount: String,
    pub wallet: String,
}

impl ClaimResponse {
    pub fn ok(hash: String, sent_amount: String, wallet: String) -> Self {
        Self {
            success: true,
            hash,
            sent_amount,
            wallet,
        }
    }
}

/// `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub distribution_account: String,
    pub asset: String,
    pub network: &'static str,
    pub horizon: String,
    pub uptime_secs: u64,
    pub requests: u64,
}

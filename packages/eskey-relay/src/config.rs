//! Relay configuration.
//!
//! [`Config`] is the raw settings as read from `relay.toml` and the
//! environment, after an optional `.env` file has been loaded into it. [`RelayConfig`] is the validated form the service runs on;
//! building it parses every key and amount, so a bad deployment fails at
//! startup instead of on the first request.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::asset::{Amount, RelayAsset};
use crate::signer::DistributionSigner;
use crate::transaction::NetworkId;

/// Raw settings. Keys match the deployment's environment variable names.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay_api_key: Option<String>,

    #[serde(default)]
    pub distribution_secret: Option<String>,

    #[serde(default)]
    pub issuer_public: Option<String>,

    #[serde(default = "defaults::asset_code")]
    pub asset_code: String,

    #[serde(default = "defaults::asset_amount")]
    pub asset_amount: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    #[serde(default = "defaults::stellar_network")]
    pub stellar_network: String,

    #[serde(default)]
    pub horizon_url: Option<String>,

    #[serde(default)]
    pub network_passphrase: Option<String>,

    #[serde(default = "defaults::http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_api_key: None,
            distribution_secret: None,
            issuer_public: None,
            asset_code: defaults::asset_code(),
            asset_amount: defaults::asset_amount(),
            port: defaults::port(),
            stellar_network: defaults::stellar_network(),
            horizon_url: None,
            network_passphrase: None,
            http_timeout_secs: defaults::http_timeout_secs(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("relay_api_key", &self.relay_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "distribution_secret",
                &self.distribution_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("issuer_public", &self.issuer_public)
            .field("asset_code", &self.asset_code)
            .field("asset_amount", &self.asset_amount)
            .field("port", &self.port)
            .field("stellar_network", &self.stellar_network)
            .field("horizon_url", &self.horizon_url)
            .field("network_passphrase", &self.network_passphrase)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Layer `relay.toml` (optional) under the process environment.
    pub fn load() -> Result<Self, crate::Error> {
        config::Config::builder()
            .add_source(config::File::with_name("relay").required(false))
            .add_source(config::Environment::default())
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::Config(e.to_string()))
    }
}

/// Load `.env` into the process environment. A missing file is fine;
/// an unreadable or malformed one is a config error.
pub fn load_dotenv() -> Result<Option<PathBuf>, crate::Error> {
    dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(
    result: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, crate::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(crate::Error::Config(format!("failed to load .env: {e}"))),
    }
}

mod defaults {
    pub fn asset_code() -> String {
        "ESKEY".into()
    }

    pub fn asset_amount() -> String {
        "1".into()
    }

    pub fn port() -> u16 {
        3000
    }

    pub fn stellar_network() -> String {
        "mainnet".into()
    }

    pub fn http_timeout_secs() -> u64 {
        30
    }
}

/// Named Stellar networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StellarNetwork {
    Mainnet,
    Testnet,
}

impl StellarNetwork {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StellarNetwork::Mainnet => "mainnet",
            StellarNetwork::Testnet => "testnet",
        }
    }

    pub const fn passphrase(&self) -> &'static str {
        match self {
            StellarNetwork::Mainnet => "Public Global Stellar Network ; September 2015",
            StellarNetwork::Testnet => "Test SDF Network ; September 2015",
        }
    }

    pub const fn horizon_url(&self) -> &'static str {
        match self {
            StellarNetwork::Mainnet => "https://horizon.stellar.org",
            StellarNetwork::Testnet => "https://horizon-testnet.stellar.org",
        }
    }
}

impl fmt::Display for StellarNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StellarNetwork {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "public" | "pubnet" => Ok(StellarNetwork::Mainnet),
            "testnet" => Ok(StellarNetwork::Testnet),
            other => Err(crate::Error::Config(format!(
                "unknown stellar network {other:?} (expected mainnet or testnet)"
            ))),
        }
    }
}

/// Validated, immutable configuration.
pub struct RelayConfig {
    pub relay_key: String,
    pub signer: DistributionSigner,
    pub asset: RelayAsset,
    pub default_amount: Amount,
    pub network: StellarNetwork,
    pub network_passphrase: String,
    pub network_id: NetworkId,
    pub horizon_url: String,
    pub port: u16,
    pub http_timeout: Duration,
}

impl RelayConfig {
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, crate::Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| crate::Error::Config(format!("{name} is not set")))
}

impl TryFrom<Config> for RelayConfig {
    type Error = crate::Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let relay_key = required(config.relay_api_key, "RELAY_API_KEY")?;
        let secret = required(config.distribution_secret, "DISTRIBUTION_SECRET")?;
        let issuer = required(config.issuer_public, "ISSUER_PUBLIC")?;

        let signer = DistributionSigner::from_secret(&secret)?;
        let asset = RelayAsset::new(config.asset_code.trim(), issuer.trim())?;
        let default_amount: Amount = config
            .asset_amount
            .parse()
            .map_err(|e| crate::Error::Config(format!("ASSET_AMOUNT: {e}")))?;

        let network: StellarNetwork = config.stellar_network.parse()?;
        let network_passphrase = config
            .network_passphrase
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| network.passphrase().to_string());
        let horizon_url = config
            .horizon_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| network.horizon_url().to_string());

        if config.http_timeout_secs == 0 {
            return Err(crate::Error::Config("HTTP_TIMEOUT_SECS must be positive".into()));
        }

        Ok(Self {
            relay_key,
            signer,
            asset,
            default_amount,
            network,
            network_id: NetworkId::from_passphrase(&network_passphrase),
            network_passphrase,
            horizon_url,
            port: config.port,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
        })
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("relay_key", &"<redacted>")
            .field("signer", &self.signer)
            .field("asset", &self.asset.to_string())
            .field("default_amount", &self.default_amount.to_string())
            .field("network", &self.network)
            .field("horizon_url", &self.horizon_url)
            .field("port", &self.port)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

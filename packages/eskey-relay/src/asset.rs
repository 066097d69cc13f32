//! Relayed asset definition and amount parsing.

use std::fmt;
use std::str::FromStr;
use stellar_strkey::ed25519::PublicKey;
use stellar_xdr::curr::{
    AccountId, AlphaNum12, AlphaNum4, Asset, AssetCode12, AssetCode4, ChangeTrustAsset,
    PublicKey as XdrPublicKey, Uint256,
};

/// Stroops per whole unit (7 decimal places).
pub const STROOPS_PER_UNIT: i64 = 10_000_000;
const MAX_DECIMALS: usize = 7;

/// The credit asset this relay pays out. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAsset {
    code: String,
    issuer: PublicKey,
}

impl RelayAsset {
    pub fn new(code: &str, issuer: &str) -> Result<Self, crate::Error> {
        if code.is_empty() || code.len() > 12 {
            return Err(crate::Error::Config(format!(
                "asset code must be 1-12 characters, got {:?}",
                code
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(crate::Error::Config(format!(
                "asset code must be alphanumeric, got {:?}",
                code
            )));
        }
        let issuer = PublicKey::from_string(issuer)
            .map_err(|e| crate::Error::Config(format!("invalid issuer account: {e}")))?;
        Ok(Self {
            code: code.to_string(),
            issuer,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Issuer as a `G…` strkey.
    pub fn issuer(&self) -> String {
        self.issuer.to_string()
    }

    fn issuer_account(&self) -> AccountId {
        AccountId(XdrPublicKey::PublicKeyTypeEd25519(Uint256(self.issuer.0)))
    }

    fn alphanum(&self) -> AlphaNumCode {
        let b = self.code.as_bytes();
        if b.len() <= 4 {
            let mut buf = [0u8; 4];
            buf[..b.len()].copy_from_slice(b);
            AlphaNumCode::Four(AlphaNum4 {
                asset_code: AssetCode4(buf),
                issuer: self.issuer_account(),
            })
        } else {
            let mut buf = [0u8; 12];
            buf[..b.len()].copy_from_slice(b);
            AlphaNumCode::Twelve(AlphaNum12 {
                asset_code: AssetCode12(buf),
                issuer: self.issuer_account(),
            })
        }
    }

    pub fn to_xdr(&self) -> Asset {
        match self.alphanum() {
            AlphaNumCode::Four(a) => Asset::CreditAlphanum4(a),
            AlphaNumCode::Twelve(a) => Asset::CreditAlphanum12(a),
        }
    }

    pub fn to_change_trust(&self) -> ChangeTrustAsset {
        match self.alphanum() {
            AlphaNumCode::Four(a) => ChangeTrustAsset::CreditAlphanum4(a),
            AlphaNumCode::Twelve(a) => ChangeTrustAsset::CreditAlphanum12(a),
        }
    }

    /// True if `line` is a trust line for this asset.
    pub fn matches_change_trust(&self, line: &ChangeTrustAsset) -> bool {
        *line == self.to_change_trust()
    }
}

impl fmt::Display for RelayAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.issuer)
    }
}

enum AlphaNumCode {
    Four(AlphaNum4),
    Twelve(AlphaNum12),
}

/// A strictly positive asset amount in stroops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn from_stroops(stroops: i64) -> Option<Self> {
        (stroops > 0).then_some(Self(stroops))
    }

    pub fn stroops(self) -> i64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(format!("invalid amount {s:?}"));
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid amount {s:?}"));
        }
        if frac.len() > MAX_DECIMALS {
            return Err(format!(
                "amount {s:?} has more than {} decimal places",
                MAX_DECIMALS
            ));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| format!("amount {s:?} is too large"))?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<width$}", width = MAX_DECIMALS)
                .parse()
                .map_err(|_| format!("invalid amount {s:?}"))?
        };

        let stroops = whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| format!("amount {s:?} is too large"))?;

        Amount::from_stroops(stroops).ok_or_else(|| "amount must be positive".to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_UNIT;
        let frac = self.0 % STROOPS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:07}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

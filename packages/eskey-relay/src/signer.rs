//! Distribution account signer.
//!
//! Holds the distribution account's ed25519 key in memory and produces
//! decorated signatures over Stellar transaction hashes. The secret never
//! leaves this type: `Debug` prints only the public key.

use ed25519_dalek::{Signer as _, SigningKey};
use stellar_strkey::ed25519::{PrivateKey, PublicKey};
use stellar_xdr::curr::{
    DecoratedSignature, MuxedAccount, Signature, SignatureHint, TransactionEnvelope, Uint256,
};

use crate::error::LedgerError;
use crate::transaction::{self, NetworkId};

pub struct DistributionSigner {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl DistributionSigner {
    /// Parse an `S…` secret seed. Fails on anything else.
    pub fn from_secret(secret: &str) -> Result<Self, crate::Error> {
        let seed = PrivateKey::from_string(secret.trim())
            .map_err(|_| crate::Error::Config("invalid distribution secret key".into()))?;
        let signing_key = SigningKey::from_bytes(&seed.0);
        let public_key = PublicKey(signing_key.verifying_key().to_bytes());
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// Distribution account as a `G…` strkey.
    pub fn account_id(&self) -> String {
        self.public_key.to_string()
    }

    pub fn muxed_account(&self) -> MuxedAccount {
        MuxedAccount::Ed25519(Uint256(self.public_key.0))
    }

    /// Last four bytes of the public key.
    pub fn hint(&self) -> SignatureHint {
        let pk = self.public_key.0;
        SignatureHint([pk[28], pk[29], pk[30], pk[31]])
    }

    /// Sign the envelope's transaction hash and append the signature.
    pub fn sign_envelope(
        &self,
        envelope: &mut TransactionEnvelope,
        network_id: &NetworkId,
    ) -> Result<(), LedgerError> {
        let TransactionEnvelope::Tx(v1) = envelope else {
            return Err(LedgerError::sign("only v1 transaction envelopes can be signed"));
        };

        let hash = transaction::hash(&v1.tx, network_id)?;
        let signature = self.signing_key.sign(&hash);

        let decorated = DecoratedSignature {
            hint: self.hint(),
            signature: Signature(
                signature
                    .to_bytes()
                    .to_vec()
                    .try_into()
                    .map_err(|e| LedgerError::sign(format!("signature encoding failed: {e}")))?,
            ),
        };

        let mut signatures = v1.signatures.to_vec();
        signatures.push(decorated);
        v1.signatures = signatures
            .try_into()
            .map_err(|_| LedgerError::sign("too many signatures on envelope"))?;
        Ok(())
    }
}

impl std::fmt::Debug for DistributionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DistributionSigner({})", self.public_key)
    }
}

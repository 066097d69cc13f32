//! Stellar transaction construction.
//!
//! Builds single-operation v1 transactions (payment or change-trust), wraps
//! them in envelopes, and computes the network-bound transaction hash used
//! both for signing and as the submission id.

use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stellar_strkey::ed25519::{MuxedAccount as StrkeyMuxed, PublicKey};
use stellar_xdr::curr::{
    ChangeTrustOp, Hash, Limits, Memo, MuxedAccount, MuxedAccountMed25519, Operation,
    OperationBody, PaymentOp, Preconditions, ReadXdr, SequenceNumber, TimeBounds, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

use crate::asset::{Amount, RelayAsset};
use crate::error::LedgerError;

/// Base fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;
/// Validity window applied to every transaction.
pub const TX_TIMEOUT: Duration = Duration::from_secs(30);

/// `sha256(network passphrase)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkId(pub [u8; 32]);

impl NetworkId {
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(Sha256::digest(passphrase.as_bytes()).into())
    }
}

/// Source and sequence for a new transaction.
#[derive(Debug, Clone)]
pub struct TxParams {
    pub source: MuxedAccount,
    /// Current on-ledger sequence of `source`; the transaction uses the next one.
    pub account_sequence: i64,
    pub timeout: Duration,
}

impl TxParams {
    pub fn new(source: MuxedAccount, account_sequence: i64) -> Self {
        Self {
            source,
            account_sequence,
            timeout: TX_TIMEOUT,
        }
    }
}

/// Parse a `G…` or `M…` account into an XDR muxed account.
pub fn parse_account(address: &str) -> Result<MuxedAccount, String> {
    if let Ok(m) = StrkeyMuxed::from_string(address) {
        return Ok(MuxedAccount::MuxedEd25519(MuxedAccountMed25519 {
            id: m.id,
            ed25519: Uint256(m.ed25519),
        }));
    }
    let pk = PublicKey::from_string(address).map_err(|e| format!("invalid account {address:?}: {e}"))?;
    Ok(MuxedAccount::Ed25519(Uint256(pk.0)))
}

/// The `G…` account behind a possibly muxed address.
pub fn base_account_id(account: &MuxedAccount) -> String {
    match account {
        MuxedAccount::Ed25519(Uint256(bytes)) => PublicKey(*bytes).to_string(),
        MuxedAccount::MuxedEd25519(m) => PublicKey(m.ed25519.0).to_string(),
    }
}

/// Single payment of `asset` from `params.source` to `destination`.
pub fn payment(
    params: TxParams,
    destination: &str,
    asset: &RelayAsset,
    amount: Amount,
) -> Result<Transaction, LedgerError> {
    let destination = parse_account(destination).map_err(LedgerError::build)?;
    let op = OperationBody::Payment(PaymentOp {
        destination,
        asset: asset.to_xdr(),
        amount: amount.stroops(),
    });
    single_op(params, op)
}

/// Single change-trust for `asset` with the maximum limit.
pub fn change_trust(params: TxParams, asset: &RelayAsset) -> Result<Transaction, LedgerError> {
    let op = OperationBody::ChangeTrust(ChangeTrustOp {
        line: asset.to_change_trust(),
        limit: i64::MAX,
    });
    single_op(params, op)
}

fn single_op(params: TxParams, body: OperationBody) -> Result<Transaction, LedgerError> {
    let seq = params
        .account_sequence
        .checked_add(1)
        .ok_or_else(|| LedgerError::build("account sequence exhausted"))?;

    let operations: VecM<Operation, 100> = vec![Operation {
        source_account: None,
        body,
    }]
    .try_into()
    .map_err(|_| LedgerError::build("op count > 100"))?;

    Ok(Transaction {
        source_account: params.source,
        fee: BASE_FEE,
        seq_num: SequenceNumber(seq),
        cond: Preconditions::Time(time_bounds(params.timeout)),
        memo: Memo::None,
        operations,
        ext: TransactionExt::V0,
    })
}

fn time_bounds(timeout: Duration) -> TimeBounds {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    TimeBounds {
        min_time: TimePoint(0),
        max_time: TimePoint((now + timeout).as_secs()),
    }
}

/// Wrap an unsigned transaction.
pub fn envelope(tx: Transaction) -> TransactionEnvelope {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    })
}

/// Transaction hash: `sha256(TransactionSignaturePayload)`.
pub fn hash(tx: &Transaction, network_id: &NetworkId) -> Result<[u8; 32], LedgerError> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id.0),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload
        .to_xdr(Limits::none())
        .map_err(|e| LedgerError::build(format!("failed to serialize payload: {e}")))?;
    Ok(Sha256::digest(&bytes).into())
}

pub fn to_base64(envelope: &TransactionEnvelope) -> Result<String, LedgerError> {
    envelope
        .to_xdr_base64(Limits::none())
        .map_err(|e| LedgerError::build(format!("failed to encode envelope: {e}")))
}

pub fn from_base64(xdr: &str) -> Result<TransactionEnvelope, LedgerError> {
    TransactionEnvelope::from_xdr_base64(xdr, Limits::none())
        .map_err(|e| LedgerError::build(format!("invalid envelope XDR: {e}")))
}

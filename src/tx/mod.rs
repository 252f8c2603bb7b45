//! Transaction builder - unsigned payment envelopes
//!
//! `build` is pure given its inputs: it resolves the asset, forms the single
//! payment operation, attaches the memo when non-empty, and stamps the
//! account's next sequence number, the fixed network fee, and a bounded
//! validity window after which the network rejects the transaction instead of
//! leaving it pending. No network or signer calls happen here.

mod xdr;

use crate::address;
use crate::assets::{AssetId, AssetRegistry};
use crate::horizon::Account;
use chrono::{DateTime, Utc};
use xdr::XdrWriter;

/// Fee in stroops for a single-operation transaction.
pub const BASE_FEE: u32 = 100;
/// Seconds after which the network must reject the transaction.
pub const VALIDITY_WINDOW_SECS: u64 = 30;
/// Ledger amounts carry seven decimal places.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

const MAX_MEMO_BYTES: usize = 28;

// XDR discriminants for the envelope layout
const ENVELOPE_TYPE_TX: u32 = 2;
const KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const MEMO_TEXT: u32 = 1;
const OP_PAYMENT: u32 = 1;
const ASSET_NATIVE: u32 = 0;
const ASSET_ALPHANUM4: u32 = 1;
const ASSET_ALPHANUM12: u32 = 2;

/// A payment intent as issued by the caller. Immutable once constructed;
/// the memo bound is enforced here so an over-long memo never enters the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    destination: String,
    amount: String,
    asset: String,
    memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("memo exceeds {MAX_MEMO_BYTES} bytes")]
    MemoTooLong,
}

impl TransactionRequest {
    pub fn new(
        destination: impl Into<String>,
        amount: impl Into<String>,
        asset: impl Into<String>,
        memo: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let memo = memo.into();
        if memo.len() > MAX_MEMO_BYTES {
            return Err(RequestError::MemoTooLong);
        }
        Ok(Self {
            destination: destination.into(),
            amount: amount.into(),
            asset: asset.into(),
            memo,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }
}

/// Raw builder failures, translated at the session boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("asset {0} is not configured")]
    UnknownAsset(String),
    #[error("asset {0} has an undecodable issuer id")]
    InvalidIssuer(String),
    #[error("amount is not a positive decimal")]
    InvalidAmount,
    #[error("destination is not a valid account id")]
    InvalidDestination,
}

/// A fully-formed unsigned transaction, ready for the external signer. Raw
/// account keys are resolved at build time so envelope encoding cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub source: String,
    pub destination: String,
    pub asset: AssetId,
    pub amount: String,
    pub amount_stroops: i64,
    pub memo: Option<String>,
    pub sequence: i64,
    pub fee: u32,
    pub time_bounds: (u64, u64),
    source_key: [u8; 32],
    destination_key: [u8; 32],
    issuer_key: Option<[u8; 32]>,
}

/// Assemble an unsigned payment from a request plus current account state.
pub fn build(
    request: &TransactionRequest,
    account: &Account,
    registry: &AssetRegistry,
    fee: u32,
    validity_window_secs: u64,
    now: DateTime<Utc>,
) -> Result<UnsignedTransaction, BuildError> {
    let asset = registry
        .resolve(&request.asset)
        .ok_or_else(|| BuildError::UnknownAsset(request.asset.clone()))?;

    let issuer_key = match &asset {
        AssetId::Native => None,
        AssetId::Issued { code, issuer } => Some(
            address::decode_public_key(issuer)
                .ok_or_else(|| BuildError::InvalidIssuer(code.clone()))?,
        ),
    };

    let destination_key =
        address::decode_public_key(&request.destination).ok_or(BuildError::InvalidDestination)?;
    let source_key =
        address::decode_public_key(&account.public_key).ok_or(BuildError::InvalidDestination)?;

    let amount_stroops = parse_stroops(&request.amount).ok_or(BuildError::InvalidAmount)?;

    let min_time = now.timestamp().max(0) as u64;
    let max_time = min_time + validity_window_secs;

    Ok(UnsignedTransaction {
        source: account.public_key.clone(),
        destination: request.destination.clone(),
        asset,
        amount: request.amount.clone(),
        amount_stroops,
        memo: if request.memo.is_empty() {
            None
        } else {
            Some(request.memo.clone())
        },
        // The ledger consumes the account's next sequence number
        sequence: account.sequence + 1,
        fee,
        time_bounds: (min_time, max_time),
        source_key,
        destination_key,
        issuer_key,
    })
}

impl UnsignedTransaction {
    /// Ledger-native serialization of the envelope with an empty signature
    /// list, base64-encoded. This string is what crosses to the signer.
    pub fn envelope_xdr(&self) -> String {
        let mut w = XdrWriter::new();
        w.put_u32(ENVELOPE_TYPE_TX);

        // Transaction v1
        w.put_u32(KEY_TYPE_ED25519);
        w.put_opaque(&self.source_key);
        w.put_u32(self.fee);
        w.put_i64(self.sequence);

        // Preconditions: the validity window
        w.put_u32(PRECOND_TIME);
        w.put_u64(self.time_bounds.0);
        w.put_u64(self.time_bounds.1);

        match &self.memo {
            None => w.put_u32(MEMO_NONE),
            Some(text) => {
                w.put_u32(MEMO_TEXT);
                w.put_string(text);
            }
        }

        // Single payment operation, no per-op source override
        w.put_u32(1);
        w.put_u32(0);
        w.put_u32(OP_PAYMENT);
        w.put_u32(KEY_TYPE_ED25519);
        w.put_opaque(&self.destination_key);
        self.encode_asset(&mut w);
        w.put_i64(self.amount_stroops);

        // Transaction ext, then the empty signature list
        w.put_u32(0);
        w.put_u32(0);

        w.to_base64()
    }

    fn encode_asset(&self, w: &mut XdrWriter) {
        match (&self.asset, &self.issuer_key) {
            (AssetId::Native, _) => w.put_u32(ASSET_NATIVE),
            (AssetId::Issued { code, .. }, Some(issuer)) => {
                let mut padded = [0u8; 12];
                let bytes = code.as_bytes();
                let width = if bytes.len() <= 4 { 4 } else { 12 };
                padded[..bytes.len()].copy_from_slice(bytes);
                w.put_u32(if width == 4 {
                    ASSET_ALPHANUM4
                } else {
                    ASSET_ALPHANUM12
                });
                w.put_opaque(&padded[..width]);
                w.put_u32(KEY_TYPE_ED25519);
                w.put_opaque(issuer);
            }
            // Unreachable: build resolves the issuer key for issued assets
            (AssetId::Issued { .. }, None) => w.put_u32(ASSET_NATIVE),
        }
    }
}

/// Convert a decimal amount string to stroops by exact string arithmetic.
/// Rejects empty, signed, malformed, zero, a trailing decimal point,
/// >7 decimal places, and overflow.
pub fn parse_stroops(amount: &str) -> Option<i64> {
    let (int_part, frac_part) = match amount.split_once('.') {
        Some((_, "")) => return None,
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    if frac_part.len() > 7 {
        return None;
    }

    let mut value: i64 = 0;
    for b in int_part.bytes() {
        value = value
            .checked_mul(10)?
            .checked_add(i64::from(b - b'0'))?;
    }
    value = value.checked_mul(STROOPS_PER_UNIT)?;

    let mut frac: i64 = 0;
    for b in frac_part.bytes() {
        frac = frac * 10 + i64::from(b - b'0');
    }
    for _ in 0..(7 - frac_part.len()) {
        frac *= 10;
    }
    value = value.checked_add(frac)?;

    if value > 0 {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::Account;
    use chrono::TimeZone;

    const SOURCE: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";
    const DEST: &str = "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX";

    fn account() -> Account {
        Account {
            public_key: SOURCE.into(),
            sequence: 41,
            balances: vec![],
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    #[test]
    fn stroop_parsing_is_exact() {
        assert_eq!(parse_stroops("10"), Some(100_000_000));
        assert_eq!(parse_stroops("0.0000001"), Some(1));
        assert_eq!(parse_stroops("100.0000000"), Some(1_000_000_000));
        assert_eq!(parse_stroops("1.5"), Some(15_000_000));
    }

    #[test]
    fn stroop_parsing_rejects_bad_input() {
        let bad = [
            "", ".", "1.", "10.", "-1", "+1", "0", "0.0", "1.00000001", "1e3", "1.2.3", "abc",
            " 1",
        ];
        for input in bad {
            assert_eq!(parse_stroops(input), None, "accepted {:?}", input);
        }
    }

    #[test]
    fn memo_bound_enforced_at_construction() {
        assert!(TransactionRequest::new(DEST, "1", "XLM", "x".repeat(28)).is_ok());
        assert_eq!(
            TransactionRequest::new(DEST, "1", "XLM", "x".repeat(29)),
            Err(RequestError::MemoTooLong)
        );
    }

    #[test]
    fn build_stamps_next_sequence_fee_and_window() {
        let request = TransactionRequest::new(DEST, "10", "XLM", "test").expect("request");
        let registry = AssetRegistry::testnet();
        let tx = build(&request, &account(), &registry, BASE_FEE, VALIDITY_WINDOW_SECS, at(1_000))
            .expect("build");
        assert_eq!(tx.sequence, 42);
        assert_eq!(tx.fee, 100);
        assert_eq!(tx.time_bounds, (1_000, 1_030));
        assert_eq!(tx.amount_stroops, 100_000_000);
        assert_eq!(tx.asset, AssetId::Native);
    }

    #[test]
    fn empty_memo_is_omitted_not_encoded() {
        let registry = AssetRegistry::testnet();
        let with = TransactionRequest::new(DEST, "1", "XLM", "hi").expect("request");
        let without = TransactionRequest::new(DEST, "1", "XLM", "").expect("request");
        let built_with = build(&with, &account(), &registry, BASE_FEE, 30, at(0)).expect("build");
        let built_without =
            build(&without, &account(), &registry, BASE_FEE, 30, at(0)).expect("build");
        assert_eq!(built_with.memo.as_deref(), Some("hi"));
        assert_eq!(built_without.memo, None);
        assert_ne!(built_with.envelope_xdr(), built_without.envelope_xdr());
    }

    #[test]
    fn unknown_asset_fails_before_anything_else() {
        let request = TransactionRequest::new(DEST, "1", "DOGE", "").expect("request");
        assert_eq!(
            build(&request, &account(), &AssetRegistry::testnet(), BASE_FEE, 30, at(0)),
            Err(BuildError::UnknownAsset("DOGE".into()))
        );
    }

    #[test]
    fn issued_assets_resolve_their_issuer_keys_at_build() {
        let registry = AssetRegistry::testnet();
        for code in ["USDC", "MXN"] {
            let request = TransactionRequest::new(DEST, "1", code, "").expect("request");
            let tx = build(&request, &account(), &registry, BASE_FEE, 30, at(0))
                .unwrap_or_else(|e| panic!("{} failed to build: {}", code, e));
            assert!(matches!(tx.asset, AssetId::Issued { .. }));
            assert!(tx.envelope_xdr().len() > 4);
        }
    }

    #[test]
    fn build_is_deterministic_given_inputs() {
        let request = TransactionRequest::new(DEST, "2.5", "USDC", "memo").expect("request");
        let registry = AssetRegistry::testnet();
        let a = build(&request, &account(), &registry, BASE_FEE, 30, at(500)).expect("build");
        let b = build(&request, &account(), &registry, BASE_FEE, 30, at(500)).expect("build");
        assert_eq!(a.envelope_xdr(), b.envelope_xdr());

        let later = build(&request, &account(), &registry, BASE_FEE, 30, at(501)).expect("build");
        assert_ne!(a.envelope_xdr(), later.envelope_xdr());
    }

    #[test]
    fn envelope_is_valid_base64_with_no_signatures() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let request = TransactionRequest::new(DEST, "1", "XLM", "").expect("request");
        let tx = build(&request, &account(), &AssetRegistry::testnet(), BASE_FEE, 30, at(0))
            .expect("build");
        let bytes = STANDARD.decode(tx.envelope_xdr()).expect("base64");
        // Envelope discriminant, then the v1 transaction body
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        // Empty signature list terminates the envelope
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }
}

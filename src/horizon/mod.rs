//! Ledger boundary - account state and transaction submission
//!
//! `LedgerClient` is the seam the session depends on; `HorizonClient` is the
//! HTTP implementation against a Horizon server. Tests substitute fakes.
//!
//! The client never retries. Resubmitting an already-included transaction is
//! reported as a terminal rejection; any retry policy belongs to a caller
//! that reconciles sequence numbers first.

mod client;

pub use client::HorizonClient;

use crate::assets::AssetId;
use crate::signer::SignedPayload;
use async_trait::async_trait;

/// One asset's balance, amount kept as the exact decimal string the ledger
/// reports. Never converted to floating point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBalance {
    pub asset: AssetId,
    pub amount: String,
}

/// Account state as of the last load. Owned by the session and replaced
/// wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub public_key: String,
    pub sequence: i64,
    pub balances: Vec<AssetBalance>,
}

impl Account {
    /// Cached balance for an asset; `None` when the account holds no
    /// trustline for it.
    pub fn balance_for(&self, asset: &AssetId) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| &b.asset == asset)
            .map(|b| b.amount.as_str())
    }
}

/// Raw ledger-layer failures. "Account not found" is a first-class, expected
/// outcome on a test network, distinct from transport faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account not found on the network")]
    NotFound,
    #[error("ledger transport error: {0}")]
    Transport(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Network client the session orchestrates. Implementations must not retry
/// on their own.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch current sequence number and balances.
    async fn load_account(&self, public_key: &str) -> Result<Account, LedgerError>;

    /// Submit a signed envelope. Returns the transaction content hash on
    /// acceptance; rejection carries the network's reason verbatim.
    async fn submit(&self, payload: &SignedPayload) -> Result<String, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_lookup_by_asset_identity() {
        let account = Account {
            public_key: "GTEST".into(),
            sequence: 7,
            balances: vec![
                AssetBalance {
                    asset: AssetId::Native,
                    amount: "100.0000000".into(),
                },
                AssetBalance {
                    asset: AssetId::Issued {
                        code: "USDC".into(),
                        issuer: "GISSUER".into(),
                    },
                    amount: "12.5000000".into(),
                },
            ],
        };
        assert_eq!(account.balance_for(&AssetId::Native), Some("100.0000000"));
        let other_issuer = AssetId::Issued {
            code: "USDC".into(),
            issuer: "GOTHER".into(),
        };
        // Same code under a different issuer is a different asset
        assert_eq!(account.balance_for(&other_issuer), None);
    }
}

//! Asset registry - the closed, load-time-configured set of tradeable assets
//!
//! Lookups outside the configured set fail rather than silently defaulting.
//! The registry is read-only; it is shared without locking.

use crate::address;
use serde::{Deserialize, Serialize};

/// Identity of an asset on the ledger. The native asset has no issuer;
/// every issued asset carries a non-empty issuer account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetId {
    Native,
    Issued { code: String, issuer: String },
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }
}

/// Display metadata for one configured asset. `issuer: None` marks the
/// native asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub code: String,
    pub issuer: Option<String>,
    pub name: String,
    pub decimals: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("asset {0} has an empty issuer")]
    EmptyIssuer(String),
    #[error("asset {0} has a structurally invalid issuer id")]
    InvalidIssuer(String),
    #[error("asset code {0:?} is not 1 to 12 bytes")]
    InvalidCode(String),
    #[error("asset code {0} configured twice")]
    DuplicateCode(String),
}

/// Static lookup table over the configured assets.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: Vec<AssetConfig>,
}

impl AssetRegistry {
    /// Build a registry from load-time configuration. A misconfigured table
    /// is rejected here rather than at payment time: codes must fit the
    /// ledger's 1..=12-byte alphanum encoding, and every issuer must be a
    /// structurally valid account id.
    pub fn new(assets: Vec<AssetConfig>) -> Result<Self, RegistryError> {
        for (i, asset) in assets.iter().enumerate() {
            if asset.code.is_empty() || asset.code.len() > 12 {
                return Err(RegistryError::InvalidCode(asset.code.clone()));
            }
            match asset.issuer.as_deref() {
                Some("") => return Err(RegistryError::EmptyIssuer(asset.code.clone())),
                Some(issuer) if !address::is_valid(issuer) => {
                    return Err(RegistryError::InvalidIssuer(asset.code.clone()));
                }
                _ => {}
            }
            if assets[..i].iter().any(|a| a.code == asset.code) {
                return Err(RegistryError::DuplicateCode(asset.code.clone()));
            }
        }
        Ok(Self { assets })
    }

    /// The testnet asset set: native lumens plus the two anchored assets.
    pub fn testnet() -> Self {
        Self {
            assets: vec![
                AssetConfig {
                    code: "XLM".into(),
                    issuer: None,
                    name: "Stellar Lumens".into(),
                    decimals: 7,
                },
                AssetConfig {
                    code: "USDC".into(),
                    issuer: Some("GBBD47IF6LXCC7EDU6DY4F4BBW52DQODQERRBGHQKBM6Y6TDE2TCAIMF".into()),
                    name: "USD Coin".into(),
                    decimals: 7,
                },
                AssetConfig {
                    code: "MXN".into(),
                    issuer: Some("GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI".into()),
                    name: "Mexican Peso".into(),
                    decimals: 7,
                },
            ],
        }
    }

    /// Resolve an asset code to its ledger identity. `None` when the code is
    /// not in the configured set.
    pub fn resolve(&self, code: &str) -> Option<AssetId> {
        self.assets.iter().find(|a| a.code == code).map(|a| match &a.issuer {
            None => AssetId::Native,
            Some(issuer) => AssetId::Issued {
                code: a.code.clone(),
                issuer: issuer.clone(),
            },
        })
    }

    pub fn get(&self, code: &str) -> Option<&AssetConfig> {
        self.assets.iter().find(|a| a.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.code.as_str())
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::testnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_native_and_issued() {
        let registry = AssetRegistry::testnet();
        assert_eq!(registry.resolve("XLM"), Some(AssetId::Native));
        match registry.resolve("USDC") {
            Some(AssetId::Issued { code, issuer }) => {
                assert_eq!(code, "USDC");
                assert!(!issuer.is_empty());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_code_is_rejected_not_defaulted() {
        let registry = AssetRegistry::testnet();
        assert_eq!(registry.resolve("DOGE"), None);
        assert_eq!(registry.resolve(""), None);
        assert_eq!(registry.resolve("xlm"), None);
    }

    #[test]
    fn testnet_table_passes_its_own_load_checks() {
        // Every shipped issuer must decode; a table entry that cannot build
        // a payment is worse than no entry at all
        let registry = AssetRegistry::testnet();
        for code in ["XLM", "USDC", "MXN"] {
            let asset = registry.get(code).expect("configured");
            if let Some(issuer) = &asset.issuer {
                assert!(address::is_valid(issuer), "issuer of {} is malformed", code);
            }
        }
        AssetRegistry::new(registry.assets.clone()).expect("table revalidates");
    }

    #[test]
    fn structurally_invalid_issuer_rejected_at_load() {
        let result = AssetRegistry::new(vec![AssetConfig {
            code: "MXN".into(),
            issuer: Some("GDMGQBDB2F5BX4RYF2QJ7QY3Q5XJ6Q5XJ6Q5XJ6Q5XJ6".into()),
            name: "Mexican Peso".into(),
            decimals: 7,
        }]);
        assert!(matches!(result, Err(RegistryError::InvalidIssuer(_))));
    }

    #[test]
    fn oversized_and_empty_codes_rejected_at_load() {
        for code in ["", "THIRTEENCHARS"] {
            let result = AssetRegistry::new(vec![AssetConfig {
                code: code.into(),
                issuer: None,
                name: "Bad".into(),
                decimals: 7,
            }]);
            assert!(matches!(result, Err(RegistryError::InvalidCode(_))), "accepted {:?}", code);
        }
    }

    #[test]
    fn empty_issuer_rejected_at_load() {
        let result = AssetRegistry::new(vec![AssetConfig {
            code: "BAD".into(),
            issuer: Some("".into()),
            name: "Bad".into(),
            decimals: 7,
        }]);
        assert!(matches!(result, Err(RegistryError::EmptyIssuer(_))));
    }

    #[test]
    fn duplicate_code_rejected_at_load() {
        let asset = AssetConfig {
            code: "DUP".into(),
            issuer: None,
            name: "Dup".into(),
            decimals: 7,
        };
        let result = AssetRegistry::new(vec![asset.clone(), asset]);
        assert!(matches!(result, Err(RegistryError::DuplicateCode(_))));
    }
}

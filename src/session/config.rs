//! Network configuration - load-time, not runtime-mutable

use crate::tx;

const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
const PUBLIC_HORIZON_URL: &str = "https://horizon.stellar.org";
const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Ledger endpoint and transaction constants. Constructed once at load time.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub horizon_url: String,
    pub network_passphrase: String,
    pub base_fee: u32,
    pub tx_validity_window_secs: u64,
}

impl NetworkConfig {
    pub fn testnet() -> Self {
        Self {
            horizon_url: TESTNET_HORIZON_URL.into(),
            network_passphrase: TESTNET_PASSPHRASE.into(),
            base_fee: tx::BASE_FEE,
            tx_validity_window_secs: tx::VALIDITY_WINDOW_SECS,
        }
    }

    pub fn public() -> Self {
        Self {
            horizon_url: PUBLIC_HORIZON_URL.into(),
            network_passphrase: PUBLIC_PASSPHRASE.into(),
            base_fee: tx::BASE_FEE,
            tx_validity_window_secs: tx::VALIDITY_WINDOW_SECS,
        }
    }

    pub fn with_horizon_url(mut self, url: impl Into<String>) -> Self {
        self.horizon_url = url.into();
        self
    }

    pub fn with_base_fee(mut self, fee: u32) -> Self {
        self.base_fee = fee;
        self
    }

    pub fn with_validity_window(mut self, secs: u64) -> Self {
        self.tx_validity_window_secs = secs;
        self
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.horizon_url, TESTNET_HORIZON_URL);
        assert_eq!(config.base_fee, 100);
        assert_eq!(config.tx_validity_window_secs, 30);
    }

    #[test]
    fn builder_setters_override() {
        let config = NetworkConfig::testnet()
            .with_horizon_url("http://localhost:8000")
            .with_base_fee(200)
            .with_validity_window(60);
        assert_eq!(config.horizon_url, "http://localhost:8000");
        assert_eq!(config.base_fee, 200);
        assert_eq!(config.tx_validity_window_secs, 60);
    }
}

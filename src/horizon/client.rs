//! HorizonClient - HTTP implementation of the ledger boundary

use super::{Account, AssetBalance, LedgerClient, LedgerError};
use crate::assets::AssetId;
use crate::signer::SignedPayload;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HorizonClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LedgerError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { inner, base_url })
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, public_key: &str) -> Result<Account, LedgerError> {
        let url = format!("{}/accounts/{}", self.base_url, public_key);
        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound);
        }
        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "HTTP status {} loading account",
                response.status()
            )));
        }

        let raw: HorizonAccount = response
            .json()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let sequence = raw
            .sequence
            .parse::<i64>()
            .map_err(|e| LedgerError::Transport(format!("bad sequence: {}", e)))?;

        Ok(Account {
            public_key: public_key.to_string(),
            sequence,
            balances: raw.balances.into_iter().map(HorizonBalance::into_balance).collect(),
        })
    }

    async fn submit(&self, payload: &SignedPayload) -> Result<String, LedgerError> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .inner
            .post(&url)
            .form(&[("tx", payload.as_str())])
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let ok: SubmitOk = response
                .json()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?;
            return Ok(ok.hash);
        }

        // Horizon reports rejection detail in a problem document; surface the
        // result codes verbatim for the translator.
        let problem: Result<HorizonProblem, _> = response.json().await;
        match problem {
            Ok(p) => Err(LedgerError::Rejected(p.rejection_reason())),
            Err(_) => Err(LedgerError::Transport(format!(
                "HTTP status {} submitting transaction",
                status
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HorizonAccount {
    sequence: String,
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

#[derive(Debug, Deserialize)]
struct HorizonBalance {
    balance: String,
    asset_type: String,
    #[serde(default)]
    asset_code: Option<String>,
    #[serde(default)]
    asset_issuer: Option<String>,
}

impl HorizonBalance {
    fn into_balance(self) -> AssetBalance {
        let asset = if self.asset_type == "native" {
            AssetId::Native
        } else {
            AssetId::Issued {
                code: self.asset_code.unwrap_or_default(),
                issuer: self.asset_issuer.unwrap_or_default(),
            }
        };
        AssetBalance {
            asset,
            amount: self.balance,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitOk {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct HorizonProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Option<Vec<String>>,
}

impl HorizonProblem {
    fn rejection_reason(&self) -> String {
        if let Some(codes) = self.extras.as_ref().and_then(|e| e.result_codes.as_ref()) {
            let mut parts = Vec::new();
            if let Some(tx) = &codes.transaction {
                parts.push(tx.clone());
            }
            if let Some(ops) = &codes.operations {
                parts.extend(ops.iter().cloned());
            }
            if !parts.is_empty() {
                return parts.join(", ");
            }
        }
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "transaction failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reason_prefers_result_codes() {
        let problem: HorizonProblem = serde_json::from_value(serde_json::json!({
            "title": "Transaction Failed",
            "detail": "The transaction failed when submitted to the network.",
            "extras": {
                "result_codes": {
                    "transaction": "tx_failed",
                    "operations": ["op_underfunded"]
                }
            }
        }))
        .expect("problem document");
        assert_eq!(problem.rejection_reason(), "tx_failed, op_underfunded");
    }

    #[test]
    fn rejection_reason_falls_back_to_detail_then_title() {
        let problem: HorizonProblem = serde_json::from_value(serde_json::json!({
            "title": "Bad Request",
            "detail": "malformed envelope"
        }))
        .expect("problem document");
        assert_eq!(problem.rejection_reason(), "malformed envelope");

        let bare: HorizonProblem =
            serde_json::from_value(serde_json::json!({"title": "Bad Request"})).expect("problem");
        assert_eq!(bare.rejection_reason(), "Bad Request");
    }

    #[test]
    fn balance_mapping_distinguishes_native() {
        let raw: HorizonBalance = serde_json::from_value(serde_json::json!({
            "balance": "100.0000000",
            "asset_type": "native"
        }))
        .expect("balance");
        let mapped = raw.into_balance();
        assert_eq!(mapped.asset, AssetId::Native);
        assert_eq!(mapped.amount, "100.0000000");

        let issued: HorizonBalance = serde_json::from_value(serde_json::json!({
            "balance": "5.0000000",
            "asset_type": "credit_alphanum4",
            "asset_code": "USDC",
            "asset_issuer": "GISSUER"
        }))
        .expect("balance");
        assert!(matches!(issued.into_balance().asset, AssetId::Issued { .. }));
    }
}

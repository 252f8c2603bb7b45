//! External signer boundary - normalization of the signing agent's replies
//!
//! The signing agent is user-controlled and outside this system: its
//! presence, permission state, and response shape all vary by version. The
//! adapter is the single place that absorbs that skew. Every other component
//! sees only the canonical `SignedPayload`.
//!
//! Reply probing runs in fixed priority order: an explicit error field fails
//! the call; a bare string is the payload; otherwise one of the known field
//! names (`signedTxXdr`, `signedTransaction`, `xdr`) holds it; anything else
//! is an unrecognized shape.

use async_trait::async_trait;
use serde_json::Value;

/// Canonical signed-transaction envelope. The only type crossing into
/// `LedgerClient::submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload(String);

impl SignedPayload {
    pub fn new(envelope_xdr: impl Into<String>) -> Self {
        Self(envelope_xdr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw signer-layer failures. Agent absence, user refusal, and agent error
/// are distinct because each drives a different UI path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("signing agent not present in this context")]
    NotAvailable,
    #[error("user rejected the connection request")]
    ConnectionRejected,
    #[error("connection to signing agent failed: {0}")]
    ConnectionFailed(String),
    #[error("user rejected the signing request")]
    SigningRejected,
    #[error("signing agent failed: {0}")]
    SigningFailed(String),
    #[error("unrecognized signer response shape: {0}")]
    UnrecognizedResponse(String),
}

/// The external signing agent as it actually behaves: raw, variably-shaped
/// JSON replies. `Err` is a transport-level fault reaching the agent at all.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    /// Whether the agent is present in the current runtime context at all,
    /// distinct from whether the user has granted access.
    async fn is_available(&self) -> bool;

    /// Ask the agent for access; replies `{address}` or `{error}`.
    async fn request_connection(&self) -> anyhow::Result<Value>;

    /// Ask the agent to sign; replies a bare envelope string, an object
    /// carrying it under one of several field names, or `{error}`.
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
        account_to_sign: &str,
    ) -> anyhow::Result<Value>;
}

/// Bridges the session to the agent, classifying failures and normalizing
/// reply shapes into `SignedPayload`.
pub struct ExternalSignerAdapter {
    agent: Box<dyn SigningAgent>,
}

impl ExternalSignerAdapter {
    pub fn new(agent: Box<dyn SigningAgent>) -> Self {
        Self { agent }
    }

    pub async fn is_available(&self) -> bool {
        self.agent.is_available().await
    }

    /// Request access and return the granted public key.
    pub async fn request_connection(&self) -> Result<String, SignerError> {
        if !self.agent.is_available().await {
            return Err(SignerError::NotAvailable);
        }
        let reply = self
            .agent
            .request_connection()
            .await
            .map_err(|e| SignerError::ConnectionFailed(e.to_string()))?;

        if let Some(message) = error_text(&reply) {
            return Err(if looks_like_user_rejection(&message) {
                SignerError::ConnectionRejected
            } else {
                SignerError::ConnectionFailed(message)
            });
        }

        match reply.get("address").and_then(Value::as_str) {
            Some(address) if !address.is_empty() => Ok(address.to_string()),
            _ => Err(SignerError::ConnectionFailed(
                "no address in signer reply".to_string(),
            )),
        }
    }

    /// Hand the unsigned envelope to the agent and normalize its reply.
    pub async fn sign(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
        account_to_sign: &str,
    ) -> Result<SignedPayload, SignerError> {
        let reply = self
            .agent
            .sign_transaction(envelope_xdr, network_passphrase, account_to_sign)
            .await
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;
        normalize_sign_reply(&reply)
    }
}

/// The normalization algorithm, exposed for direct testing. Probes the reply
/// in fixed priority order and yields the canonical payload.
pub fn normalize_sign_reply(reply: &Value) -> Result<SignedPayload, SignerError> {
    if let Some(message) = error_text(reply) {
        return Err(if looks_like_user_rejection(&message) {
            SignerError::SigningRejected
        } else {
            SignerError::SigningFailed(message)
        });
    }

    if let Value::String(envelope) = reply {
        return Ok(SignedPayload::new(envelope.clone()));
    }

    for field in ["signedTxXdr", "signedTransaction", "xdr"] {
        if let Some(envelope) = reply.get(field).and_then(Value::as_str) {
            return Ok(SignedPayload::new(envelope));
        }
    }

    Err(SignerError::UnrecognizedResponse(summarize(reply)))
}

/// Extract the agent's error text; the field may be a string or an object
/// with a message.
fn error_text(reply: &Value) -> Option<String> {
    let error = reply.get("error")?;
    match error {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

fn looks_like_user_rejection(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("reject") || lower.contains("declin") || lower.contains("denied")
}

fn summarize(reply: &Value) -> String {
    match reply {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with fields [{}]", keys.join(", "))
        }
        other => format!("{} value", value_kind(other)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

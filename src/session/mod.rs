//! WalletSession - the orchestrating state machine
//!
//! Owns the connection lifecycle, the at-most-one in-flight transaction
//! invariant, and the balance cache. Collaborators (signer adapter, ledger
//! client, asset registry) are injected so tests substitute fakes.
//!
//! # Concurrency
//!
//! Operations are async and may interleave at suspension points, but all
//! session state lives behind one mutex that is never held across an await.
//! `send_payment` claims the pending slot under a single lock acquisition
//! before its first suspension point and releases it in a finalization step
//! after the last, so a second call issued while the first is suspended
//! observes the flag and is rejected rather than racing a stale sequence
//! number.
//!
//! No operation has a cancel primitive: a submission that left the adapter
//! runs to completion on the network, and `disconnect` only resets local
//! bookkeeping.

mod config;

pub use config::NetworkConfig;

use crate::address;
use crate::assets::AssetRegistry;
use crate::error::{translate, ErrorKind};
use crate::horizon::{Account, HorizonClient, LedgerClient, LedgerError};
use crate::signer::{ExternalSignerAdapter, SigningAgent};
use crate::tx::{self, TransactionRequest};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Connection phase plus everything that only exists while connected. A
/// pending transaction without a connection is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected {
        public_key: String,
        account: Option<Account>,
        pending: bool,
    },
}

/// Terminal result of one payment attempt. Exactly one of `hash`/`error` is
/// set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub success: bool,
    pub hash: Option<String>,
    pub error: Option<ErrorKind>,
}

impl TransactionOutcome {
    pub fn succeeded(hash: impl Into<String>) -> Self {
        Self {
            success: true,
            hash: Some(hash.into()),
            error: None,
        }
    }

    pub fn failed(error: ErrorKind) -> Self {
        Self {
            success: false,
            hash: None,
            error: Some(error),
        }
    }
}

/// Read-only view of session state for the consumer boundary.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub is_connected: bool,
    pub is_connecting: bool,
    pub public_key: Option<String>,
    pub account: Option<Account>,
    pub is_transaction_pending: bool,
    pub last_transaction: Option<TransactionOutcome>,
    pub error: Option<ErrorKind>,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    last_outcome: Option<TransactionOutcome>,
    error: Option<ErrorKind>,
    // Bumped by disconnect so work claimed under an earlier connection
    // cannot finalize into a successor session, even under the same key
    generation: u64,
}

pub struct WalletSession {
    inner: Mutex<SessionInner>,
    signer: ExternalSignerAdapter,
    ledger: Arc<dyn LedgerClient>,
    registry: AssetRegistry,
    config: NetworkConfig,
}

impl WalletSession {
    pub fn new(
        agent: Box<dyn SigningAgent>,
        ledger: Arc<dyn LedgerClient>,
        registry: AssetRegistry,
        config: NetworkConfig,
    ) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: SessionState::Disconnected,
                last_outcome: None,
                error: None,
                generation: 0,
            }),
            signer: ExternalSignerAdapter::new(agent),
            ledger,
            registry,
            config,
        }
    }

    /// Convenience constructor wiring a real Horizon client from the config.
    pub fn over_horizon(
        agent: Box<dyn SigningAgent>,
        registry: AssetRegistry,
        config: NetworkConfig,
    ) -> Result<Self, LedgerError> {
        let ledger = Arc::new(HorizonClient::new(config.horizon_url.clone())?);
        Ok(Self::new(agent, ledger, registry, config))
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Establish a connection: request access from the signing agent, then
    /// load the account. No-op when already connected. A signer failure
    /// returns the session to `Disconnected` with nothing half-set; an
    /// account-load failure still yields `Connected` and surfaces the load
    /// error separately.
    pub async fn connect(&self) -> Result<(), ErrorKind> {
        {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Connected { .. } | SessionState::Connecting => return Ok(()),
                SessionState::Disconnected => {
                    inner.state = SessionState::Connecting;
                    inner.error = None;
                }
            }
        }

        let public_key = match self.signer.request_connection().await {
            Ok(pk) => pk,
            Err(err) => {
                let kind = translate(err.into());
                let mut inner = self.lock();
                inner.state = SessionState::Disconnected;
                inner.error = Some(kind.clone());
                return Err(kind);
            }
        };

        let (account, load_error) = match self.ledger.load_account(&public_key).await {
            Ok(account) => (Some(account), None),
            Err(err) => (None, Some(translate(err.into()))),
        };

        let mut inner = self.lock();
        // A disconnect issued while we were suspended wins
        if !matches!(inner.state, SessionState::Connecting) {
            return Ok(());
        }
        tracing::info!(public_key = %public_key, "wallet connected");
        inner.state = SessionState::Connected {
            public_key,
            account,
            pending: false,
        };
        if let Some(kind) = load_error {
            tracing::warn!(error = %kind, "account load failed after connect");
            inner.error = Some(kind);
        }
        Ok(())
    }

    /// Unconditional reset to `Disconnected`. Safe at any time; an in-flight
    /// submission still resolves on the network but its bookkeeping here is
    /// abandoned.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.state = SessionState::Disconnected;
        inner.last_outcome = None;
        inner.error = None;
        inner.generation = inner.generation.wrapping_add(1);
    }

    /// Execute one payment: validate, claim the pending slot, load fresh
    /// account state, build, sign, submit. The pending flag is cleared and
    /// the cached balance refreshed regardless of outcome.
    pub async fn send_payment(&self, request: &TransactionRequest) -> TransactionOutcome {
        // Validation and the pending-slot claim happen under one lock
        // acquisition, before any suspension point.
        let (public_key, generation) = {
            let inner = &mut *self.lock();
            let generation = inner.generation;
            let claim = match &mut inner.state {
                SessionState::Connected {
                    public_key,
                    pending,
                    ..
                } => {
                    if !address::is_valid(request.destination()) {
                        Err(ErrorKind::InvalidDestination)
                    } else if tx::parse_stroops(request.amount()).is_none() {
                        Err(ErrorKind::InvalidAmount)
                    } else if self.registry.resolve(request.asset()).is_none() {
                        Err(ErrorKind::UnknownAsset(request.asset().to_string()))
                    } else if *pending {
                        Err(ErrorKind::TransactionAlreadyPending)
                    } else {
                        *pending = true;
                        Ok(public_key.clone())
                    }
                }
                _ => Err(not_connected()),
            };
            match claim {
                Ok(pk) => {
                    inner.error = None;
                    (pk, generation)
                }
                Err(kind) => {
                    // Synchronous rejection: no partial work, no state change
                    inner.error = Some(kind.clone());
                    return TransactionOutcome::failed(kind);
                }
            }
        };

        let outcome = match self.run_payment(&public_key, request).await {
            Ok(hash) => TransactionOutcome::succeeded(hash),
            Err(kind) => TransactionOutcome::failed(kind),
        };

        // Refresh the balance cache regardless of outcome, then finalize.
        let refreshed = match self.ledger.load_account(&public_key).await {
            Ok(account) => Some(account),
            Err(err) => {
                tracing::warn!(error = %err, "balance refresh after payment failed");
                None
            }
        };

        // Finalize only into the session that claimed the slot; disconnect
        // bumps the generation, so a successor session (same key or not)
        // never inherits abandoned bookkeeping
        let inner = &mut *self.lock();
        if inner.generation == generation {
            if let SessionState::Connected {
                account, pending, ..
            } = &mut inner.state
            {
                *pending = false;
                if let Some(fresh) = refreshed {
                    *account = Some(fresh);
                }
                inner.last_outcome = Some(outcome.clone());
                if let Some(kind) = &outcome.error {
                    inner.error = Some(kind.clone());
                }
            }
        }
        outcome
    }

    async fn run_payment(
        &self,
        public_key: &str,
        request: &TransactionRequest,
    ) -> Result<String, ErrorKind> {
        let account = self
            .ledger
            .load_account(public_key)
            .await
            .map_err(|e| translate(e.into()))?;
        let unsigned = tx::build(
            request,
            &account,
            &self.registry,
            self.config.base_fee,
            self.config.tx_validity_window_secs,
            Utc::now(),
        )
        .map_err(|e| translate(e.into()))?;
        let payload = self
            .signer
            .sign(
                &unsigned.envelope_xdr(),
                &self.config.network_passphrase,
                public_key,
            )
            .await
            .map_err(|e| translate(e.into()))?;
        let hash = self
            .ledger
            .submit(&payload)
            .await
            .map_err(|e| translate(e.into()))?;
        tracing::info!(%hash, destination = request.destination(), "payment submitted");
        Ok(hash)
    }

    /// Cached balance for an asset from the last loaded account. Eventually
    /// consistent with the last completed refresh; no network round-trip.
    pub fn get_balance(&self, asset_code: &str) -> Result<String, ErrorKind> {
        let inner = self.lock();
        let SessionState::Connected { account, .. } = &inner.state else {
            return Err(not_connected());
        };
        let asset = self
            .registry
            .resolve(asset_code)
            .ok_or_else(|| ErrorKind::UnknownAsset(asset_code.to_string()))?;
        let account = account.as_ref().ok_or(ErrorKind::AccountNotFound)?;
        Ok(account.balance_for(&asset).unwrap_or("0").to_string())
    }

    /// Reload the account and replace the cache wholesale.
    pub async fn refresh_account(&self) -> Result<(), ErrorKind> {
        let (public_key, generation) = {
            let inner = self.lock();
            match &inner.state {
                SessionState::Connected { public_key, .. } => {
                    (public_key.clone(), inner.generation)
                }
                _ => return Err(not_connected()),
            }
        };
        match self.ledger.load_account(&public_key).await {
            Ok(fresh) => {
                let mut inner = self.lock();
                if inner.generation == generation {
                    if let SessionState::Connected { account, .. } = &mut inner.state {
                        *account = Some(fresh);
                    }
                }
                Ok(())
            }
            Err(err) => {
                let kind = translate(err.into());
                let mut inner = self.lock();
                if inner.generation == generation {
                    inner.error = Some(kind.clone());
                }
                Err(kind)
            }
        }
    }

    /// Structural validation only; account existence is a separate check.
    /// No session-state side effects; callable in any connection state.
    pub fn validate_address(&self, candidate: &str) -> bool {
        address::is_valid(candidate)
    }

    /// The expensive existence check layered on top of structural
    /// validation: `Ok(false)` means the network reports no such account.
    pub async fn check_account_exists(&self, address: &str) -> Result<bool, ErrorKind> {
        if !address::is_valid(address) {
            return Err(ErrorKind::InvalidDestination);
        }
        match self.ledger.load_account(address).await {
            Ok(_) => Ok(true),
            Err(LedgerError::NotFound) => Ok(false),
            Err(err) => Err(translate(err.into())),
        }
    }

    /// Non-destructive startup probe: adopt an existing grant silently.
    /// Failures are logged and swallowed; only an explicit `connect` records
    /// connection errors.
    pub async fn check_connection(&self) -> bool {
        if !self.signer.is_available().await {
            return false;
        }
        {
            let inner = self.lock();
            match inner.state {
                SessionState::Connected { .. } => return true,
                SessionState::Connecting => return false,
                SessionState::Disconnected => {}
            }
        }
        match self.signer.request_connection().await {
            Ok(public_key) => {
                let account = self.ledger.load_account(&public_key).await.ok();
                let mut inner = self.lock();
                if matches!(inner.state, SessionState::Disconnected) {
                    inner.state = SessionState::Connected {
                        public_key,
                        account,
                        pending: false,
                    };
                }
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "startup connection probe failed");
                false
            }
        }
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    /// The configured network, read-only.
    pub fn network_info(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.lock().state, SessionState::Connected { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.lock().state, SessionState::Connecting)
    }

    pub fn is_transaction_pending(&self) -> bool {
        matches!(
            self.lock().state,
            SessionState::Connected { pending: true, .. }
        )
    }

    pub fn public_key(&self) -> Option<String> {
        match &self.lock().state {
            SessionState::Connected { public_key, .. } => Some(public_key.clone()),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<Account> {
        match &self.lock().state {
            SessionState::Connected { account, .. } => account.clone(),
            _ => None,
        }
    }

    pub fn last_transaction(&self) -> Option<TransactionOutcome> {
        self.lock().last_outcome.clone()
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.lock().error.clone()
    }

    /// One consistent view of the whole session for the presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        let (is_connected, is_connecting, public_key, account, is_transaction_pending) =
            match &inner.state {
                SessionState::Disconnected => (false, false, None, None, false),
                SessionState::Connecting => (false, true, None, None, false),
                SessionState::Connected {
                    public_key,
                    account,
                    pending,
                } => (
                    true,
                    false,
                    Some(public_key.clone()),
                    account.clone(),
                    *pending,
                ),
            };
        SessionSnapshot {
            is_connected,
            is_connecting,
            public_key,
            account,
            is_transaction_pending,
            last_transaction: inner.last_outcome.clone(),
            error: inner.error.clone(),
        }
    }
}

fn not_connected() -> ErrorKind {
    ErrorKind::ConnectionFailed("session is not connected".to_string())
}

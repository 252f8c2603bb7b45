//! Lumenpay: wallet-mediated payments on the Stellar ledger. The user's
//! private key never leaves an external, user-controlled signing agent.
//!
//! # Architecture
//!
//! ```text
//! WalletSession (state machine, orchestrator)
//!   │
//!   ├── ExternalSignerAdapter ── SigningAgent (external, user-controlled)
//!   │     └── reply normalization: one canonical SignedPayload
//!   │
//!   ├── LedgerClient ── HorizonClient (account state, submission)
//!   │
//!   ├── TransactionBuilder (pure: request + account → unsigned envelope)
//!   │
//!   ├── AddressValidator (structural strkey checks)
//!   │
//!   └── AssetRegistry (closed, load-time asset set)
//! ```
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `connect` | Request signer access, load the account |
//! | `disconnect` | Reset local session bookkeeping |
//! | `send_payment` | Validate → build → sign → submit, one in flight |
//! | `get_balance` | Cached balance for one asset |
//! | `refresh_account` | Replace the account cache wholesale |
//! | `validate_address` | Structural destination check, no side effects |
//!
//! Failures from the three domains (signer, ledger, builder) are translated
//! into one closed [`ErrorKind`] taxonomy at the session boundary; the
//! session always ends an operation in a well-defined terminal state.
//!
//! # Usage
//!
//! ```ignore
//! use lumenpay::{AssetRegistry, NetworkConfig, TransactionRequest, WalletSession};
//!
//! let session = WalletSession::over_horizon(
//!     Box::new(my_signing_agent),
//!     AssetRegistry::testnet(),
//!     NetworkConfig::testnet(),
//! )?;
//!
//! session.connect().await?;
//! let request = TransactionRequest::new(destination, "10", "XLM", "invoice 42")?;
//! let outcome = session.send_payment(&request).await;
//! ```

pub mod address;
pub mod assets;
pub mod error;
pub mod horizon;
pub mod logging;
pub mod session;
pub mod signer;
pub mod tx;

pub use assets::{AssetConfig, AssetId, AssetRegistry, RegistryError};
pub use error::{translate, ErrorKind, Failure, FailureOrigin};
pub use horizon::{Account, AssetBalance, HorizonClient, LedgerClient, LedgerError};
pub use logging::init_logging;
pub use session::{
    NetworkConfig, SessionSnapshot, SessionState, TransactionOutcome, WalletSession,
};
pub use signer::{ExternalSignerAdapter, SignedPayload, SignerError, SigningAgent};
pub use tx::{RequestError, TransactionRequest, UnsignedTransaction};

//! Error taxonomy - one closed enumeration over three failure domains
//!
//! Failures come from the external signer, the ledger network, and the
//! transaction builder. Each layer raises its own raw error enum; `translate`
//! is the single place that maps them into `ErrorKind`. Callers never derive
//! ad hoc message strings from the raw shapes.

use crate::horizon::LedgerError;
use crate::signer::SignerError;
use crate::tx::BuildError;

/// Closed set of user-facing failure kinds. Display gives the message
/// shown to the user; the variant drives the UI path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("signing agent is not available; install or unlock the wallet extension")]
    SignerUnavailable,
    #[error("the user declined the wallet connection request")]
    ConnectionRejectedByUser,
    #[error("could not connect to the wallet: {0}")]
    ConnectionFailed(String),
    #[error("account does not exist on the network; it must be funded before use")]
    AccountNotFound,
    #[error("destination is not a valid public key")]
    InvalidDestination,
    #[error("amount must be a positive decimal with at most 7 decimal places")]
    InvalidAmount,
    #[error("asset {0} is not in the configured asset set")]
    UnknownAsset(String),
    #[error("the user declined to sign the transaction")]
    SigningRejected,
    #[error("signing failed: {0}")]
    SigningError(String),
    #[error("the network rejected the transaction: {0}")]
    SubmissionRejected(String),
    #[error("another payment is already in flight for this session")]
    TransactionAlreadyPending,
}

impl ErrorKind {
    /// Human-readable message for the consumer boundary.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Which layer a raw failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    Signer,
    Ledger,
    Builder,
}

/// A raw failure from one of the three domains, pre-translation.
#[derive(Debug)]
pub enum Failure {
    Signer(SignerError),
    Ledger(LedgerError),
    Build(BuildError),
}

impl Failure {
    pub fn origin(&self) -> FailureOrigin {
        match self {
            Failure::Signer(_) => FailureOrigin::Signer,
            Failure::Ledger(_) => FailureOrigin::Ledger,
            Failure::Build(_) => FailureOrigin::Builder,
        }
    }
}

impl From<SignerError> for Failure {
    fn from(value: SignerError) -> Self {
        Failure::Signer(value)
    }
}

impl From<LedgerError> for Failure {
    fn from(value: LedgerError) -> Self {
        Failure::Ledger(value)
    }
}

impl From<BuildError> for Failure {
    fn from(value: BuildError) -> Self {
        Failure::Build(value)
    }
}

/// Map a raw failure into the closed taxonomy. Pure; total over all inputs.
pub fn translate(failure: Failure) -> ErrorKind {
    match failure {
        Failure::Signer(err) => match err {
            SignerError::NotAvailable => ErrorKind::SignerUnavailable,
            SignerError::ConnectionRejected => ErrorKind::ConnectionRejectedByUser,
            SignerError::ConnectionFailed(detail) => ErrorKind::ConnectionFailed(detail),
            SignerError::SigningRejected => ErrorKind::SigningRejected,
            SignerError::SigningFailed(detail) => ErrorKind::SigningError(detail),
            SignerError::UnrecognizedResponse(detail) => ErrorKind::SigningError(detail),
        },
        Failure::Ledger(err) => match err {
            LedgerError::NotFound => ErrorKind::AccountNotFound,
            LedgerError::Rejected(reason) => ErrorKind::SubmissionRejected(reason),
            LedgerError::Transport(detail) => ErrorKind::ConnectionFailed(detail),
        },
        Failure::Build(err) => match err {
            BuildError::UnknownAsset(code) => ErrorKind::UnknownAsset(code),
            BuildError::InvalidIssuer(code) => ErrorKind::UnknownAsset(code),
            BuildError::InvalidAmount => ErrorKind::InvalidAmount,
            BuildError::InvalidDestination => ErrorKind::InvalidDestination,
        },
    }
}

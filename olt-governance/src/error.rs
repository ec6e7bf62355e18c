use olt_shared_types::governance::{ProposalId, ProposalOutcome, ProposalStatus};
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Coarse classification of a rejection, stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidState,
    Unauthorized,
    InsufficientBalance,
    BelowMinimum,
    AlreadyFinalized,
    MalformedConfigUpdate,
    NotFound,
    NothingToWithdraw,
    InvalidProposal,
    InvalidTransaction,
    AlreadyExists,
    InvalidSignature,
    Ledger,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),
    #[error("proposal {0} already exists")]
    ProposalAlreadyExists(ProposalId),
    #[error("cannot {action} proposal {proposal_id} while {status:?}")]
    InvalidState {
        proposal_id: ProposalId,
        action: &'static str,
        status: ProposalStatus,
    },
    #[error("{action} window of proposal {proposal_id} closed at height {deadline}")]
    DeadlinePassed {
        proposal_id: ProposalId,
        action: &'static str,
        deadline: u64,
    },
    #[error("proposal {proposal_id} has no vote result to finalize ({outcome:?})")]
    NotDecided {
        proposal_id: ProposalId,
        outcome: ProposalOutcome,
    },
    #[error("funds of proposal {proposal_id} cannot be withdrawn while {status:?}")]
    WithdrawNotAllowed {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },
    #[error("{action} must be signed by {expected}, got {actual}")]
    Unauthorized {
        action: &'static str,
        expected: Address,
        actual: Address,
    },
    #[error("{0} is not an active validator")]
    NotAValidator(Address),
    #[error("{funder} has {available} available in proposal {proposal_id}, requested {requested}")]
    InsufficientBalance {
        proposal_id: ProposalId,
        funder: Address,
        requested: Amount,
        available: Amount,
    },
    #[error("funds of proposal {proposal_id} were already distributed, nothing to withdraw for {funder}")]
    NothingToWithdraw {
        proposal_id: ProposalId,
        funder: Address,
    },
    #[error("initial funding {provided} is below the minimum {required}")]
    BelowMinimum { required: Amount, provided: Amount },
    #[error("proposal {0} is already finalized")]
    AlreadyFinalized(ProposalId),
    #[error("malformed config update: {0}")]
    MalformedConfigUpdate(String),
    #[error("invalid proposal: {0}")]
    InvalidProposal(String),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("fund distribution failed: {0}")]
    Distribution(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("ledger rejected balance update: {0}")]
    Ledger(#[from] LedgerError),
    #[error("height {requested} is not committed yet (latest {committed})")]
    HeightNotCommitted { requested: u64, committed: u64 },
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::ProposalNotFound(_) => ErrorKind::NotFound,
            GovernanceError::HeightNotCommitted { .. } => ErrorKind::NotFound,
            GovernanceError::ProposalAlreadyExists(_) => ErrorKind::AlreadyExists,
            GovernanceError::InvalidState { .. }
            | GovernanceError::DeadlinePassed { .. }
            | GovernanceError::NotDecided { .. }
            | GovernanceError::WithdrawNotAllowed { .. } => ErrorKind::InvalidState,
            GovernanceError::Unauthorized { .. } | GovernanceError::NotAValidator(_) => {
                ErrorKind::Unauthorized
            }
            GovernanceError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            GovernanceError::NothingToWithdraw { .. } => ErrorKind::NothingToWithdraw,
            GovernanceError::BelowMinimum { .. } => ErrorKind::BelowMinimum,
            GovernanceError::AlreadyFinalized(_) => ErrorKind::AlreadyFinalized,
            GovernanceError::MalformedConfigUpdate(_) => ErrorKind::MalformedConfigUpdate,
            GovernanceError::InvalidProposal(_) => ErrorKind::InvalidProposal,
            GovernanceError::InvalidTransaction(_) => ErrorKind::InvalidTransaction,
            GovernanceError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            GovernanceError::Distribution(_) | GovernanceError::Ledger(_) => ErrorKind::Ledger,
        }
    }
}

impl From<olt_crypto::CryptoError> for GovernanceError {
    fn from(err: olt_crypto::CryptoError) -> Self {
        match err {
            // A valid signature from the wrong party is an authorization failure.
            olt_crypto::CryptoError::SignerMismatch { expected, actual } => {
                GovernanceError::Unauthorized {
                    action: "transaction",
                    expected,
                    actual,
                }
            }
            other => GovernanceError::InvalidSignature(other.to_string()),
        }
    }
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;

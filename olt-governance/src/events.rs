//! Events emitted by committed governance transitions, and transaction receipts.

use olt_shared_types::governance::{ProposalId, ProposalOutcome, ProposalType, VoteOpinion};
use olt_shared_types::options::OptionCategory;
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, GovernanceError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GovernanceEvent {
    #[serde(rename_all = "camelCase")]
    ProposalCreated {
        proposal_id: ProposalId,
        proposal_type: ProposalType,
        proposer: Address,
        initial_funding: Amount,
    },
    #[serde(rename_all = "camelCase")]
    ProposalFunded {
        proposal_id: ProposalId,
        funder: Address,
        amount: Amount,
        current_funds: Amount,
    },
    #[serde(rename_all = "camelCase")]
    VotingStarted {
        proposal_id: ProposalId,
        height: u64,
    },
    #[serde(rename_all = "camelCase")]
    VoteCast {
        proposal_id: ProposalId,
        validator: Address,
        opinion: VoteOpinion,
        power: u64,
    },
    #[serde(rename_all = "camelCase")]
    ProposalCompleted {
        proposal_id: ProposalId,
        outcome: ProposalOutcome,
    },
    #[serde(rename_all = "camelCase")]
    ProposalCancelled {
        proposal_id: ProposalId,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    ProposalFinalized {
        proposal_id: ProposalId,
        outcome: ProposalOutcome,
        distributed: Amount,
    },
    #[serde(rename_all = "camelCase")]
    FinalizeFailed {
        proposal_id: ProposalId,
        kind: ErrorKind,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    FundsWithdrawn {
        proposal_id: ProposalId,
        funder: Address,
        beneficiary: Address,
        amount: Amount,
    },
    #[serde(rename_all = "camelCase")]
    OptionsUpdated {
        proposal_id: ProposalId,
        categories: Vec<OptionCategory>,
        height: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxOutcome {
    Committed { events: Vec<GovernanceEvent> },
    Rejected { kind: ErrorKind, message: String },
}

/// Result of delivering one signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Hex BLAKE3 hash of the signing bytes, empty if they could not be encoded.
    pub tx_hash: String,
    pub tx_type: String,
    pub height: u64,
    pub outcome: TxOutcome,
}

impl TxReceipt {
    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, TxOutcome::Committed { .. })
    }

    pub fn events(&self) -> &[GovernanceEvent] {
        match &self.outcome {
            TxOutcome::Committed { events } => events,
            TxOutcome::Rejected { .. } => &[],
        }
    }

    pub fn rejection(&self) -> Option<ErrorKind> {
        match &self.outcome {
            TxOutcome::Rejected { kind, .. } => Some(*kind),
            TxOutcome::Committed { .. } => None,
        }
    }
}

impl From<Result<Vec<GovernanceEvent>, GovernanceError>> for TxOutcome {
    fn from(result: Result<Vec<GovernanceEvent>, GovernanceError>) -> Self {
        match result {
            Ok(events) => TxOutcome::Committed { events },
            Err(err) => TxOutcome::Rejected {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

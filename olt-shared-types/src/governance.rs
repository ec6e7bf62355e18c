//! Data structures for OLT's funded governance proposals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::options::FundDistribution;
use crate::{Address, Amount, ParseError};

/// Dotted option path to new value, e.g. `{"fee.minFeeDecimal": 10}`.
pub type ConfigUpdate = BTreeMap<String, serde_json::Value>;

/// Unique identifier of a proposal: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProposalId(String);

impl ProposalId {
    /// Derives an id from the proposer, headline and a client chosen nonce.
    pub fn derive(proposer: &Address, headline: &str, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(proposer.as_bytes());
        hasher.update(headline.as_bytes());
        hasher.update(&nonce.to_be_bytes());
        ProposalId(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProposalId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == 64
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ParseError::UnknownVariant {
                kind: "proposal id",
                value: s.to_string(),
            });
        }
        Ok(ProposalId(s.to_string()))
    }
}

impl TryFrom<String> for ProposalId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProposalId> for String {
    fn from(id: ProposalId) -> Self {
        id.0
    }
}

/// Enumerates the types of governance proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalType {
    /// Free-form proposal with no on-chain effect beyond fund distribution.
    General,
    /// A proposal to change the protocol code.
    CodeChange,
    /// A proposal that rewrites governance options when finalized.
    ConfigUpdate,
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProposalType::General => "general",
            ProposalType::CodeChange => "codeChange",
            ProposalType::ConfigUpdate => "configUpdate",
        })
    }
}

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalStatus {
    Funding,
    Voting,
    Completed,
}

/// Fine-grained result of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalOutcome {
    InProgress,
    InsufficientFunds,
    InsufficientVotes,
    Cancelled,
    CompletedYes,
    CompletedNo,
}

impl ProposalOutcome {
    /// Whether the proposal reached a vote result that can be finalized.
    pub fn is_decided(&self) -> bool {
        matches!(self, ProposalOutcome::CompletedYes | ProposalOutcome::CompletedNo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinalizeState {
    NotFinalized,
    Finalized,
    FinalizeFailed,
}

/// Query filter grouping proposals the way clients look for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalState {
    /// Funding or voting still open.
    Active,
    /// CompletedYes, not yet finalized.
    Passed,
    /// Any other completed outcome, not yet finalized.
    Failed,
    Finalized,
    FinalizeFailed,
}

impl FromStr for ProposalState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProposalState::Active),
            "passed" => Ok(ProposalState::Passed),
            "failed" => Ok(ProposalState::Failed),
            "finalized" => Ok(ProposalState::Finalized),
            "finalizeFailed" => Ok(ProposalState::FinalizeFailed),
            _ => Err(ParseError::UnknownVariant {
                kind: "proposal state",
                value: s.to_string(),
            }),
        }
    }
}

/// Represents a governance proposal and its lifecycle fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub proposal_id: ProposalId,
    pub proposal_type: ProposalType,
    /// Owns cancel and finalize rights.
    pub proposer: Address,
    pub headline: String,
    pub description: String,
    /// Amount the proposer escrowed at creation.
    pub initial_funding: Amount,
    pub funding_goal: Amount,
    pub funding_deadline_height: u64,
    pub voting_deadline_height: u64,
    /// Integer percent of active voting power required to pass.
    pub pass_percentage: u64,
    pub passed_fund_distribution: FundDistribution,
    pub failed_fund_distribution: FundDistribution,
    /// Recipient of the execution cost share.
    pub execution_cost_address: Address,
    /// Recipient of the bounty pool share.
    pub bounty_program_address: Address,
    /// Present only for ConfigUpdate proposals.
    pub config_update: Option<ConfigUpdate>,
    pub status: ProposalStatus,
    pub outcome: ProposalOutcome,
    pub finalize_state: FinalizeState,
    pub created_height: u64,
    /// Height at which status became Voting.
    pub voting_started_height: Option<u64>,
    /// Height at which status became Completed.
    pub completed_height: Option<u64>,
    pub finalized_height: Option<u64>,
    pub cancel_reason: Option<String>,
    /// Reason recorded when finalization failed.
    pub finalize_failure: Option<String>,
}

impl Proposal {
    pub fn state(&self) -> ProposalState {
        match (self.status, self.finalize_state) {
            (ProposalStatus::Funding, _) | (ProposalStatus::Voting, _) => ProposalState::Active,
            (ProposalStatus::Completed, FinalizeState::Finalized) => ProposalState::Finalized,
            (ProposalStatus::Completed, FinalizeState::FinalizeFailed) => {
                ProposalState::FinalizeFailed
            }
            (ProposalStatus::Completed, FinalizeState::NotFinalized) => {
                if self.outcome == ProposalOutcome::CompletedYes {
                    ProposalState::Passed
                } else {
                    ProposalState::Failed
                }
            }
        }
    }

    /// True once no further status transitions can happen without a finalize.
    pub fn is_completed(&self) -> bool {
        self.status == ProposalStatus::Completed
    }
}

/// One funder's escrow position on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub funder: Address,
    pub contributed: Amount,
    pub withdrawn: Amount,
}

impl Contribution {
    pub fn new(funder: Address) -> Self {
        Contribution {
            funder,
            contributed: Amount::ZERO,
            withdrawn: Amount::ZERO,
        }
    }

    /// Amount still held in escrow for this funder.
    pub fn available(&self) -> Amount {
        self.contributed.saturating_sub(self.withdrawn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteOpinion {
    Yes,
    No,
    Abstain,
}

/// A validator's vote, with its voting power frozen at cast time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalVote {
    pub validator: Address,
    pub opinion: VoteOpinion,
    pub voting_power_at_cast: u64,
    pub height: u64,
}

/// Outcome of evaluating the current votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteResult {
    InProgress,
    Passed,
    Failed,
    /// No voting power was cast, or no power is active.
    NoQuorum,
}

/// Weighted vote totals of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStat {
    pub yes_power: u64,
    pub no_power: u64,
    pub abstain_power: u64,
    /// Cast power of every vote plus the power of active validators yet to vote.
    pub total_power: u64,
    pub pass_percentage: u64,
    pub result: VoteResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_id_format() {
        let id = ProposalId::derive(&Address([1; 20]), "raise fees", 7);
        assert_eq!(id.as_str().len(), 64);
        assert_eq!(id.as_str().parse::<ProposalId>().unwrap(), id);
        assert!("ABC".parse::<ProposalId>().is_err());
        assert!("g".repeat(64).parse::<ProposalId>().is_err());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<ProposalId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<ProposalId>("\"xyz\"").is_err());
    }

    #[test]
    fn test_contribution_available() {
        let mut contribution = Contribution::new(Address([2; 20]));
        contribution.contributed = Amount::from_u64(10);
        contribution.withdrawn = Amount::from_u64(4);
        assert_eq!(contribution.available(), Amount::from_u64(6));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&ProposalType::ConfigUpdate).unwrap(),
            "\"configUpdate\""
        );
        assert_eq!(
            serde_json::to_string(&ProposalOutcome::CompletedYes).unwrap(),
            "\"completedYes\""
        );
        assert_eq!(
            "finalizeFailed".parse::<ProposalState>().unwrap(),
            ProposalState::FinalizeFailed
        );
    }
}

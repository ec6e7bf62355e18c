//! Read-only governance queries against the latest committed snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use olt_shared_types::governance::{
    Proposal, ProposalId, ProposalOutcome, ProposalState, ProposalStatus, ProposalType, VoteResult,
    VoteStat,
};
use olt_shared_types::options::{GovernanceOptions, OptionCategory, ProposalOptionSet};
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};
use crate::snapshot::{GovernanceSnapshot, SnapshotHandle};
use crate::voting_coordinator::{decide, Decision};

/// A proposal with its escrow total and vote statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStat {
    pub proposal: Proposal,
    pub funds: Amount,
    pub votes: VoteStat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProposalsResponse {
    pub proposal_stats: Vec<ProposalStat>,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsResponse {
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunderPosition {
    pub proposal_id: ProposalId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunderProposalsResponse {
    pub funder: Address,
    pub positions: Vec<FunderPosition>,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceOptionsResponse {
    pub gov_options: GovernanceOptions,
    /// Height each category last changed at or below `height`.
    pub last_update_height: BTreeMap<OptionCategory, u64>,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalOptionsResponse {
    pub proposal_options: ProposalOptionSet,
    pub height: u64,
}

/// Optional filters for [`GovernanceQueryService::list_proposals`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub state: Option<ProposalState>,
    pub proposer: Option<Address>,
    pub proposal_type: Option<ProposalType>,
}

impl ProposalFilter {
    fn matches(&self, proposal: &Proposal) -> bool {
        self.state.map_or(true, |state| proposal.state() == state)
            && self.proposer.map_or(true, |proposer| proposal.proposer == proposer)
            && self.proposal_type.map_or(true, |t| proposal.proposal_type == t)
    }
}

fn vote_stat(snapshot: &GovernanceSnapshot, proposal: &Proposal) -> VoteStat {
    let tally = snapshot.votes.tally(&proposal.proposal_id, &snapshot.validator_powers);
    let result = match proposal.status {
        ProposalStatus::Voting => match decide(&tally, proposal.pass_percentage, false) {
            Decision::Pass => VoteResult::Passed,
            Decision::Fail => VoteResult::Failed,
            Decision::Pending => VoteResult::InProgress,
            Decision::NoQuorum => VoteResult::NoQuorum,
        },
        ProposalStatus::Funding => VoteResult::InProgress,
        ProposalStatus::Completed => match proposal.outcome {
            ProposalOutcome::CompletedYes => VoteResult::Passed,
            ProposalOutcome::CompletedNo => VoteResult::Failed,
            ProposalOutcome::InsufficientVotes => VoteResult::NoQuorum,
            _ => VoteResult::InProgress,
        },
    };
    VoteStat {
        yes_power: tally.yes,
        no_power: tally.no,
        abstain_power: tally.abstain,
        total_power: tally.total_power,
        pass_percentage: proposal.pass_percentage,
        result,
    }
}

fn proposal_stat(snapshot: &GovernanceSnapshot, proposal: &Proposal) -> ProposalStat {
    ProposalStat {
        funds: snapshot.escrow.current_funds(&proposal.proposal_id),
        votes: vote_stat(snapshot, proposal),
        proposal: proposal.clone(),
    }
}

/// Serves queries from whichever snapshot was committed last.
#[derive(Debug, Clone)]
pub struct GovernanceQueryService {
    handle: SnapshotHandle,
}

impl GovernanceQueryService {
    pub fn new(handle: SnapshotHandle) -> Self {
        Self { handle }
    }

    pub fn snapshot(&self) -> Arc<GovernanceSnapshot> {
        self.handle.load()
    }

    pub fn list_proposals(&self, filter: &ProposalFilter) -> ListProposalsResponse {
        let snapshot = self.handle.load();
        let proposal_stats = snapshot
            .proposals
            .iter()
            .filter(|proposal| filter.matches(proposal))
            .map(|proposal| proposal_stat(&snapshot, proposal))
            .collect();
        ListProposalsResponse {
            proposal_stats,
            height: snapshot.height,
        }
    }

    pub fn list_proposal(&self, proposal_id: &ProposalId) -> GovernanceResult<ProposalStat> {
        let snapshot = self.handle.load();
        let proposal = snapshot.proposals.get(proposal_id)?;
        Ok(proposal_stat(&snapshot, proposal))
    }

    /// What `funder` can still withdraw from `proposal_id`.
    pub fn get_funds_for_proposal_by_funder(
        &self,
        proposal_id: &ProposalId,
        funder: &Address,
    ) -> GovernanceResult<FundsResponse> {
        let snapshot = self.handle.load();
        snapshot.proposals.get(proposal_id)?;
        let amount = match snapshot.escrow.escrow(proposal_id) {
            Some(escrow) if escrow.is_distributed() => Amount::ZERO,
            _ => snapshot.escrow.available(proposal_id, funder),
        };
        Ok(FundsResponse { amount })
    }

    pub fn get_proposals_for_funder(&self, funder: &Address) -> FunderProposalsResponse {
        let snapshot = self.handle.load();
        let positions = snapshot
            .escrow
            .funds_by_funder(funder)
            .into_iter()
            .map(|(proposal_id, amount)| FunderPosition { proposal_id, amount })
            .collect();
        FunderProposalsResponse {
            funder: *funder,
            positions,
            height: snapshot.height,
        }
    }

    /// Options in effect at `height`, or at the committed height when absent.
    pub fn get_governance_options_for_height(
        &self,
        height: Option<u64>,
    ) -> GovernanceResult<GovernanceOptionsResponse> {
        let snapshot = self.handle.load();
        let height = height.unwrap_or(snapshot.height);
        if height > snapshot.height {
            return Err(GovernanceError::HeightNotCommitted {
                requested: height,
                committed: snapshot.height,
            });
        }
        Ok(GovernanceOptionsResponse {
            gov_options: snapshot.registry.options_at(height)?,
            last_update_height: snapshot.registry.last_update_heights_at(height)?,
            height,
        })
    }

    pub fn get_proposal_options(&self) -> GovernanceResult<ProposalOptionsResponse> {
        let snapshot = self.handle.load();
        Ok(ProposalOptionsResponse {
            proposal_options: snapshot.registry.proposal_options(snapshot.height)?,
            height: snapshot.height,
        })
    }
}

//! Audit logging of committed governance transitions.

use olt_shared_types::governance::{Proposal, ProposalId, ProposalOutcome, VoteOpinion};
use olt_shared_types::options::OptionCategory;
use olt_shared_types::{Address, Amount};
use tracing::{event, Level};

use crate::error::GovernanceError;

/// Logs a newly created proposal.
#[tracing::instrument(level = "info", skip(proposal))]
pub fn log_proposal_created(proposal: &Proposal, height: u64) {
    event!(
        Level::INFO,
        "Proposal created: id={}, type={}, proposer={}, goal={}, funding_deadline={}, voting_deadline={}",
        proposal.proposal_id,
        proposal.proposal_type,
        proposal.proposer,
        proposal.funding_goal,
        proposal.funding_deadline_height,
        proposal.voting_deadline_height
    );
}

#[tracing::instrument(level = "info", skip(proposal_id, funder, amount, current_funds))]
pub fn log_proposal_funded(
    proposal_id: &ProposalId,
    funder: &Address,
    amount: Amount,
    current_funds: Amount,
) {
    event!(
        Level::INFO,
        "Proposal funded: id={}, funder={}, amount={}, current_funds={}",
        proposal_id,
        funder,
        amount,
        current_funds
    );
}

#[tracing::instrument(level = "info", skip(proposal_id))]
pub fn log_voting_started(proposal_id: &ProposalId, height: u64) {
    event!(Level::INFO, "Voting started: id={}, height={}", proposal_id, height);
}

#[tracing::instrument(level = "info", skip(proposal_id, validator, opinion))]
pub fn log_vote_cast(
    proposal_id: &ProposalId,
    validator: &Address,
    opinion: VoteOpinion,
    power: u64,
) {
    event!(
        Level::INFO,
        "Vote cast: id={}, validator={}, opinion={:?}, power={}",
        proposal_id,
        validator,
        opinion,
        power
    );
}

#[tracing::instrument(level = "info", skip(proposal_id, outcome))]
pub fn log_proposal_completed(proposal_id: &ProposalId, outcome: ProposalOutcome, height: u64) {
    event!(
        Level::INFO,
        "Proposal completed: id={}, outcome={:?}, height={}",
        proposal_id,
        outcome,
        height
    );
}

#[tracing::instrument(level = "info", skip(proposal_id, reason))]
pub fn log_proposal_cancelled(proposal_id: &ProposalId, reason: &str) {
    event!(Level::INFO, "Proposal cancelled: id={}, reason={:?}", proposal_id, reason);
}

#[tracing::instrument(level = "info", skip(proposal_id, distributed))]
pub fn log_proposal_finalized(proposal_id: &ProposalId, distributed: Amount, height: u64) {
    event!(
        Level::INFO,
        "Proposal finalized: id={}, distributed={}, height={}",
        proposal_id,
        distributed,
        height
    );
}

/// Logs a finalize that committed as FinalizeFailed.
#[tracing::instrument(level = "warn", skip(proposal_id, error))]
pub fn log_finalize_failed(proposal_id: &ProposalId, error: &GovernanceError) {
    event!(Level::WARN, "Proposal finalize failed: id={}: {}", proposal_id, error);
}

#[tracing::instrument(level = "info", skip(proposal_id, funder, beneficiary, amount))]
pub fn log_funds_withdrawn(
    proposal_id: &ProposalId,
    funder: &Address,
    beneficiary: &Address,
    amount: Amount,
) {
    event!(
        Level::INFO,
        "Funds withdrawn: id={}, funder={}, beneficiary={}, amount={}",
        proposal_id,
        funder,
        beneficiary,
        amount
    );
}

#[tracing::instrument(level = "info", skip(proposal_id, categories))]
pub fn log_options_updated(proposal_id: &ProposalId, categories: &[OptionCategory], height: u64) {
    event!(
        Level::INFO,
        "Governance options updated by proposal {}: categories={:?}, height={}",
        proposal_id,
        categories,
        height
    );
}

/// Logs a transaction that was rejected without any state change.
#[tracing::instrument(level = "warn", skip(tx_type, error))]
pub fn log_tx_rejected(tx_type: &str, height: u64, error: &GovernanceError) {
    event!(
        Level::WARN,
        "Transaction rejected: type={}, height={}, kind={:?}: {}",
        tx_type,
        height,
        error.kind(),
        error
    );
}

//! Keyed storage of proposals with deadline indexes.
//!
//! Records are never deleted. Open proposals are additionally indexed by the
//! height at which their current phase expires so the end-of-block hook only
//! visits proposals whose deadline actually arrived.
//!
//! Each record is an `Arc` so cloning the store for a committed snapshot
//! copies pointers. A record is copied only when a later block changes it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;
use olt_shared_types::governance::{
    FinalizeState, Proposal, ProposalId, ProposalOutcome, ProposalStatus,
};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStore {
    proposals: Arc<BTreeMap<ProposalId, Arc<Proposal>>>,
    funding_deadlines: BTreeMap<u64, BTreeSet<ProposalId>>,
    voting_deadlines: BTreeMap<u64, BTreeSet<ProposalId>>,
}

fn unindex(index: &mut BTreeMap<u64, BTreeSet<ProposalId>>, height: u64, id: &ProposalId) {
    if let Some(bucket) = index.get_mut(&height) {
        bucket.remove(id);
        if bucket.is_empty() {
            index.remove(&height);
        }
    }
}

/// Removes and returns every id in buckets at or below `height`.
fn drain_due(index: &mut BTreeMap<u64, BTreeSet<ProposalId>>, height: u64) -> Vec<ProposalId> {
    let later = match height.checked_add(1) {
        Some(next) => index.split_off(&next),
        None => BTreeMap::new(),
    };
    let due = std::mem::replace(index, later);
    due.into_values().flatten().collect()
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn contains(&self, proposal_id: &ProposalId) -> bool {
        self.proposals.contains_key(proposal_id)
    }

    pub fn get(&self, proposal_id: &ProposalId) -> GovernanceResult<&Proposal> {
        self.proposals
            .get(proposal_id)
            .map(|proposal| proposal.as_ref())
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal_id.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values().map(|proposal| proposal.as_ref())
    }

    fn get_mut(&mut self, proposal_id: &ProposalId) -> GovernanceResult<&mut Proposal> {
        Arc::make_mut(&mut self.proposals)
            .get_mut(proposal_id)
            .map(Arc::make_mut)
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal_id.clone()))
    }

    /// Stores a freshly created proposal in the Funding phase.
    pub fn insert(&mut self, proposal: Proposal) -> GovernanceResult<()> {
        let proposal_id = proposal.proposal_id.clone();
        if self.proposals.contains_key(&proposal_id) {
            return Err(GovernanceError::ProposalAlreadyExists(proposal_id));
        }
        if proposal.status != ProposalStatus::Funding
            || proposal.outcome != ProposalOutcome::InProgress
        {
            return Err(GovernanceError::InvalidState {
                proposal_id,
                action: "store",
                status: proposal.status,
            });
        }
        self.funding_deadlines
            .entry(proposal.funding_deadline_height)
            .or_default()
            .insert(proposal_id.clone());
        Arc::make_mut(&mut self.proposals).insert(proposal_id, Arc::new(proposal));
        Ok(())
    }

    /// Funding → Voting.
    pub fn start_voting(&mut self, proposal_id: &ProposalId, height: u64) -> GovernanceResult<()> {
        let proposal = self.get_mut(proposal_id)?;
        if proposal.status != ProposalStatus::Funding {
            return Err(GovernanceError::InvalidState {
                proposal_id: proposal_id.clone(),
                action: "start voting on",
                status: proposal.status,
            });
        }
        proposal.status = ProposalStatus::Voting;
        proposal.voting_started_height = Some(height);
        let (funding_deadline, voting_deadline) =
            (proposal.funding_deadline_height, proposal.voting_deadline_height);

        unindex(&mut self.funding_deadlines, funding_deadline, proposal_id);
        self.voting_deadlines
            .entry(voting_deadline)
            .or_default()
            .insert(proposal_id.clone());
        debug!("Proposal {} entered voting at height {}", proposal_id, height);
        Ok(())
    }

    /// Funding or Voting → Completed with a final outcome.
    pub fn complete(
        &mut self,
        proposal_id: &ProposalId,
        outcome: ProposalOutcome,
        height: u64,
    ) -> GovernanceResult<()> {
        let proposal = self.get_mut(proposal_id)?;
        let allowed = match (proposal.status, outcome) {
            (_, ProposalOutcome::InProgress) => false,
            (ProposalStatus::Funding, ProposalOutcome::Cancelled)
            | (ProposalStatus::Funding, ProposalOutcome::InsufficientFunds) => true,
            (ProposalStatus::Voting, ProposalOutcome::CompletedYes)
            | (ProposalStatus::Voting, ProposalOutcome::CompletedNo)
            | (ProposalStatus::Voting, ProposalOutcome::InsufficientVotes) => true,
            _ => false,
        };
        if !allowed {
            return Err(GovernanceError::InvalidState {
                proposal_id: proposal_id.clone(),
                action: "complete",
                status: proposal.status,
            });
        }
        let previous = proposal.status;
        proposal.status = ProposalStatus::Completed;
        proposal.outcome = outcome;
        proposal.completed_height = Some(height);
        let (funding_deadline, voting_deadline) =
            (proposal.funding_deadline_height, proposal.voting_deadline_height);

        match previous {
            ProposalStatus::Funding => {
                unindex(&mut self.funding_deadlines, funding_deadline, proposal_id)
            }
            _ => unindex(&mut self.voting_deadlines, voting_deadline, proposal_id),
        }
        debug!("Proposal {} completed with {:?} at height {}", proposal_id, outcome, height);
        Ok(())
    }

    pub fn cancel(
        &mut self,
        proposal_id: &ProposalId,
        reason: &str,
        height: u64,
    ) -> GovernanceResult<()> {
        self.complete(proposal_id, ProposalOutcome::Cancelled, height)?;
        self.get_mut(proposal_id)?.cancel_reason = Some(reason.to_string());
        Ok(())
    }

    fn check_finalizable(proposal: &Proposal) -> GovernanceResult<()> {
        if proposal.finalize_state != FinalizeState::NotFinalized {
            return Err(GovernanceError::AlreadyFinalized(proposal.proposal_id.clone()));
        }
        if proposal.status != ProposalStatus::Completed || !proposal.outcome.is_decided() {
            return Err(GovernanceError::NotDecided {
                proposal_id: proposal.proposal_id.clone(),
                outcome: proposal.outcome,
            });
        }
        Ok(())
    }

    /// Checks that `proposal_id` may be finalized without changing anything.
    pub fn ensure_finalizable(&self, proposal_id: &ProposalId) -> GovernanceResult<&Proposal> {
        let proposal = self.get(proposal_id)?;
        Self::check_finalizable(proposal)?;
        Ok(proposal)
    }

    pub fn mark_finalized(
        &mut self,
        proposal_id: &ProposalId,
        height: u64,
    ) -> GovernanceResult<()> {
        let proposal = self.get_mut(proposal_id)?;
        Self::check_finalizable(proposal)?;
        proposal.finalize_state = FinalizeState::Finalized;
        proposal.finalized_height = Some(height);
        Ok(())
    }

    pub fn mark_finalize_failed(
        &mut self,
        proposal_id: &ProposalId,
        reason: String,
        height: u64,
    ) -> GovernanceResult<()> {
        let proposal = self.get_mut(proposal_id)?;
        Self::check_finalizable(proposal)?;
        proposal.finalize_state = FinalizeState::FinalizeFailed;
        proposal.finalized_height = Some(height);
        proposal.finalize_failure = Some(reason);
        Ok(())
    }

    /// Funding proposals whose funding deadline is at or below `height`.
    /// They leave the index, so each is returned once.
    pub fn take_expired_funding(&mut self, height: u64) -> Vec<ProposalId> {
        drain_due(&mut self.funding_deadlines, height)
    }

    /// Voting proposals whose voting deadline is at or below `height`.
    pub fn take_expired_voting(&mut self, height: u64) -> Vec<ProposalId> {
        drain_due(&mut self.voting_deadlines, height)
    }

    /// Proposals still waiting for a deadline, for diagnostics.
    pub fn pending_deadlines(&self) -> usize {
        self.funding_deadlines.values().map(BTreeSet::len).sum::<usize>()
            + self.voting_deadlines.values().map(BTreeSet::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_proposal;

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut store = ProposalStore::new();
        store.insert(sample_proposal()).unwrap();
        assert!(matches!(
            store.insert(sample_proposal()),
            Err(GovernanceError::ProposalAlreadyExists(_))
        ));
    }

    #[test]
    fn test_transitions_happen_once() {
        let mut store = ProposalStore::new();
        let proposal = sample_proposal();
        let id = proposal.proposal_id.clone();
        store.insert(proposal).unwrap();

        store.start_voting(&id, 5).unwrap();
        assert!(store.start_voting(&id, 6).is_err());
        assert!(store.complete(&id, ProposalOutcome::Cancelled, 6).is_err());

        store.complete(&id, ProposalOutcome::CompletedYes, 7).unwrap();
        assert!(store.complete(&id, ProposalOutcome::CompletedNo, 8).is_err());

        store.mark_finalized(&id, 9).unwrap();
        assert!(matches!(store.mark_finalized(&id, 10), Err(GovernanceError::AlreadyFinalized(_))));
        assert!(matches!(
            store.mark_finalize_failed(&id, "late".to_string(), 10),
            Err(GovernanceError::AlreadyFinalized(_))
        ));
        assert_eq!(store.get(&id).unwrap().finalized_height, Some(9));
    }

    #[test]
    fn test_deadline_buckets_follow_the_phase() {
        let mut store = ProposalStore::new();
        let proposal = sample_proposal();
        let id = proposal.proposal_id.clone();
        let (funding, voting) = (proposal.funding_deadline_height, proposal.voting_deadline_height);
        store.insert(proposal).unwrap();

        assert!(store.take_expired_funding(funding - 1).is_empty());
        store.start_voting(&id, 1).unwrap();
        assert!(store.take_expired_funding(funding).is_empty());
        assert_eq!(store.take_expired_voting(voting + 3), vec![id.clone()]);
        assert!(store.take_expired_voting(voting + 4).is_empty());
        assert_eq!(store.pending_deadlines(), 0);
    }

    #[test]
    fn test_cancel_only_while_funding() {
        let mut store = ProposalStore::new();
        let proposal = sample_proposal();
        let id = proposal.proposal_id.clone();
        store.insert(proposal).unwrap();
        store.cancel(&id, "changed my mind", 2).unwrap();
        let stored = store.get(&id).unwrap();
        assert_eq!(stored.outcome, ProposalOutcome::Cancelled);
        assert_eq!(stored.cancel_reason.as_deref(), Some("changed my mind"));
        assert_eq!(store.pending_deadlines(), 0);
        assert!(store.ensure_finalizable(&id).is_err());
    }

    #[test]
    fn test_clone_copies_only_changed_records() {
        let mut store = ProposalStore::new();
        let first = sample_proposal();
        let mut second = sample_proposal();
        second.proposal_id = ProposalId::derive(&second.proposer, "second", 1);
        let (first_id, second_id) = (first.proposal_id.clone(), second.proposal_id.clone());
        store.insert(first).unwrap();
        store.insert(second).unwrap();

        let committed = store.clone();
        assert!(Arc::ptr_eq(&committed.proposals, &store.proposals));

        store.start_voting(&second_id, 3).unwrap();
        assert!(Arc::ptr_eq(&committed.proposals[&first_id], &store.proposals[&first_id]));
        assert!(!Arc::ptr_eq(&committed.proposals[&second_id], &store.proposals[&second_id]));
        assert_eq!(committed.get(&second_id).unwrap().status, ProposalStatus::Funding);
        assert_eq!(store.get(&second_id).unwrap().status, ProposalStatus::Voting);
    }
}

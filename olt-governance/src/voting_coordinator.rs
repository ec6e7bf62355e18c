//! Vote storage and weighted tallying for governance proposals
//!
//! Each validator holds at most one vote per proposal; a later vote from the
//! same validator replaces the earlier one. Tallying is a pure function of the
//! stored votes and the active validator powers.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use olt_shared_types::governance::{ProposalId, ProposalVote, VoteOpinion};
use olt_shared_types::Address;
use serde::{Deserialize, Serialize};

/// Weighted vote totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    /// Σ voting power at cast of Yes votes.
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    /// Denominator: Σ power at cast of every vote plus `unvoted_power`.
    /// Never below `yes + no + abstain`, even after voters leave the set.
    pub total_power: u64,
    /// Power of active validators that have not voted.
    pub unvoted_power: u64,
    pub votes_cast: usize,
}

/// What the tally means for a proposal still in Voting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pending,
    Pass,
    Fail,
    /// Nothing meaningful to count: no votes, or no active power.
    NoQuorum,
}

/// Sums votes against the active validator powers.
pub fn tally<'a, I>(votes: I, active_powers: &BTreeMap<Address, u64>) -> Tally
where
    I: IntoIterator<Item = &'a ProposalVote>,
{
    let mut result = Tally::default();
    let mut voted_power = 0u64;
    let mut cast_power = 0u64;
    for vote in votes {
        result.votes_cast += 1;
        let power = vote.voting_power_at_cast;
        match vote.opinion {
            VoteOpinion::Yes => result.yes = result.yes.saturating_add(power),
            VoteOpinion::No => result.no = result.no.saturating_add(power),
            VoteOpinion::Abstain => result.abstain = result.abstain.saturating_add(power),
        }
        cast_power = cast_power.saturating_add(power);
        if let Some(active) = active_powers.get(&vote.validator) {
            voted_power = voted_power.saturating_add(*active);
        }
    }
    let active_total = active_powers.values().fold(0u64, |acc, p| acc.saturating_add(*p));
    result.unvoted_power = active_total.saturating_sub(voted_power);
    result.total_power = cast_power.saturating_add(result.unvoted_power);
    result
}

/// `yes * 100 >= pass_percentage * total`, in wide integers.
fn reaches(yes: u64, total: u64, pass_percentage: u64) -> bool {
    u128::from(yes) * 100 >= u128::from(pass_percentage) * u128::from(total)
}

/// Applies the pass threshold to a tally.
///
/// Before the deadline a proposal passes as soon as Yes power reaches the
/// threshold and fails as soon as Yes plus all unvoted power can no longer
/// reach it. At the deadline anything short of passing fails, unless no
/// votes were cast at all.
pub fn decide(tally: &Tally, pass_percentage: u64, at_deadline: bool) -> Decision {
    if tally.total_power == 0 {
        return if at_deadline { Decision::NoQuorum } else { Decision::Pending };
    }
    if tally.votes_cast > 0 && reaches(tally.yes, tally.total_power, pass_percentage) {
        return Decision::Pass;
    }
    if at_deadline {
        return if tally.votes_cast == 0 { Decision::NoQuorum } else { Decision::Fail };
    }
    let best_case = tally.yes.saturating_add(tally.unvoted_power);
    if tally.votes_cast > 0 && !reaches(best_case, tally.total_power, pass_percentage) {
        return Decision::Fail;
    }
    Decision::Pending
}

/// Stores votes per proposal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotingCoordinator {
    votes: Arc<BTreeMap<ProposalId, Arc<BTreeMap<Address, ProposalVote>>>>,
}

impl VotingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vote, returning the vote it replaced.
    pub fn record_vote(
        &mut self,
        proposal_id: &ProposalId,
        vote: ProposalVote,
    ) -> Option<ProposalVote> {
        debug!(
            "Vote {:?} with power {} on proposal {} by validator {}",
            vote.opinion, vote.voting_power_at_cast, proposal_id, vote.validator
        );
        let votes = Arc::make_mut(&mut self.votes);
        Arc::make_mut(votes.entry(proposal_id.clone()).or_default()).insert(vote.validator, vote)
    }

    pub fn votes(&self, proposal_id: &ProposalId) -> Vec<&ProposalVote> {
        self.votes
            .get(proposal_id)
            .map(|votes| votes.values().collect())
            .unwrap_or_default()
    }

    pub fn vote_of(&self, proposal_id: &ProposalId, validator: &Address) -> Option<&ProposalVote> {
        self.votes.get(proposal_id)?.get(validator)
    }

    pub fn tally(&self, proposal_id: &ProposalId, active_powers: &BTreeMap<Address, u64>) -> Tally {
        tally(self.votes(proposal_id), active_powers)
    }

    pub fn total_votes(&self) -> usize {
        self.votes.values().map(|votes| votes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address([tag; 20])
    }

    fn vote(tag: u8, opinion: VoteOpinion, power: u64) -> ProposalVote {
        ProposalVote {
            validator: addr(tag),
            opinion,
            voting_power_at_cast: power,
            height: 1,
        }
    }

    fn equal_powers(n: u8) -> BTreeMap<Address, u64> {
        (1..=n).map(|tag| (addr(tag), 1)).collect()
    }

    #[test]
    fn test_exact_threshold_passes() {
        let powers = equal_powers(2);
        let votes = [vote(1, VoteOpinion::Yes, 1)];
        let result = tally(votes.iter(), &powers);
        assert_eq!(decide(&result, 50, false), Decision::Pass);
        assert_eq!(decide(&result, 51, false), Decision::Pending);
    }

    #[test]
    fn test_early_failure_when_unreachable() {
        let powers = equal_powers(2);
        let votes = [vote(1, VoteOpinion::No, 1)];
        let result = tally(votes.iter(), &powers);
        assert_eq!(result.unvoted_power, 1);
        assert_eq!(decide(&result, 51, false), Decision::Fail);
        assert_eq!(decide(&result, 50, false), Decision::Pending);
    }

    #[test]
    fn test_deadline_without_votes_has_no_quorum() {
        let powers = equal_powers(3);
        let result = tally(std::iter::empty::<&ProposalVote>(), &powers);
        assert_eq!(decide(&result, 51, false), Decision::Pending);
        assert_eq!(decide(&result, 51, true), Decision::NoQuorum);
        let empty = tally(std::iter::empty::<&ProposalVote>(), &BTreeMap::new());
        assert_eq!(decide(&empty, 51, true), Decision::NoQuorum);
    }

    #[test]
    fn test_abstain_counts_against_at_deadline() {
        let powers = equal_powers(2);
        let votes = [vote(1, VoteOpinion::Abstain, 1)];
        let result = tally(votes.iter(), &powers);
        assert_eq!(decide(&result, 51, true), Decision::Fail);
    }

    #[test]
    fn test_revote_replaces_previous() {
        let mut coordinator = VotingCoordinator::new();
        let id = crate::test_support::sample_proposal().proposal_id;
        assert!(coordinator.record_vote(&id, vote(1, VoteOpinion::No, 1)).is_none());
        let replaced = coordinator.record_vote(&id, vote(1, VoteOpinion::Yes, 1)).unwrap();
        assert_eq!(replaced.opinion, VoteOpinion::No);
        let result = coordinator.tally(&id, &equal_powers(1));
        assert_eq!((result.yes, result.no, result.votes_cast), (1, 0, 1));
    }

    #[test]
    fn test_power_is_frozen_at_cast() {
        let mut powers = equal_powers(2);
        let votes = [vote(1, VoteOpinion::Yes, 1)];
        powers.insert(addr(1), 10);
        let result = tally(votes.iter(), &powers);
        assert_eq!(result.yes, 1);
        assert_eq!(result.total_power, 2);
        assert_eq!(result.unvoted_power, 1);
        assert_eq!(decide(&result, 51, false), Decision::Pending);
    }

    #[test]
    fn test_departed_voter_still_counts_in_the_denominator() {
        // addr(1) voted with 30 and then left the active set.
        let powers: BTreeMap<Address, u64> = [(addr(2), 10), (addr(3), 10)].into_iter().collect();
        let votes = [vote(1, VoteOpinion::Yes, 30), vote(2, VoteOpinion::No, 10)];
        let result = tally(votes.iter(), &powers);
        assert_eq!(result.unvoted_power, 10);
        assert_eq!(result.total_power, 50);
        assert!(result.yes + result.no + result.abstain <= result.total_power);
        assert_eq!(decide(&result, 67, false), Decision::Pending);
        assert_eq!(decide(&result, 60, false), Decision::Pass);
        assert_eq!(decide(&result, 67, true), Decision::Fail);
    }

    #[test]
    fn test_clone_shares_untouched_vote_maps() {
        let mut coordinator = VotingCoordinator::new();
        let first = crate::test_support::sample_proposal().proposal_id;
        let second = ProposalId::derive(&addr(9), "second", 1);
        coordinator.record_vote(&first, vote(1, VoteOpinion::Yes, 1));
        coordinator.record_vote(&second, vote(1, VoteOpinion::Yes, 1));

        let committed = coordinator.clone();
        coordinator.record_vote(&second, vote(2, VoteOpinion::No, 1));
        assert!(Arc::ptr_eq(&committed.votes[&first], &coordinator.votes[&first]));
        assert_eq!(committed.votes(&second).len(), 1);
        assert_eq!(coordinator.votes(&second).len(), 2);
    }
}

//! Per-proposal escrow of funder contributions.
//!
//! The escrow only keeps the books. Coins move through the
//! [`BalanceLedger`](crate::ledger::BalanceLedger), and the coordinator calls
//! the `check_*` methods before touching the ledger so that a rejected
//! transaction leaves both sides untouched.
//!
//! Escrows sit behind `Arc` so a committed snapshot shares every escrow the
//! next block does not touch.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use olt_shared_types::governance::{Contribution, Proposal, ProposalId, ProposalStatus};
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEscrow {
    contributions: BTreeMap<Address, Contribution>,
    /// Set once a successful finalize paid the escrow out.
    distributed: bool,
}

impl ProposalEscrow {
    /// `Σ contributed − Σ withdrawn`, zero once paid out.
    pub fn current_funds(&self) -> Amount {
        if self.distributed {
            return Amount::ZERO;
        }
        self.contributions
            .values()
            .fold(Amount::ZERO, |acc, c| acc.checked_add(c.available()).unwrap_or(acc))
    }

    pub fn contributions(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.values()
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowLedger {
    escrows: Arc<BTreeMap<ProposalId, Arc<ProposalEscrow>>>,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn escrow(&self, proposal_id: &ProposalId) -> Option<&ProposalEscrow> {
        self.escrows.get(proposal_id).map(|escrow| escrow.as_ref())
    }

    pub fn current_funds(&self, proposal_id: &ProposalId) -> Amount {
        self.escrows
            .get(proposal_id)
            .map(|escrow| escrow.current_funds())
            .unwrap_or(Amount::ZERO)
    }

    pub fn contribution(
        &self,
        proposal_id: &ProposalId,
        funder: &Address,
    ) -> Option<&Contribution> {
        self.escrows.get(proposal_id)?.contributions.get(funder)
    }

    /// Amount `funder` could still withdraw, zero once distributed.
    pub fn available(&self, proposal_id: &ProposalId, funder: &Address) -> Amount {
        match self.escrows.get(proposal_id) {
            Some(escrow) if !escrow.distributed => escrow
                .contributions
                .get(funder)
                .map(Contribution::available)
                .unwrap_or(Amount::ZERO),
            _ => Amount::ZERO,
        }
    }

    /// Proposals where `funder` still has coins in escrow.
    pub fn funds_by_funder(&self, funder: &Address) -> Vec<(ProposalId, Amount)> {
        self.escrows
            .iter()
            .filter(|(_, escrow)| !escrow.distributed)
            .filter_map(|(id, escrow)| {
                let available = escrow.contributions.get(funder)?.available();
                (!available.is_zero()).then(|| (id.clone(), available))
            })
            .collect()
    }

    pub fn check_contribute(
        &self,
        proposal: &Proposal,
        amount: Amount,
    ) -> GovernanceResult<Amount> {
        if proposal.status != ProposalStatus::Funding {
            return Err(GovernanceError::InvalidState {
                proposal_id: proposal.proposal_id.clone(),
                action: "fund",
                status: proposal.status,
            });
        }
        if amount.is_zero() {
            return Err(GovernanceError::InvalidTransaction(
                "contribution must be positive".to_string(),
            ));
        }
        self.current_funds(&proposal.proposal_id)
            .checked_add(amount)
            .ok_or_else(|| {
                GovernanceError::InvalidTransaction("escrow total overflows".to_string())
            })
    }

    /// Records a contribution and returns the new escrow total.
    pub fn contribute(
        &mut self,
        proposal: &Proposal,
        funder: Address,
        amount: Amount,
    ) -> GovernanceResult<Amount> {
        let total = self.check_contribute(proposal, amount)?;
        let escrows = Arc::make_mut(&mut self.escrows);
        let escrow = Arc::make_mut(escrows.entry(proposal.proposal_id.clone()).or_default());
        let contribution = escrow
            .contributions
            .entry(funder)
            .or_insert_with(|| Contribution::new(funder));
        // Cannot overflow: bounded by the checked escrow total.
        contribution.contributed = contribution.contributed.checked_add(amount).unwrap_or(total);
        debug!(
            "Escrowed {} from {} for proposal {}, total {}",
            amount, funder, proposal.proposal_id, total
        );
        Ok(total)
    }

    pub fn check_withdraw(
        &self,
        proposal: &Proposal,
        funder: &Address,
        amount: Amount,
    ) -> GovernanceResult<()> {
        if proposal.status != ProposalStatus::Completed {
            return Err(GovernanceError::WithdrawNotAllowed {
                proposal_id: proposal.proposal_id.clone(),
                status: proposal.status,
            });
        }
        let escrow = self.escrows.get(&proposal.proposal_id);
        if escrow.map(|escrow| escrow.distributed).unwrap_or(false) {
            return Err(GovernanceError::NothingToWithdraw {
                proposal_id: proposal.proposal_id.clone(),
                funder: *funder,
            });
        }
        if amount.is_zero() {
            return Err(GovernanceError::InvalidTransaction(
                "withdrawal must be positive".to_string(),
            ));
        }
        let available = self.available(&proposal.proposal_id, funder);
        if amount > available {
            return Err(GovernanceError::InsufficientBalance {
                proposal_id: proposal.proposal_id.clone(),
                funder: *funder,
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Records a withdrawal and returns what the funder has left.
    pub fn withdraw(
        &mut self,
        proposal: &Proposal,
        funder: &Address,
        amount: Amount,
    ) -> GovernanceResult<Amount> {
        self.check_withdraw(proposal, funder, amount)?;
        let contribution = Arc::make_mut(&mut self.escrows)
            .get_mut(&proposal.proposal_id)
            .map(Arc::make_mut)
            .and_then(|escrow| escrow.contributions.get_mut(funder))
            .ok_or_else(|| GovernanceError::InsufficientBalance {
                proposal_id: proposal.proposal_id.clone(),
                funder: *funder,
                requested: amount,
                available: Amount::ZERO,
            })?;
        contribution.withdrawn = contribution
            .withdrawn
            .checked_add(amount)
            .unwrap_or(contribution.contributed);
        Ok(contribution.available())
    }

    /// Marks the escrow as paid out by a successful finalize.
    pub fn mark_distributed(&mut self, proposal_id: &ProposalId) {
        let escrows = Arc::make_mut(&mut self.escrows);
        Arc::make_mut(escrows.entry(proposal_id.clone()).or_default()).distributed = true;
    }
}

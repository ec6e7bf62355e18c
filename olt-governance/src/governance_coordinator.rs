//! Proposal lifecycle controller
//!
//! Drives every proposal through Funding → Voting → Completed → Finalized by
//! combining the proposal store, the escrow ledger, the vote store and the
//! option registry. Transactions are applied one at a time in delivery order;
//! each either commits all of its effects or returns an error having changed
//! nothing. Deadline expiry runs once per block in [`GovernanceCoordinator::end_block`].

use std::sync::Arc;

use log::{debug, error, info, warn};
use olt_shared_types::governance::{
    FinalizeState, Proposal, ProposalId, ProposalOutcome, ProposalState, ProposalStatus,
    ProposalType, ProposalVote,
};
use olt_shared_types::options::{GovernanceOptions, OptionValue};
use olt_shared_types::transaction::{
    CancelProposal, CreateProposal, FinalizeProposal, FundProposal, GovernanceTx, SignedTx,
    VoteProposal, WithdrawProposalFunds,
};
use olt_shared_types::{Address, Amount};

use crate::audit_log;
use crate::error::{GovernanceError, GovernanceResult};
use crate::escrow::EscrowLedger;
use crate::events::{GovernanceEvent, TxReceipt};
use crate::fund_distribution::{plan_distribution, DistributionPlan, Recipients};
use crate::ledger::{BalanceLedger, BalanceOp, ValidatorSet};
use crate::parameter_manager::OptionRegistry;
use crate::proposal_store::ProposalStore;
use crate::proposal_validation::{ProposalValidationConfig, ProposalValidator};
use crate::snapshot::{GovernanceSnapshot, SnapshotHandle};
use crate::voting_coordinator::{decide, Decision, VotingCoordinator};

/// Configuration for the governance coordinator
#[derive(Debug, Clone)]
pub struct GovernanceCoordinatorConfig {
    pub proposal_validation: ProposalValidationConfig,
    /// Height at which the genesis options take effect.
    pub genesis_height: u64,
}

impl Default for GovernanceCoordinatorConfig {
    fn default() -> Self {
        Self {
            proposal_validation: ProposalValidationConfig::default(),
            genesis_height: 0,
        }
    }
}

/// External collaborators for the block being executed.
pub struct BlockContext<'a> {
    pub height: u64,
    pub ledger: &'a mut dyn BalanceLedger,
    pub validators: &'a dyn ValidatorSet,
}

impl<'a> BlockContext<'a> {
    pub fn new(
        height: u64,
        ledger: &'a mut dyn BalanceLedger,
        validators: &'a dyn ValidatorSet,
    ) -> Self {
        BlockContext {
            height,
            ledger,
            validators,
        }
    }
}

/// Everything a block produced.
#[derive(Debug, Clone)]
pub struct BlockResult {
    pub height: u64,
    pub receipts: Vec<TxReceipt>,
    pub end_block_events: Vec<GovernanceEvent>,
    pub snapshot: Arc<GovernanceSnapshot>,
}

/// Statistics about governance state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GovernanceStats {
    pub total_proposals: usize,
    pub active_proposals: usize,
    pub passed_proposals: usize,
    pub failed_proposals: usize,
    pub finalized_proposals: usize,
    pub finalize_failed_proposals: usize,
    pub total_votes: usize,
    pub option_updates: usize,
}

pub struct GovernanceCoordinator {
    config: GovernanceCoordinatorConfig,
    store: ProposalStore,
    escrow: EscrowLedger,
    voting: VotingCoordinator,
    registry: OptionRegistry,
    validator: ProposalValidator,
    snapshots: SnapshotHandle,
    committed_height: u64,
}

fn check_signer(action: &'static str, expected: Address, actual: Address) -> GovernanceResult<()> {
    if expected != actual {
        return Err(GovernanceError::Unauthorized {
            action,
            expected,
            actual,
        });
    }
    Ok(())
}

impl GovernanceCoordinator {
    /// Create a new governance coordinator starting from genesis options
    pub fn new(config: GovernanceCoordinatorConfig, genesis: GovernanceOptions) -> Self {
        let registry = OptionRegistry::new(genesis, config.genesis_height);
        let validator = ProposalValidator::new(config.proposal_validation.clone());
        let snapshots = SnapshotHandle::new(GovernanceSnapshot {
            height: config.genesis_height,
            proposals: ProposalStore::new(),
            escrow: EscrowLedger::new(),
            votes: VotingCoordinator::new(),
            registry: registry.clone(),
            validator_powers: Default::default(),
        });
        Self {
            committed_height: config.genesis_height,
            config,
            store: ProposalStore::new(),
            escrow: EscrowLedger::new(),
            voting: VotingCoordinator::new(),
            registry,
            validator,
            snapshots,
        }
    }

    pub fn config(&self) -> &GovernanceCoordinatorConfig {
        &self.config
    }

    pub fn proposals(&self) -> &ProposalStore {
        &self.store
    }

    pub fn proposal(&self, proposal_id: &ProposalId) -> GovernanceResult<&Proposal> {
        self.store.get(proposal_id)
    }

    pub fn escrow(&self) -> &EscrowLedger {
        &self.escrow
    }

    pub fn current_funds(&self, proposal_id: &ProposalId) -> Amount {
        self.escrow.current_funds(proposal_id)
    }

    pub fn votes(&self) -> &VotingCoordinator {
        &self.voting
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// Handle readers use to see committed state.
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    pub fn committed_height(&self) -> u64 {
        self.committed_height
    }

    /// Authenticates and applies one signed transaction.
    pub fn deliver_tx(&mut self, signed: &SignedTx, ctx: &mut BlockContext<'_>) -> TxReceipt {
        let tx_hash = signed
            .unsigned()
            .hash()
            .map(hex::encode)
            .unwrap_or_default();
        let result = self.execute(signed, ctx);
        if let Err(err) = &result {
            warn!(
                "Rejected {} for proposal {} at height {}: {}",
                signed.tx.name(),
                signed.tx.proposal_id(),
                ctx.height,
                err
            );
            audit_log::log_tx_rejected(signed.tx.name(), ctx.height, err);
        }
        TxReceipt {
            tx_hash,
            tx_type: signed.tx.name().to_string(),
            height: ctx.height,
            outcome: result.into(),
        }
    }

    fn execute(
        &mut self,
        signed: &SignedTx,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let signer = olt_crypto::authenticate(signed)?.authenticator;
        let currency = self.registry.fee_currency(ctx.height)?;
        self.validator.validate_fee(&signed.fee, &currency)?;
        match &signed.tx {
            GovernanceTx::CreateProposal(msg) => self.create_proposal(signer, msg, ctx),
            GovernanceTx::FundProposal(msg) => self.fund_proposal(signer, msg, ctx),
            GovernanceTx::CancelProposal(msg) => self.cancel_proposal(signer, msg, ctx),
            GovernanceTx::VoteProposal(msg) => self.vote_proposal(signer, msg, ctx),
            GovernanceTx::FinalizeProposal(msg) => self.finalize_proposal(signer, msg, ctx),
            GovernanceTx::WithdrawProposalFunds(msg) => self.withdraw_funds(signer, msg, ctx),
        }
    }

    fn enter_voting(
        &mut self,
        proposal_id: &ProposalId,
        height: u64,
        events: &mut Vec<GovernanceEvent>,
    ) -> GovernanceResult<()> {
        self.store.start_voting(proposal_id, height)?;
        info!("Proposal {} reached its funding goal, voting opened", proposal_id);
        audit_log::log_voting_started(proposal_id, height);
        events.push(GovernanceEvent::VotingStarted {
            proposal_id: proposal_id.clone(),
            height,
        });
        Ok(())
    }

    fn complete(
        &mut self,
        proposal_id: &ProposalId,
        outcome: ProposalOutcome,
        height: u64,
        events: &mut Vec<GovernanceEvent>,
    ) -> GovernanceResult<()> {
        self.store.complete(proposal_id, outcome, height)?;
        info!("Proposal {} completed with outcome {:?}", proposal_id, outcome);
        audit_log::log_proposal_completed(proposal_id, outcome, height);
        events.push(GovernanceEvent::ProposalCompleted {
            proposal_id: proposal_id.clone(),
            outcome,
        });
        Ok(())
    }

    /// Creates a proposal and escrows the proposer's initial funding.
    pub fn create_proposal(
        &mut self,
        signer: Address,
        msg: &CreateProposal,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let height = ctx.height;
        check_signer("create proposal", msg.proposer, signer)?;
        if self.store.contains(&msg.proposal_id) {
            return Err(GovernanceError::ProposalAlreadyExists(msg.proposal_id.clone()));
        }

        let option_set = self.registry.proposal_options(height)?;
        let options = option_set.for_type(msg.proposal_type);
        let currency = self.registry.fee_currency(height)?;
        self.validator.validate_create(msg, options, &currency)?;

        let funding_deadline_height = height
            .checked_add(options.funding_deadline)
            .ok_or_else(|| {
                GovernanceError::InvalidProposal("funding deadline overflows".to_string())
            })?;
        let voting_deadline_height = funding_deadline_height
            .checked_add(options.voting_deadline)
            .ok_or_else(|| {
                GovernanceError::InvalidProposal("voting deadline overflows".to_string())
            })?;

        let initial_funding = msg.initial_funding.value;
        let proposal = Proposal {
            proposal_id: msg.proposal_id.clone(),
            proposal_type: msg.proposal_type,
            proposer: msg.proposer,
            headline: msg.headline.clone(),
            description: msg.description.clone(),
            initial_funding,
            funding_goal: options.funding_goal,
            funding_deadline_height,
            voting_deadline_height,
            pass_percentage: options.pass_percentage,
            passed_fund_distribution: options.passed_fund_distribution,
            failed_fund_distribution: options.failed_fund_distribution,
            execution_cost_address: options.proposal_execution_cost,
            bounty_program_address: option_set.bounty_program_addr,
            config_update: msg.config_update.clone(),
            status: ProposalStatus::Funding,
            outcome: ProposalOutcome::InProgress,
            finalize_state: FinalizeState::NotFinalized,
            created_height: height,
            voting_started_height: None,
            completed_height: None,
            finalized_height: None,
            cancel_reason: None,
            finalize_failure: None,
        };
        self.escrow.check_contribute(&proposal, initial_funding)?;

        ctx.ledger.apply_batch(&[BalanceOp::Debit {
            account: msg.proposer,
            amount: initial_funding,
        }])?;

        self.store.insert(proposal.clone())?;
        let current_funds = self.escrow.contribute(&proposal, msg.proposer, initial_funding)?;
        info!(
            "Created {} proposal {} by {} with initial funding {}",
            proposal.proposal_type, proposal.proposal_id, proposal.proposer, initial_funding
        );
        audit_log::log_proposal_created(&proposal, height);

        let mut events = vec![GovernanceEvent::ProposalCreated {
            proposal_id: proposal.proposal_id.clone(),
            proposal_type: proposal.proposal_type,
            proposer: proposal.proposer,
            initial_funding,
        }];
        if current_funds >= proposal.funding_goal {
            self.enter_voting(&proposal.proposal_id, height, &mut events)?;
        }
        Ok(events)
    }

    /// Adds a contribution to a proposal in the Funding phase.
    pub fn fund_proposal(
        &mut self,
        signer: Address,
        msg: &FundProposal,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let height = ctx.height;
        check_signer("fund proposal", msg.funder_address, signer)?;
        let proposal = self.store.get(&msg.proposal_id)?;
        let amount = msg.fund_value.value;

        let current_funds = self.escrow.check_contribute(proposal, amount)?;
        if height > proposal.funding_deadline_height {
            return Err(GovernanceError::DeadlinePassed {
                proposal_id: msg.proposal_id.clone(),
                action: "funding",
                deadline: proposal.funding_deadline_height,
            });
        }
        let currency = self.registry.fee_currency(height)?;
        self.validator.validate_coin(&msg.fund_value, &currency)?;

        ctx.ledger.apply_batch(&[BalanceOp::Debit {
            account: msg.funder_address,
            amount,
        }])?;
        self.escrow.contribute(proposal, msg.funder_address, amount)?;
        let goal_reached = current_funds >= proposal.funding_goal;

        audit_log::log_proposal_funded(
            &msg.proposal_id,
            &msg.funder_address,
            amount,
            current_funds,
        );
        let mut events = vec![GovernanceEvent::ProposalFunded {
            proposal_id: msg.proposal_id.clone(),
            funder: msg.funder_address,
            amount,
            current_funds,
        }];
        if goal_reached {
            self.enter_voting(&msg.proposal_id, height, &mut events)?;
        }
        Ok(events)
    }

    /// Cancels a proposal that is still collecting funds.
    pub fn cancel_proposal(
        &mut self,
        signer: Address,
        msg: &CancelProposal,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let proposal = self.store.get(&msg.proposal_id)?;
        check_signer("cancel proposal", proposal.proposer, msg.proposer)?;
        check_signer("cancel proposal", proposal.proposer, signer)?;
        if proposal.status != ProposalStatus::Funding {
            return Err(GovernanceError::InvalidState {
                proposal_id: msg.proposal_id.clone(),
                action: "cancel",
                status: proposal.status,
            });
        }

        self.store.cancel(&msg.proposal_id, &msg.reason, ctx.height)?;
        info!("Proposal {} cancelled by its proposer: {}", msg.proposal_id, msg.reason);
        audit_log::log_proposal_cancelled(&msg.proposal_id, &msg.reason);
        Ok(vec![
            GovernanceEvent::ProposalCancelled {
                proposal_id: msg.proposal_id.clone(),
                reason: msg.reason.clone(),
            },
            GovernanceEvent::ProposalCompleted {
                proposal_id: msg.proposal_id.clone(),
                outcome: ProposalOutcome::Cancelled,
            },
        ])
    }

    /// Records a validator's vote and completes the proposal early when the
    /// result can no longer change.
    pub fn vote_proposal(
        &mut self,
        authenticator: Address,
        msg: &VoteProposal,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let height = ctx.height;
        check_signer("vote", msg.validator_address, authenticator)?;
        let proposal = self.store.get(&msg.proposal_id)?;
        if proposal.status != ProposalStatus::Voting {
            return Err(GovernanceError::InvalidState {
                proposal_id: msg.proposal_id.clone(),
                action: "vote on",
                status: proposal.status,
            });
        }
        if height > proposal.voting_deadline_height {
            return Err(GovernanceError::DeadlinePassed {
                proposal_id: msg.proposal_id.clone(),
                action: "voting",
                deadline: proposal.voting_deadline_height,
            });
        }
        let pass_percentage = proposal.pass_percentage;
        let power = ctx
            .validators
            .voting_power(&msg.validator_address)
            .filter(|power| *power > 0)
            .ok_or(GovernanceError::NotAValidator(msg.validator_address))?;

        let replaced = self.voting.record_vote(
            &msg.proposal_id,
            ProposalVote {
                validator: msg.validator_address,
                opinion: msg.opinion,
                voting_power_at_cast: power,
                height,
            },
        );
        if replaced.is_some() {
            debug!("Validator {} replaced its vote on {}", msg.validator_address, msg.proposal_id);
        }
        audit_log::log_vote_cast(&msg.proposal_id, &msg.validator_address, msg.opinion, power);
        let mut events = vec![GovernanceEvent::VoteCast {
            proposal_id: msg.proposal_id.clone(),
            validator: msg.validator_address,
            opinion: msg.opinion,
            power,
        }];

        let tally = self.voting.tally(&msg.proposal_id, &ctx.validators.active_powers());
        let outcome = match decide(&tally, pass_percentage, false) {
            Decision::Pass => Some(ProposalOutcome::CompletedYes),
            Decision::Fail => Some(ProposalOutcome::CompletedNo),
            Decision::Pending | Decision::NoQuorum => None,
        };
        if let Some(outcome) = outcome {
            self.complete(&msg.proposal_id, outcome, height, &mut events)?;
        }
        Ok(events)
    }

    fn prepare_finalize(
        &self,
        proposal: &Proposal,
        funds: Amount,
        validators: &[Address],
        height: u64,
    ) -> GovernanceResult<(DistributionPlan, Vec<OptionValue>)> {
        let table = match proposal.outcome {
            ProposalOutcome::CompletedYes => &proposal.passed_fund_distribution,
            _ => &proposal.failed_fund_distribution,
        };
        let plan = plan_distribution(
            funds,
            table,
            Recipients {
                proposer: proposal.proposer,
                execution_cost: proposal.execution_cost_address,
                bounty_program: proposal.bounty_program_address,
            },
            validators,
        )?;

        let applies_config = proposal.proposal_type == ProposalType::ConfigUpdate
            && proposal.outcome == ProposalOutcome::CompletedYes;
        let values = match (&proposal.config_update, applies_config) {
            (Some(payload), true) => {
                self.registry.prepare_update(payload, height, &self.validator)?
            }
            (None, true) => {
                return Err(GovernanceError::MalformedConfigUpdate(
                    "config update proposal has no payload".to_string(),
                ))
            }
            (_, false) => Vec::new(),
        };
        Ok((plan, values))
    }

    /// Distributes a decided proposal's escrow and, for a passed
    /// ConfigUpdate, writes its payload into the option registry.
    ///
    /// If distribution or the option update fails, the proposal is committed
    /// as FinalizeFailed with its escrow intact.
    pub fn finalize_proposal(
        &mut self,
        signer: Address,
        msg: &FinalizeProposal,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        let height = ctx.height;
        let proposal = self.store.get(&msg.proposal_id)?;
        check_signer("finalize proposal", proposal.proposer, msg.proposer)?;
        check_signer("finalize proposal", proposal.proposer, signer)?;
        let proposal = self.store.ensure_finalizable(&msg.proposal_id)?;

        let funds = self.escrow.current_funds(&msg.proposal_id);
        let outcome = proposal.outcome;
        let validators: Vec<Address> = ctx.validators.active_powers().keys().copied().collect();
        let attempt = self
            .prepare_finalize(proposal, funds, &validators, height)
            .and_then(|(plan, values)| {
                ctx.ledger.apply_batch(&plan.to_ops())?;
                Ok(values)
            });

        match attempt {
            Ok(values) => {
                let categories = self.registry.commit(values, height);
                self.escrow.mark_distributed(&msg.proposal_id);
                self.store.mark_finalized(&msg.proposal_id, height)?;
                info!(
                    "Finalized proposal {} ({:?}), distributed {}",
                    msg.proposal_id, outcome, funds
                );
                audit_log::log_proposal_finalized(&msg.proposal_id, funds, height);

                let mut events = vec![GovernanceEvent::ProposalFinalized {
                    proposal_id: msg.proposal_id.clone(),
                    outcome,
                    distributed: funds,
                }];
                if !categories.is_empty() {
                    audit_log::log_options_updated(&msg.proposal_id, &categories, height);
                    events.push(GovernanceEvent::OptionsUpdated {
                        proposal_id: msg.proposal_id.clone(),
                        categories,
                        height,
                    });
                }
                Ok(events)
            }
            Err(err) => {
                self.store.mark_finalize_failed(&msg.proposal_id, err.to_string(), height)?;
                error!(
                    "Finalize of proposal {} failed, escrow stays withdrawable: {}",
                    msg.proposal_id, err
                );
                audit_log::log_finalize_failed(&msg.proposal_id, &err);
                Ok(vec![GovernanceEvent::FinalizeFailed {
                    proposal_id: msg.proposal_id.clone(),
                    kind: err.kind(),
                    reason: err.to_string(),
                }])
            }
        }
    }

    /// Returns escrowed funds of a completed, undistributed proposal to a beneficiary.
    pub fn withdraw_funds(
        &mut self,
        signer: Address,
        msg: &WithdrawProposalFunds,
        ctx: &mut BlockContext<'_>,
    ) -> GovernanceResult<Vec<GovernanceEvent>> {
        check_signer("withdraw funds", msg.funder_address, signer)?;
        let proposal = self.store.get(&msg.proposal_id)?;
        let amount = msg.withdraw_value.value;
        self.escrow.check_withdraw(proposal, &msg.funder_address, amount)?;
        let currency = self.registry.fee_currency(ctx.height)?;
        self.validator.validate_coin(&msg.withdraw_value, &currency)?;

        ctx.ledger.apply_batch(&[BalanceOp::Credit {
            account: msg.beneficiary_address,
            amount,
        }])?;
        let remaining = self.escrow.withdraw(proposal, &msg.funder_address, amount)?;
        info!(
            "Withdrew {} of {}'s funds from proposal {} to {}, {} left",
            amount, msg.funder_address, msg.proposal_id, msg.beneficiary_address, remaining
        );
        audit_log::log_funds_withdrawn(
            &msg.proposal_id,
            &msg.funder_address,
            &msg.beneficiary_address,
            amount,
        );
        Ok(vec![GovernanceEvent::FundsWithdrawn {
            proposal_id: msg.proposal_id.clone(),
            funder: msg.funder_address,
            beneficiary: msg.beneficiary_address,
            amount,
        }])
    }

    /// Expires funding and voting deadlines that fall at or below `height`.
    /// Runs after every transaction of the block has been applied.
    pub fn end_block(
        &mut self,
        height: u64,
        validators: &dyn ValidatorSet,
    ) -> Vec<GovernanceEvent> {
        let mut events = Vec::new();

        for proposal_id in self.store.take_expired_funding(height) {
            let outcome = ProposalOutcome::InsufficientFunds;
            if let Err(err) = self.complete(&proposal_id, outcome, height, &mut events) {
                error!("Could not expire funding of proposal {}: {}", proposal_id, err);
            }
        }

        let expired_voting = self.store.take_expired_voting(height);
        if !expired_voting.is_empty() {
            let powers = validators.active_powers();
            for proposal_id in expired_voting {
                let pass_percentage = match self.store.get(&proposal_id) {
                    Ok(proposal) => proposal.pass_percentage,
                    Err(err) => {
                        error!("Expired proposal {} vanished: {}", proposal_id, err);
                        continue;
                    }
                };
                let tally = self.voting.tally(&proposal_id, &powers);
                let outcome = match decide(&tally, pass_percentage, true) {
                    Decision::Pass => ProposalOutcome::CompletedYes,
                    Decision::Fail => ProposalOutcome::CompletedNo,
                    Decision::NoQuorum | Decision::Pending => ProposalOutcome::InsufficientVotes,
                };
                if let Err(err) = self.complete(&proposal_id, outcome, height, &mut events) {
                    error!("Could not expire voting of proposal {}: {}", proposal_id, err);
                }
            }
        }

        if !events.is_empty() {
            debug!("End of block {} produced {} governance events", height, events.len());
        }
        events
    }

    /// Publishes the state after block `height` to readers.
    ///
    /// The clones below copy `Arc`s. Records the block did not touch stay
    /// shared with the previous snapshot.
    pub fn commit(
        &mut self,
        height: u64,
        validators: &dyn ValidatorSet,
    ) -> Arc<GovernanceSnapshot> {
        self.committed_height = height;
        self.snapshots.publish(GovernanceSnapshot {
            height,
            proposals: self.store.clone(),
            escrow: self.escrow.clone(),
            votes: self.voting.clone(),
            registry: self.registry.clone(),
            validator_powers: validators.active_powers(),
        });
        self.snapshots.load()
    }

    /// Delivers every transaction of a block in order, runs the deadline
    /// hook and commits.
    pub fn process_block(
        &mut self,
        height: u64,
        txs: &[SignedTx],
        ledger: &mut dyn BalanceLedger,
        validators: &dyn ValidatorSet,
    ) -> BlockResult {
        let mut ctx = BlockContext::new(height, ledger, validators);
        let receipts: Vec<TxReceipt> = txs.iter().map(|tx| self.deliver_tx(tx, &mut ctx)).collect();
        let end_block_events = self.end_block(height, validators);
        let snapshot = self.commit(height, validators);
        BlockResult {
            height,
            receipts,
            end_block_events,
            snapshot,
        }
    }

    /// Get governance statistics
    pub fn get_governance_stats(&self) -> GovernanceStats {
        let mut stats = GovernanceStats {
            total_proposals: self.store.len(),
            total_votes: self.voting.total_votes(),
            option_updates: self.registry.get_stats().updates_applied,
            ..GovernanceStats::default()
        };
        for proposal in self.store.iter() {
            match proposal.state() {
                ProposalState::Active => stats.active_proposals += 1,
                ProposalState::Passed => stats.passed_proposals += 1,
                ProposalState::Failed => stats.failed_proposals += 1,
                ProposalState::Finalized => stats.finalized_proposals += 1,
                ProposalState::FinalizeFailed => stats.finalize_failed_proposals += 1,
            }
        }
        stats
    }
}

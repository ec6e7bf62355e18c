//! OLT Governance Engine
//!
//! This crate implements funded, validator-voted governance proposals:
//! escrowed funding, weighted voting with early decisions, fund distribution
//! at finalization, and the versioned option registry that ConfigUpdate
//! proposals change.

pub mod audit_log;
pub mod error;
pub mod escrow;
pub mod events;
pub mod fund_distribution;
pub mod governance_coordinator;
pub mod ledger;
pub mod parameter_manager;
pub mod proposal_store;
pub mod proposal_validation;
pub mod query;
pub mod snapshot;
pub mod voting_coordinator;

pub use error::{ErrorKind, GovernanceError, GovernanceResult};
pub use escrow::{EscrowLedger, ProposalEscrow};
pub use events::{GovernanceEvent, TxOutcome, TxReceipt};
pub use fund_distribution::{plan_distribution, DistributionPlan, Recipients};
pub use governance_coordinator::{
    BlockContext, BlockResult, GovernanceCoordinator, GovernanceCoordinatorConfig, GovernanceStats,
};
pub use ledger::{
    BalanceLedger, BalanceOp, LedgerError, MemoryLedger, StaticValidatorSet, ValidatorSet,
};
pub use parameter_manager::{OptionRegistry, OptionRegistryStats, OptionVersion};
pub use proposal_store::ProposalStore;
pub use proposal_validation::{ProposalValidationConfig, ProposalValidator};
pub use query::{
    FunderPosition, FunderProposalsResponse, FundsResponse, GovernanceOptionsResponse,
    GovernanceQueryService, ListProposalsResponse, ProposalFilter, ProposalOptionsResponse,
    ProposalStat,
};
pub use snapshot::{GovernanceSnapshot, SnapshotHandle};
pub use voting_coordinator::{decide, tally, Decision, Tally, VotingCoordinator};

// Re-export commonly used types
pub use olt_shared_types::governance::*;

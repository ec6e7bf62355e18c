//! Immutable views of committed governance state for readers.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use olt_shared_types::{Address, Hash};
use serde::Serialize;

use crate::escrow::EscrowLedger;
use crate::parameter_manager::OptionRegistry;
use crate::proposal_store::ProposalStore;
use crate::voting_coordinator::VotingCoordinator;

/// Governance state as of the end of a committed block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceSnapshot {
    pub height: u64,
    pub proposals: ProposalStore,
    pub escrow: EscrowLedger,
    pub votes: VotingCoordinator,
    pub registry: OptionRegistry,
    /// Active validator powers at commit, used for vote statistics.
    pub validator_powers: BTreeMap<Address, u64>,
}

impl GovernanceSnapshot {
    /// BLAKE3 over the canonical encoding of the snapshot.
    pub fn state_hash(&self) -> Result<Hash, bincode::Error> {
        Ok(blake3::hash(&bincode::serialize(self)?).into())
    }
}

/// Shared slot holding the latest committed snapshot.
///
/// Readers clone the inner `Arc` and drop the lock immediately, so a
/// long-running query never holds up the writer publishing the next block.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Arc<GovernanceSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new(initial: GovernanceSnapshot) -> Self {
        SnapshotHandle {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn load(&self) -> Arc<GovernanceSnapshot> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn publish(&self, snapshot: GovernanceSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
    }
}

//! Block replay driver
//!
//! Feeds recorded blocks through the governance engine in height order:
//! every transaction of a block is delivered, then the end-of-block deadline
//! hook runs and the resulting state is committed for readers.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use olt_governance::{
    GovernanceCoordinator, GovernanceEvent, GovernanceQueryService, MemoryLedger,
    StaticValidatorSet, TxReceipt,
};
use olt_shared_types::transaction::SignedTx;
use serde::{Deserialize, Serialize};

use crate::genesis::GenesisConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub height: u64,
    #[serde(default)]
    pub txs: Vec<SignedTx>,
}

/// What a replay produced.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub blocks: usize,
    pub committed_txs: usize,
    pub rejected_txs: usize,
    pub receipts: Vec<TxReceipt>,
    pub end_block_events: Vec<GovernanceEvent>,
    pub final_height: u64,
}

pub fn parse_blocks(json: &str) -> Result<Vec<Block>> {
    serde_json::from_str(json).context("invalid blocks JSON")
}

pub fn load_blocks(path: &Path) -> Result<Vec<Block>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read blocks {}", path.display()))?;
    parse_blocks(&text).with_context(|| format!("in {}", path.display()))
}

/// The engine together with its in-memory collaborators.
pub struct Node {
    coordinator: GovernanceCoordinator,
    ledger: MemoryLedger,
    validators: StaticValidatorSet,
}

impl Node {
    pub fn from_genesis(genesis: &GenesisConfig) -> Self {
        Node {
            coordinator: genesis.coordinator(),
            ledger: genesis.ledger(),
            validators: genesis.validator_set(),
        }
    }

    pub fn coordinator(&self) -> &GovernanceCoordinator {
        &self.coordinator
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn queries(&self) -> GovernanceQueryService {
        GovernanceQueryService::new(self.coordinator.snapshot_handle())
    }

    /// Replays `blocks`, whose heights must be strictly increasing and above
    /// the last committed height.
    pub fn replay(&mut self, blocks: &[Block]) -> Result<ReplayReport> {
        let mut report = ReplayReport {
            final_height: self.coordinator.committed_height(),
            ..ReplayReport::default()
        };

        for block in blocks {
            if block.height <= report.final_height {
                bail!(
                    "block height {} does not follow committed height {}",
                    block.height,
                    report.final_height
                );
            }
            let result = self
                .coordinator
                .process_block(block.height, &block.txs, &mut self.ledger, &self.validators);

            for receipt in &result.receipts {
                if let Some(kind) = receipt.rejection() {
                    warn!("Block {}: {} rejected ({:?})", block.height, receipt.tx_type, kind);
                    report.rejected_txs += 1;
                } else {
                    debug!("Block {}: {} committed", block.height, receipt.tx_type);
                    report.committed_txs += 1;
                }
            }
            info!(
                "Committed block {} with {} transactions and {} deadline events",
                block.height,
                block.txs.len(),
                result.end_block_events.len()
            );

            report.blocks += 1;
            report.final_height = block.height;
            report.receipts.extend(result.receipts);
            report.end_block_events.extend(result.end_block_events);
        }
        Ok(report)
    }
}

//! Governance option categories.
//!
//! Each category is a plain struct with camelCase wire names. The registry in
//! `olt-governance` stores one versioned value per category and rewrites them
//! through finalized ConfigUpdate proposals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::governance::ProposalType;
use crate::{Address, Amount, ParseError, BASIS_POINTS};

/// The option categories known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionCategory {
    Proposal,
    Staking,
    Fee,
    Evidence,
    Ons,
    Rewards,
    Currency,
}

impl OptionCategory {
    pub const ALL: [OptionCategory; 7] = [
        OptionCategory::Proposal,
        OptionCategory::Staking,
        OptionCategory::Fee,
        OptionCategory::Evidence,
        OptionCategory::Ons,
        OptionCategory::Rewards,
        OptionCategory::Currency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionCategory::Proposal => "proposal",
            OptionCategory::Staking => "staking",
            OptionCategory::Fee => "fee",
            OptionCategory::Evidence => "evidence",
            OptionCategory::Ons => "ons",
            OptionCategory::Rewards => "rewards",
            OptionCategory::Currency => "currency",
        }
    }
}

impl fmt::Display for OptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseError::UnknownVariant {
                kind: "option category",
                value: s.to_string(),
            })
    }
}

/// How escrowed funds are split at finalization, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FundDistribution {
    /// Split equally among the active validator set.
    pub validators: u16,
    pub fee_pool: u16,
    /// Removed from circulation.
    pub burn: u16,
    /// Paid to the proposal execution cost address.
    pub execution_cost: u16,
    /// Paid to the bounty program address.
    pub bounty_pool: u16,
    pub proposer_reward: u16,
}

impl FundDistribution {
    /// Sum of all shares. A valid table sums to exactly 10000.
    pub fn total(&self) -> u32 {
        [
            self.validators,
            self.fee_pool,
            self.burn,
            self.execution_cost,
            self.bounty_pool,
            self.proposer_reward,
        ]
        .iter()
        .map(|share| u32::from(*share))
        .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.total() == u32::from(BASIS_POINTS)
    }
}

/// Parameters applied to proposals of a single type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProposalOptions {
    /// Minimum amount the proposer must escrow at creation.
    pub initial_funding: Amount,
    pub funding_goal: Amount,
    /// Length of the funding phase in blocks, counted from creation.
    pub funding_deadline: u64,
    /// Length of the voting phase in blocks, counted from the funding deadline.
    pub voting_deadline: u64,
    /// Integer percent of active voting power required to pass.
    pub pass_percentage: u64,
    pub passed_fund_distribution: FundDistribution,
    pub failed_fund_distribution: FundDistribution,
    /// Recipient of the execution cost share.
    pub proposal_execution_cost: Address,
}

/// The `proposal` category: one parameter set per proposal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProposalOptionSet {
    pub config_update: ProposalOptions,
    pub code_change: ProposalOptions,
    pub general: ProposalOptions,
    pub bounty_program_addr: Address,
}

impl ProposalOptionSet {
    pub fn for_type(&self, proposal_type: ProposalType) -> &ProposalOptions {
        match proposal_type {
            ProposalType::ConfigUpdate => &self.config_update,
            ProposalType::CodeChange => &self.code_change,
            ProposalType::General => &self.general,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeeOptions {
    pub fee_currency: String,
    pub min_fee_decimal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StakingOptions {
    pub min_self_delegation_amount: Amount,
    pub min_delegation_amount: Amount,
    pub top_validator_count: u64,
    pub maturity_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvidenceOptions {
    pub min_votes_required: u64,
    pub block_votes_diff: u64,
    pub penalty_base_percentage: u64,
    pub penalty_bounty_percentage: u64,
    pub penalty_burn_percentage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OnsOptions {
    pub currency: String,
    pub per_block_fees: Amount,
    pub base_domain_price: Amount,
    pub first_level_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RewardOptions {
    pub reward_currency: String,
    pub reward_interval: u64,
    pub reward_pool_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CurrencyEntry {
    pub name: String,
    pub chain: String,
    pub decimal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CurrencyOptions {
    pub currencies: Vec<CurrencyEntry>,
}

/// The value of a single category, as a closed union over every known category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "value", rename_all = "camelCase")]
pub enum OptionValue {
    Proposal(ProposalOptionSet),
    Staking(StakingOptions),
    Fee(FeeOptions),
    Evidence(EvidenceOptions),
    Ons(OnsOptions),
    Rewards(RewardOptions),
    Currency(CurrencyOptions),
}

impl OptionValue {
    pub fn category(&self) -> OptionCategory {
        match self {
            OptionValue::Proposal(_) => OptionCategory::Proposal,
            OptionValue::Staking(_) => OptionCategory::Staking,
            OptionValue::Fee(_) => OptionCategory::Fee,
            OptionValue::Evidence(_) => OptionCategory::Evidence,
            OptionValue::Ons(_) => OptionCategory::Ons,
            OptionValue::Rewards(_) => OptionCategory::Rewards,
            OptionValue::Currency(_) => OptionCategory::Currency,
        }
    }

    /// The bare category body as JSON, without the union tag.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            OptionValue::Proposal(v) => serde_json::to_value(v),
            OptionValue::Staking(v) => serde_json::to_value(v),
            OptionValue::Fee(v) => serde_json::to_value(v),
            OptionValue::Evidence(v) => serde_json::to_value(v),
            OptionValue::Ons(v) => serde_json::to_value(v),
            OptionValue::Rewards(v) => serde_json::to_value(v),
            OptionValue::Currency(v) => serde_json::to_value(v),
        }
    }

    /// Parses a bare category body back into the typed value for `category`.
    /// Unknown fields and type mismatches are errors.
    pub fn from_body_json(
        category: OptionCategory,
        body: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match category {
            OptionCategory::Proposal => OptionValue::Proposal(serde_json::from_value(body)?),
            OptionCategory::Staking => OptionValue::Staking(serde_json::from_value(body)?),
            OptionCategory::Fee => OptionValue::Fee(serde_json::from_value(body)?),
            OptionCategory::Evidence => OptionValue::Evidence(serde_json::from_value(body)?),
            OptionCategory::Ons => OptionValue::Ons(serde_json::from_value(body)?),
            OptionCategory::Rewards => OptionValue::Rewards(serde_json::from_value(body)?),
            OptionCategory::Currency => OptionValue::Currency(serde_json::from_value(body)?),
        })
    }
}

/// Every option category at once, as stored in genesis and returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GovernanceOptions {
    pub proposal: ProposalOptionSet,
    pub staking: StakingOptions,
    pub fee: FeeOptions,
    pub evidence: EvidenceOptions,
    pub ons: OnsOptions,
    pub rewards: RewardOptions,
    pub currency: CurrencyOptions,
}

impl GovernanceOptions {
    pub fn get(&self, category: OptionCategory) -> OptionValue {
        match category {
            OptionCategory::Proposal => OptionValue::Proposal(self.proposal.clone()),
            OptionCategory::Staking => OptionValue::Staking(self.staking.clone()),
            OptionCategory::Fee => OptionValue::Fee(self.fee.clone()),
            OptionCategory::Evidence => OptionValue::Evidence(self.evidence.clone()),
            OptionCategory::Ons => OptionValue::Ons(self.ons.clone()),
            OptionCategory::Rewards => OptionValue::Rewards(self.rewards.clone()),
            OptionCategory::Currency => OptionValue::Currency(self.currency.clone()),
        }
    }

    pub fn set(&mut self, value: OptionValue) {
        match value {
            OptionValue::Proposal(v) => self.proposal = v,
            OptionValue::Staking(v) => self.staking = v,
            OptionValue::Fee(v) => self.fee = v,
            OptionValue::Evidence(v) => self.evidence = v,
            OptionValue::Ons(v) => self.ons = v,
            OptionValue::Rewards(v) => self.rewards = v,
            OptionValue::Currency(v) => self.currency = v,
        }
    }
}

fn dev_address(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xee;
    bytes[19] = tag;
    Address(bytes)
}

impl Default for ProposalOptionSet {
    fn default() -> Self {
        let execution_cost = dev_address(0x01);
        let passed = FundDistribution {
            validators: 1800,
            fee_pool: 1800,
            burn: 1800,
            execution_cost: 1800,
            bounty_pool: 1000,
            proposer_reward: 1800,
        };
        let failed = FundDistribution {
            validators: 1000,
            fee_pool: 1000,
            burn: 1000,
            execution_cost: 0,
            bounty_pool: 5000,
            proposer_reward: 2000,
        };
        let with = |initial: u64, goal: u64| ProposalOptions {
            initial_funding: Amount::from_u64(initial),
            funding_goal: Amount::from_u64(goal),
            funding_deadline: 36400, // about 2 days of blocks
            voting_deadline: 36400,
            pass_percentage: 51,
            passed_fund_distribution: passed,
            failed_fund_distribution: failed,
            proposal_execution_cost: execution_cost,
        };
        ProposalOptionSet {
            config_update: with(1_000, 10_000),
            code_change: with(1_000_000, 10_000_000),
            general: with(10_000, 100_000),
            bounty_program_addr: dev_address(0x02),
        }
    }
}

impl Default for GovernanceOptions {
    fn default() -> Self {
        GovernanceOptions {
            proposal: ProposalOptionSet::default(),
            staking: StakingOptions {
                min_self_delegation_amount: Amount::from_u64(3_000_000),
                min_delegation_amount: Amount::from_u64(1_000_000),
                top_validator_count: 32,
                maturity_time: 109_200,
            },
            fee: FeeOptions {
                fee_currency: "OLT".to_string(),
                min_fee_decimal: 9,
            },
            evidence: EvidenceOptions {
                min_votes_required: 2,
                block_votes_diff: 4,
                penalty_base_percentage: 30,
                penalty_bounty_percentage: 50,
                penalty_burn_percentage: 50,
            },
            ons: OnsOptions {
                currency: "OLT".to_string(),
                per_block_fees: Amount::from_u64(100),
                base_domain_price: Amount::from_u64(1_000_000),
                first_level_domains: vec!["ol".to_string()],
            },
            rewards: RewardOptions {
                reward_currency: "OLT".to_string(),
                reward_interval: 150,
                reward_pool_address: dev_address(0x03),
            },
            currency: CurrencyOptions {
                currencies: vec![CurrencyEntry {
                    name: "OLT".to_string(),
                    chain: "oneledger".to_string(),
                    decimal: 18,
                }],
            },
        }
    }
}

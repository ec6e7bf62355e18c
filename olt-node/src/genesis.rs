//! Genesis configuration loaded from TOML.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use log::info;
use olt_crypto::OltKeyPair;
use olt_governance::{
    GovernanceCoordinator, GovernanceCoordinatorConfig, MemoryLedger, ProposalValidationConfig,
    StaticValidatorSet,
};
use olt_shared_types::options::GovernanceOptions;
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Seeds of the development accounts in the default genesis.
pub const DEV_ACCOUNT_SEEDS: [u8; 3] = [0x01, 0x02, 0x03];
/// Seeds of the development validators in the default genesis.
pub const DEV_VALIDATOR_SEEDS: [u8; 4] = [0x65, 0x66, 0x67, 0x68];
const DEV_BALANCE: u64 = 1_000_000_000_000;
const DEV_VALIDATOR_POWER: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisAccount {
    pub address: Address,
    pub balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisValidator {
    pub address: Address,
    pub power: u64,
}

/// Limits on proposal text, not governable on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineLimits {
    pub max_headline_length: usize,
    pub max_description_length: usize,
    pub max_config_update_paths: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        let defaults = ProposalValidationConfig::default();
        Self {
            max_headline_length: defaults.max_headline_length,
            max_description_length: defaults.max_description_length,
            max_config_update_paths: defaults.max_config_update_paths,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisConfig {
    pub genesis_height: u64,
    #[serde(default)]
    pub limits: EngineLimits,
    pub accounts: Vec<GenesisAccount>,
    pub validators: Vec<GenesisValidator>,
    pub options: GovernanceOptions,
}

fn dev_address(seed: u8) -> Option<Address> {
    OltKeyPair::from_seed(&[seed; 32]).ok().map(|key| key.address())
}

impl Default for GenesisConfig {
    fn default() -> Self {
        GenesisConfig {
            genesis_height: 0,
            limits: EngineLimits::default(),
            accounts: DEV_ACCOUNT_SEEDS
                .iter()
                .filter_map(|seed| dev_address(*seed))
                .map(|address| GenesisAccount {
                    address,
                    balance: Amount::from_u64(DEV_BALANCE),
                })
                .collect(),
            validators: DEV_VALIDATOR_SEEDS
                .iter()
                .filter_map(|seed| dev_address(*seed))
                .map(|address| GenesisValidator {
                    address,
                    power: DEV_VALIDATOR_POWER,
                })
                .collect(),
            options: GovernanceOptions::default(),
        }
    }
}

impl GenesisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GenesisConfig = toml::from_str(text).context("invalid genesis TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read genesis {}", path.display()))?;
        let config = Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))?;
        info!(
            "Loaded genesis from {}: {} accounts, {} validators, height {}",
            path.display(),
            config.accounts.len(),
            config.validators.len(),
            config.genesis_height
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("cannot encode genesis as TOML")
    }

    /// Rejects a genesis the engine could not run on.
    pub fn validate(&self) -> Result<()> {
        let proposal = &self.options.proposal;
        for (name, params) in [
            ("configUpdate", &proposal.config_update),
            ("codeChange", &proposal.code_change),
            ("general", &proposal.general),
        ] {
            ensure!(
                params.passed_fund_distribution.is_complete(),
                "proposal.{}.passedFundDistribution must sum to 10000",
                name
            );
            ensure!(
                params.failed_fund_distribution.is_complete(),
                "proposal.{}.failedFundDistribution must sum to 10000",
                name
            );
            ensure!(
                !params.initial_funding.is_zero(),
                "proposal.{}.initialFunding must be positive",
                name
            );
        }

        let mut seen = BTreeSet::new();
        for validator in &self.validators {
            ensure!(validator.power > 0, "validator {} has no voting power", validator.address);
            ensure!(seen.insert(validator.address), "validator {} listed twice", validator.address);
        }
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            ensure!(seen.insert(account.address), "account {} listed twice", account.address);
        }
        Ok(())
    }

    pub fn coordinator_config(&self) -> GovernanceCoordinatorConfig {
        GovernanceCoordinatorConfig {
            proposal_validation: ProposalValidationConfig {
                max_headline_length: self.limits.max_headline_length,
                max_description_length: self.limits.max_description_length,
                max_config_update_paths: self.limits.max_config_update_paths,
            },
            genesis_height: self.genesis_height,
        }
    }

    pub fn coordinator(&self) -> GovernanceCoordinator {
        GovernanceCoordinator::new(self.coordinator_config(), self.options.clone())
    }

    pub fn ledger(&self) -> MemoryLedger {
        MemoryLedger::with_balances(
            self.accounts
                .iter()
                .map(|account| (account.address, account.balance)),
        )
    }

    pub fn validator_set(&self) -> StaticValidatorSet {
        StaticValidatorSet::new(self.validators.iter().map(|v| (v.address, v.power)))
    }
}

//! Proposal validation for OLT governance
//!
//! Checks run before a CreateProposal is accepted, plus the bounds every
//! governance option must respect after a ConfigUpdate rewrites it.

use log::debug;
use olt_shared_types::governance::ProposalType;
use olt_shared_types::options::{
    EvidenceOptions, FeeOptions, FundDistribution, OnsOptions, OptionValue, ProposalOptionSet,
    ProposalOptions, StakingOptions,
};
use olt_shared_types::transaction::{CreateProposal, Fee};
use olt_shared_types::{Amount, Coin, U256};

use crate::error::{GovernanceError, GovernanceResult};

/// Configuration for proposal validation
#[derive(Debug, Clone)]
pub struct ProposalValidationConfig {
    pub max_headline_length: usize,
    pub max_description_length: usize,
    /// Maximum number of option paths a single ConfigUpdate may touch.
    pub max_config_update_paths: usize,
}

impl Default for ProposalValidationConfig {
    fn default() -> Self {
        Self {
            max_headline_length: 256,
            max_description_length: 8192,
            max_config_update_paths: 32,
        }
    }
}

/// Validates proposal contents and option changes
#[derive(Debug, Clone, Default)]
pub struct ProposalValidator {
    config: ProposalValidationConfig,
}

fn malformed(message: impl Into<String>) -> GovernanceError {
    GovernanceError::MalformedConfigUpdate(message.into())
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> GovernanceResult<()> {
    if value < min || value > max {
        return Err(malformed(format!("{} must be within [{}, {}], got {}", name, min, max, value)));
    }
    Ok(())
}

fn check_amount_range(
    name: &str,
    value: Amount,
    min: u64,
    max: Option<u64>,
) -> GovernanceResult<()> {
    let too_low = value < Amount::from_u64(min);
    let too_high = max.map(|max| value > Amount::from_u64(max)).unwrap_or(false);
    if too_low || too_high {
        let upper = max.map(|m| m.to_string()).unwrap_or_else(|| "inf".to_string());
        return Err(malformed(format!(
            "{} must be within [{}, {}], got {}",
            name, min, upper, value
        )));
    }
    Ok(())
}

fn check_immutable<T: PartialEq>(name: &str, old: &T, new: &T) -> GovernanceResult<()> {
    if old != new {
        return Err(malformed(format!("{} cannot be changed", name)));
    }
    Ok(())
}

impl ProposalValidator {
    // Option bounds.
    pub const MIN_PASS_PERCENTAGE: u64 = 51;
    pub const MAX_PASS_PERCENTAGE: u64 = 67;
    pub const MIN_DEADLINE: u64 = 36_400;
    pub const MAX_DEADLINE: u64 = 156_000;
    pub const FUNDING_GOAL_MULTIPLIER: u64 = 3;
    pub const MAX_FEE_DECIMAL: u64 = 18;
    pub const MIN_DELEGATION: u64 = 1_000_000;
    pub const MAX_DELEGATION: u64 = 10_000_000;
    pub const MIN_VALIDATOR_COUNT: u64 = 8;
    pub const MAX_VALIDATOR_COUNT: u64 = 64;
    pub const MIN_MATURITY_TIME: u64 = 109_200;
    pub const MAX_MATURITY_TIME: u64 = 234_000;

    pub fn new(config: ProposalValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProposalValidationConfig {
        &self.config
    }

    /// Validates a CreateProposal against the options snapshotted for its type.
    pub fn validate_create(
        &self,
        msg: &CreateProposal,
        options: &ProposalOptions,
        currency: &str,
    ) -> GovernanceResult<()> {
        let headline = msg.headline.trim();
        if headline.is_empty() {
            return Err(GovernanceError::InvalidProposal("headline is empty".to_string()));
        }
        if msg.headline.len() > self.config.max_headline_length {
            return Err(GovernanceError::InvalidProposal(format!(
                "headline longer than {} bytes",
                self.config.max_headline_length
            )));
        }
        if msg.description.len() > self.config.max_description_length {
            return Err(GovernanceError::InvalidProposal(format!(
                "description longer than {} bytes",
                self.config.max_description_length
            )));
        }

        self.validate_coin(&msg.initial_funding, currency)?;
        if msg.initial_funding.value < options.initial_funding {
            return Err(GovernanceError::BelowMinimum {
                required: options.initial_funding,
                provided: msg.initial_funding.value,
            });
        }

        if let Some(goal) = msg.funding_goal {
            if goal != options.funding_goal {
                return Err(GovernanceError::InvalidProposal(format!(
                    "funding goal {} does not match the configured {}",
                    goal, options.funding_goal
                )));
            }
        }
        if let Some(deadline) = msg.funding_deadline {
            if deadline != options.funding_deadline {
                return Err(GovernanceError::InvalidProposal(format!(
                    "funding deadline {} does not match the configured {}",
                    deadline, options.funding_deadline
                )));
            }
        }
        if let Some(deadline) = msg.voting_deadline {
            if deadline != options.voting_deadline {
                return Err(GovernanceError::InvalidProposal(format!(
                    "voting deadline {} does not match the configured {}",
                    deadline, options.voting_deadline
                )));
            }
        }
        if let Some(pass) = msg.pass_percentage {
            if pass != options.pass_percentage {
                return Err(GovernanceError::InvalidProposal(format!(
                    "pass percentage {} does not match the configured {}",
                    pass, options.pass_percentage
                )));
            }
        }

        match (msg.proposal_type, &msg.config_update) {
            (ProposalType::ConfigUpdate, None) => Err(GovernanceError::InvalidProposal(
                "config update proposal without a payload".to_string(),
            )),
            (ProposalType::ConfigUpdate, Some(payload)) if payload.is_empty() => Err(
                GovernanceError::InvalidProposal("config update payload is empty".to_string()),
            ),
            (ProposalType::ConfigUpdate, Some(payload))
                if payload.len() > self.config.max_config_update_paths =>
            {
                Err(GovernanceError::InvalidProposal(format!(
                    "config update touches more than {} paths",
                    self.config.max_config_update_paths
                )))
            }
            (ProposalType::ConfigUpdate, Some(_)) => Ok(()),
            (_, Some(_)) => Err(GovernanceError::InvalidProposal(format!(
                "{} proposal cannot carry a config update",
                msg.proposal_type
            ))),
            (_, None) => Ok(()),
        }
    }

    /// A coin must be in the governance currency and positive.
    pub fn validate_coin(&self, coin: &Coin, currency: &str) -> GovernanceResult<()> {
        if coin.currency != currency {
            return Err(GovernanceError::InvalidTransaction(format!(
                "expected currency {}, got {}",
                currency, coin.currency
            )));
        }
        if coin.value.is_zero() {
            return Err(GovernanceError::InvalidTransaction("amount must be positive".to_string()));
        }
        Ok(())
    }

    /// Fees are carried, not charged; only their shape is checked.
    pub fn validate_fee(&self, fee: &Fee, currency: &str) -> GovernanceResult<()> {
        if fee.gas == 0 {
            return Err(GovernanceError::InvalidTransaction("gas must be positive".to_string()));
        }
        if fee.gas_price.currency != currency {
            return Err(GovernanceError::InvalidTransaction(format!(
                "gas price must be in {}, got {}",
                currency, fee.gas_price.currency
            )));
        }
        Ok(())
    }

    /// Checks a rewritten option category against the one it replaces.
    /// Only fields that changed are range checked.
    pub fn validate_option_change(
        &self,
        old: &OptionValue,
        new: &OptionValue,
    ) -> GovernanceResult<()> {
        debug!("Validating {} option change", new.category());
        match (old, new) {
            (OptionValue::Proposal(old), OptionValue::Proposal(new)) => {
                self.validate_proposal_set(old, new)
            }
            (OptionValue::Staking(old), OptionValue::Staking(new)) => {
                self.validate_staking(old, new)
            }
            (OptionValue::Fee(old), OptionValue::Fee(new)) => self.validate_fee_options(old, new),
            (OptionValue::Evidence(old), OptionValue::Evidence(new)) => {
                self.validate_evidence(old, new)
            }
            (OptionValue::Ons(old), OptionValue::Ons(new)) => self.validate_ons(old, new),
            (OptionValue::Rewards(_), OptionValue::Rewards(_)) => {
                Err(malformed("rewards options are not governable"))
            }
            (OptionValue::Currency(_), OptionValue::Currency(_)) => {
                Err(malformed("currency options are not governable"))
            }
            _ => Err(malformed(format!(
                "cannot replace {} options with {} options",
                old.category(),
                new.category()
            ))),
        }
    }

    fn validate_proposal_set(
        &self,
        old: &ProposalOptionSet,
        new: &ProposalOptionSet,
    ) -> GovernanceResult<()> {
        check_immutable(
            "proposal.bountyProgramAddr",
            &old.bounty_program_addr,
            &new.bounty_program_addr,
        )?;
        let kinds = [
            ("configUpdate", &old.config_update, &new.config_update, 1, Some(100_000)),
            ("codeChange", &old.code_change, &new.code_change, 1_000_000, None),
            ("general", &old.general, &new.general, 10_000, None),
        ];
        for (name, old, new, min_initial, max_initial) in kinds {
            self.validate_proposal_options(name, old, new, min_initial, max_initial)?;
        }
        Ok(())
    }

    fn validate_proposal_options(
        &self,
        name: &str,
        old: &ProposalOptions,
        new: &ProposalOptions,
        min_initial: u64,
        max_initial: Option<u64>,
    ) -> GovernanceResult<()> {
        let path = |field: &str| format!("proposal.{}.{}", name, field);

        check_immutable(
            &path("proposalExecutionCost"),
            &old.proposal_execution_cost,
            &new.proposal_execution_cost,
        )?;
        if new.initial_funding != old.initial_funding {
            check_amount_range(
                &path("initialFunding"),
                new.initial_funding,
                min_initial,
                max_initial,
            )?;
        }
        if new.initial_funding != old.initial_funding || new.funding_goal != old.funding_goal {
            let floor = new
                .initial_funding
                .as_u256()
                .checked_mul(U256::from(Self::FUNDING_GOAL_MULTIPLIER))
                .ok_or_else(|| malformed(format!("{} overflows", path("initialFunding"))))?;
            if new.funding_goal.as_u256() < floor {
                return Err(malformed(format!(
                    "{} must be at least {} times the initial funding",
                    path("fundingGoal"),
                    Self::FUNDING_GOAL_MULTIPLIER
                )));
            }
        }
        if new.funding_deadline != old.funding_deadline {
            check_range(
                &path("fundingDeadline"),
                new.funding_deadline,
                Self::MIN_DEADLINE,
                Self::MAX_DEADLINE,
            )?;
        }
        if new.voting_deadline != old.voting_deadline {
            check_range(
                &path("votingDeadline"),
                new.voting_deadline,
                Self::MIN_DEADLINE,
                Self::MAX_DEADLINE,
            )?;
        }
        if new.pass_percentage != old.pass_percentage {
            check_range(
                &path("passPercentage"),
                new.pass_percentage,
                Self::MIN_PASS_PERCENTAGE,
                Self::MAX_PASS_PERCENTAGE,
            )?;
        }
        Self::check_distribution(&path("passedFundDistribution"), &new.passed_fund_distribution)?;
        Self::check_distribution(&path("failedFundDistribution"), &new.failed_fund_distribution)?;
        Ok(())
    }

    fn check_distribution(name: &str, table: &FundDistribution) -> GovernanceResult<()> {
        if !table.is_complete() {
            return Err(malformed(format!(
                "{} must sum to 10000 basis points, got {}",
                name,
                table.total()
            )));
        }
        Ok(())
    }

    fn validate_staking(&self, old: &StakingOptions, new: &StakingOptions) -> GovernanceResult<()> {
        if new.min_delegation_amount != old.min_delegation_amount {
            check_amount_range(
                "staking.minDelegationAmount",
                new.min_delegation_amount,
                Self::MIN_DELEGATION,
                Some(Self::MAX_DELEGATION),
            )?;
        }
        if new.min_self_delegation_amount != old.min_self_delegation_amount {
            check_amount_range(
                "staking.minSelfDelegationAmount",
                new.min_self_delegation_amount,
                Self::MIN_DELEGATION,
                Some(Self::MAX_DELEGATION),
            )?;
        }
        if new.top_validator_count != old.top_validator_count {
            check_range(
                "staking.topValidatorCount",
                new.top_validator_count,
                Self::MIN_VALIDATOR_COUNT,
                Self::MAX_VALIDATOR_COUNT,
            )?;
        }
        if new.maturity_time != old.maturity_time {
            check_range(
                "staking.maturityTime",
                new.maturity_time,
                Self::MIN_MATURITY_TIME,
                Self::MAX_MATURITY_TIME,
            )?;
        }
        Ok(())
    }

    fn validate_fee_options(&self, old: &FeeOptions, new: &FeeOptions) -> GovernanceResult<()> {
        check_immutable("fee.feeCurrency", &old.fee_currency, &new.fee_currency)?;
        check_range("fee.minFeeDecimal", new.min_fee_decimal, 0, Self::MAX_FEE_DECIMAL)
    }

    fn validate_evidence(
        &self,
        _old: &EvidenceOptions,
        new: &EvidenceOptions,
    ) -> GovernanceResult<()> {
        if new.min_votes_required < 1 {
            return Err(malformed("evidence.minVotesRequired must be at least 1"));
        }
        for (name, value) in [
            ("evidence.penaltyBasePercentage", new.penalty_base_percentage),
            ("evidence.penaltyBountyPercentage", new.penalty_bounty_percentage),
            ("evidence.penaltyBurnPercentage", new.penalty_burn_percentage),
        ] {
            check_range(name, value, 0, 100)?;
        }
        Ok(())
    }

    fn validate_ons(&self, old: &OnsOptions, new: &OnsOptions) -> GovernanceResult<()> {
        check_immutable("ons.currency", &old.currency, &new.currency)?;
        check_immutable("ons.firstLevelDomains", &old.first_level_domains, &new.first_level_domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olt_shared_types::governance::ProposalId;
    use olt_shared_types::options::GovernanceOptions;
    use olt_shared_types::Address;

    fn create(proposal_type: ProposalType, initial: u64) -> CreateProposal {
        CreateProposal {
            proposal_id: ProposalId::derive(&Address([1; 20]), "h", 0),
            headline: "Raise the minimum fee".to_string(),
            description: "details".to_string(),
            proposer: Address([1; 20]),
            proposal_type,
            initial_funding: Coin::new("OLT", Amount::from_u64(initial)),
            funding_goal: None,
            funding_deadline: None,
            voting_deadline: None,
            pass_percentage: None,
            config_update: None,
        }
    }

    #[test]
    fn test_initial_funding_floor() {
        let validator = ProposalValidator::default();
        let options = GovernanceOptions::default().proposal.general;
        let low = create(ProposalType::General, 9_999);
        assert!(matches!(
            validator.validate_create(&low, &options, "OLT"),
            Err(GovernanceError::BelowMinimum { .. })
        ));
        let ok = create(ProposalType::General, 10_000);
        validator.validate_create(&ok, &options, "OLT").unwrap();
        assert!(validator.validate_create(&ok, &options, "BTC").is_err());
    }

    #[test]
    fn test_echoed_parameters_must_match() {
        let validator = ProposalValidator::default();
        let options = GovernanceOptions::default().proposal.general;
        let mut msg = create(ProposalType::General, 10_000);
        msg.pass_percentage = Some(options.pass_percentage);
        validator.validate_create(&msg, &options, "OLT").unwrap();
        msg.pass_percentage = Some(99);
        assert!(matches!(
            validator.validate_create(&msg, &options, "OLT"),
            Err(GovernanceError::InvalidProposal(_))
        ));
    }

    #[test]
    fn test_config_update_payload_rules() {
        let validator = ProposalValidator::default();
        let options = GovernanceOptions::default().proposal.config_update;
        let mut msg = create(ProposalType::ConfigUpdate, 1_000);
        assert!(validator.validate_create(&msg, &options, "OLT").is_err());
        msg.config_update = Some([("fee.minFeeDecimal".to_string(), serde_json::json!(10))].into());
        validator.validate_create(&msg, &options, "OLT").unwrap();

        let mut general = create(ProposalType::General, 10_000);
        general.config_update = msg.config_update.clone();
        assert!(validator
            .validate_create(&general, &GovernanceOptions::default().proposal.general, "OLT")
            .is_err());
    }

    #[test]
    fn test_option_bounds() {
        let validator = ProposalValidator::default();
        let defaults = GovernanceOptions::default();

        let mut fee = defaults.fee.clone();
        fee.min_fee_decimal = 19;
        let err = validator
            .validate_option_change(&OptionValue::Fee(defaults.fee.clone()), &OptionValue::Fee(fee))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedConfigUpdate);

        let current = OptionValue::Staking(defaults.staking.clone());
        let mut staking = defaults.staking.clone();
        staking.top_validator_count = 8;
        validator
            .validate_option_change(&current, &OptionValue::Staking(staking.clone()))
            .unwrap();
        staking.top_validator_count = 7;
        assert!(validator
            .validate_option_change(&current, &OptionValue::Staking(staking))
            .is_err());

        let mut proposal = defaults.proposal.clone();
        proposal.general.passed_fund_distribution.burn += 1;
        assert!(validator
            .validate_option_change(
                &OptionValue::Proposal(defaults.proposal.clone()),
                &OptionValue::Proposal(proposal)
            )
            .is_err());

        let mut proposal = defaults.proposal.clone();
        proposal.code_change.funding_goal = Amount::from_u64(2_999_999);
        assert!(validator
            .validate_option_change(
                &OptionValue::Proposal(defaults.proposal.clone()),
                &OptionValue::Proposal(proposal)
            )
            .is_err());
    }

    #[test]
    fn test_immutable_fields() {
        let validator = ProposalValidator::default();
        let defaults = GovernanceOptions::default();
        let mut ons = defaults.ons.clone();
        ons.first_level_domains.push("olt".to_string());
        assert!(validator
            .validate_option_change(&OptionValue::Ons(defaults.ons.clone()), &OptionValue::Ons(ons))
            .is_err());
        assert!(validator
            .validate_option_change(
                &OptionValue::Rewards(defaults.rewards.clone()),
                &OptionValue::Rewards(defaults.rewards.clone())
            )
            .is_err());
    }
}

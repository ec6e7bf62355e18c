//! Distribution of escrowed proposal funds at finalization
//!
//! A distribution table assigns basis points to each recipient group. Every
//! share is floored; whatever the floors leave behind, plus the validators'
//! per-head remainder, goes to the fee pool, so the plan always pays out
//! exactly the escrowed amount.

use log::debug;
use olt_shared_types::options::FundDistribution;
use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};
use crate::ledger::BalanceOp;

/// Concrete payouts for one finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPlan {
    pub validators: Vec<(Address, Amount)>,
    pub fee_pool: Amount,
    pub burn: Amount,
    pub execution_cost: (Address, Amount),
    pub bounty_pool: (Address, Amount),
    pub proposer_reward: (Address, Amount),
}

/// Recipients named by the proposal.
#[derive(Debug, Clone, Copy)]
pub struct Recipients {
    pub proposer: Address,
    pub execution_cost: Address,
    pub bounty_program: Address,
}

impl DistributionPlan {
    /// Sum of every payout, burn included.
    pub fn total(&self) -> Option<Amount> {
        Amount::checked_sum(
            self.validators
                .iter()
                .map(|(_, amount)| *amount)
                .chain([
                    self.fee_pool,
                    self.burn,
                    self.execution_cost.1,
                    self.bounty_pool.1,
                    self.proposer_reward.1,
                ]),
        )
    }

    /// Ledger operations paying the plan out of escrow.
    pub fn to_ops(&self) -> Vec<BalanceOp> {
        let mut ops: Vec<BalanceOp> = self
            .validators
            .iter()
            .map(|(account, amount)| BalanceOp::Credit {
                account: *account,
                amount: *amount,
            })
            .collect();
        for (account, amount) in [self.execution_cost, self.bounty_pool, self.proposer_reward] {
            ops.push(BalanceOp::Credit { account, amount });
        }
        ops.push(BalanceOp::CreditFeePool { amount: self.fee_pool });
        ops.push(BalanceOp::Burn { amount: self.burn });
        ops.retain(|op| match op {
            BalanceOp::Credit { amount, .. }
            | BalanceOp::Debit { amount, .. }
            | BalanceOp::CreditFeePool { amount }
            | BalanceOp::Burn { amount } => !amount.is_zero(),
        });
        ops
    }
}

/// Splits `funds` according to `table`.
///
/// The validator share is divided equally among `validators`; with no active
/// validators it goes to the fee pool.
pub fn plan_distribution(
    funds: Amount,
    table: &FundDistribution,
    recipients: Recipients,
    validators: &[Address],
) -> GovernanceResult<DistributionPlan> {
    if !table.is_complete() {
        return Err(GovernanceError::Distribution(format!(
            "distribution table sums to {} basis points",
            table.total()
        )));
    }

    let validators_share = funds.basis_points(table.validators);
    let burn = funds.basis_points(table.burn);
    let execution_cost = funds.basis_points(table.execution_cost);
    let bounty_pool = funds.basis_points(table.bounty_pool);
    let proposer_reward = funds.basis_points(table.proposer_reward);
    let fee_pool_share = funds.basis_points(table.fee_pool);

    let (per_validator, validator_remainder) = validators_share.split(validators.len() as u64);
    let validator_payouts: Vec<(Address, Amount)> = if per_validator.is_zero() {
        Vec::new()
    } else {
        validators.iter().map(|v| (*v, per_validator)).collect()
    };
    let paid_to_validators = per_validator
        .checked_mul_u64(validator_payouts.len() as u64)
        .ok_or_else(|| GovernanceError::Distribution("validator payout overflows".to_string()))?;

    let named = Amount::checked_sum([
        paid_to_validators,
        burn,
        execution_cost,
        bounty_pool,
        proposer_reward,
    ])
    .ok_or_else(|| GovernanceError::Distribution("distribution overflows".to_string()))?;
    // Floors, the fee pool share and the validators' remainder land here.
    let fee_pool = funds.checked_sub(named).ok_or_else(|| {
        GovernanceError::Distribution(format!("shares {} exceed escrow {}", named, funds))
    })?;
    debug!(
        "Distribution of {}: validators {} (+{} remainder), fee pool share {}",
        funds, paid_to_validators, validator_remainder, fee_pool_share
    );

    Ok(DistributionPlan {
        validators: validator_payouts,
        fee_pool,
        burn,
        execution_cost: (recipients.execution_cost, execution_cost),
        bounty_pool: (recipients.bounty_program, bounty_pool),
        proposer_reward: (recipients.proposer, proposer_reward),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use olt_shared_types::options::ProposalOptionSet;

    fn recipients() -> Recipients {
        Recipients {
            proposer: Address([1; 20]),
            execution_cost: Address([2; 20]),
            bounty_program: Address([3; 20]),
        }
    }

    #[test]
    fn test_plan_pays_out_everything() {
        let table = ProposalOptionSet::default().general.passed_fund_distribution;
        let validators = [Address([10; 20]), Address([11; 20]), Address([12; 20])];
        let plan =
            plan_distribution(Amount::from_u64(10_001), &table, recipients(), &validators).unwrap();
        assert_eq!(plan.total(), Some(Amount::from_u64(10_001)));
        // 18% of 10001 is 1800 after flooring, split three ways.
        assert_eq!(plan.validators.len(), 3);
        assert_eq!(plan.validators[0].1, Amount::from_u64(600));
        assert_eq!(plan.burn, Amount::from_u64(1800));
        assert_eq!(plan.bounty_pool.1, Amount::from_u64(1000));
        assert_eq!(plan.fee_pool, Amount::from_u64(1801));
    }

    #[test]
    fn test_validator_remainder_goes_to_fee_pool() {
        let table = FundDistribution {
            validators: 10_000,
            fee_pool: 0,
            burn: 0,
            execution_cost: 0,
            bounty_pool: 0,
            proposer_reward: 0,
        };
        let validators = [Address([10; 20]), Address([11; 20]), Address([12; 20])];
        let plan =
            plan_distribution(Amount::from_u64(10), &table, recipients(), &validators).unwrap();
        assert_eq!(plan.validators[0].1, Amount::from_u64(3));
        assert_eq!(plan.fee_pool, Amount::from_u64(1));

        let nobody = plan_distribution(Amount::from_u64(10), &table, recipients(), &[]).unwrap();
        assert!(nobody.validators.is_empty());
        assert_eq!(nobody.fee_pool, Amount::from_u64(10));
    }

    #[test]
    fn test_incomplete_table_is_rejected() {
        let mut table = ProposalOptionSet::default().general.passed_fund_distribution;
        table.burn -= 1;
        assert!(plan_distribution(Amount::from_u64(100), &table, recipients(), &[]).is_err());
    }

    #[test]
    fn test_zero_payouts_produce_no_ops() {
        let table = ProposalOptionSet::default().general.failed_fund_distribution;
        let validators = [Address([9; 20])];
        let plan = plan_distribution(Amount::ZERO, &table, recipients(), &validators).unwrap();
        assert!(plan.to_ops().is_empty());
    }
}

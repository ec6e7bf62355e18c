//! Interfaces to the balance ledger and the validator set.
//!
//! The engine never owns account balances or stake. It asks a
//! [`BalanceLedger`] to move coins in all-or-nothing batches and reads voting
//! power from a [`ValidatorSet`]. In-memory implementations back the node
//! driver and the tests.

use std::collections::BTreeMap;

use olt_shared_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account {account} holds {balance}, needs {required}")]
    InsufficientFunds {
        account: Address,
        balance: Amount,
        required: Amount,
    },
    #[error("balance overflow on {0}")]
    Overflow(String),
}

/// A single balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceOp {
    Debit { account: Address, amount: Amount },
    Credit { account: Address, amount: Amount },
    CreditFeePool { amount: Amount },
    /// Removes coins from circulation.
    Burn { amount: Amount },
}

pub trait BalanceLedger {
    fn balance(&self, account: &Address) -> Amount;

    /// Applies every operation or none of them.
    fn apply_batch(&mut self, ops: &[BalanceOp]) -> Result<(), LedgerError>;
}

pub trait ValidatorSet {
    /// Active validators and their current voting power.
    fn active_powers(&self) -> BTreeMap<Address, u64>;

    fn voting_power(&self, validator: &Address) -> Option<u64> {
        self.active_powers().get(validator).copied()
    }

    fn total_power(&self) -> u64 {
        self.active_powers().values().fold(0u64, |acc, p| acc.saturating_add(*p))
    }
}

/// Balances held in memory, with a fee pool and a burn counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLedger {
    balances: BTreeMap<Address, Amount>,
    fee_pool: Amount,
    burned: Amount,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances<I: IntoIterator<Item = (Address, Amount)>>(balances: I) -> Self {
        MemoryLedger {
            balances: balances.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn fee_pool(&self) -> Amount {
        self.fee_pool
    }

    pub fn burned(&self) -> Amount {
        self.burned
    }

    pub fn balances(&self) -> &BTreeMap<Address, Amount> {
        &self.balances
    }

    /// Sum of all account balances plus the fee pool.
    pub fn circulating(&self) -> Option<Amount> {
        Amount::checked_sum(self.balances.values().copied().chain(std::iter::once(self.fee_pool)))
    }
}

impl BalanceLedger for MemoryLedger {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn apply_batch(&mut self, ops: &[BalanceOp]) -> Result<(), LedgerError> {
        let mut staged: BTreeMap<Address, Amount> = BTreeMap::new();
        let mut fee_pool = self.fee_pool;
        let mut burned = self.burned;

        for op in ops {
            match op {
                BalanceOp::Debit { account, amount } => {
                    let balance = staged
                        .get(account)
                        .copied()
                        .unwrap_or_else(|| self.balance(account));
                    let next = balance.checked_sub(*amount).ok_or(LedgerError::InsufficientFunds {
                        account: *account,
                        balance,
                        required: *amount,
                    })?;
                    staged.insert(*account, next);
                }
                BalanceOp::Credit { account, amount } => {
                    let balance = staged
                        .get(account)
                        .copied()
                        .unwrap_or_else(|| self.balance(account));
                    let next = balance
                        .checked_add(*amount)
                        .ok_or_else(|| LedgerError::Overflow(account.to_string()))?;
                    staged.insert(*account, next);
                }
                BalanceOp::CreditFeePool { amount } => {
                    fee_pool = fee_pool
                        .checked_add(*amount)
                        .ok_or_else(|| LedgerError::Overflow("fee pool".to_string()))?;
                }
                BalanceOp::Burn { amount } => {
                    burned = burned
                        .checked_add(*amount)
                        .ok_or_else(|| LedgerError::Overflow("burned total".to_string()))?;
                }
            }
        }

        self.balances.extend(staged);
        self.fee_pool = fee_pool;
        self.burned = burned;
        Ok(())
    }
}

/// A fixed validator set, changed only by explicit calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticValidatorSet {
    powers: BTreeMap<Address, u64>,
}

impl StaticValidatorSet {
    pub fn new<I: IntoIterator<Item = (Address, u64)>>(powers: I) -> Self {
        StaticValidatorSet {
            powers: powers.into_iter().filter(|(_, power)| *power > 0).collect(),
        }
    }

    /// Sets a validator's power. Zero power removes it from the active set.
    pub fn set_power(&mut self, validator: Address, power: u64) {
        if power == 0 {
            self.powers.remove(&validator);
        } else {
            self.powers.insert(validator, power);
        }
    }
}

impl ValidatorSet for StaticValidatorSet {
    fn active_powers(&self) -> BTreeMap<Address, u64> {
        self.powers.clone()
    }

    fn voting_power(&self, validator: &Address) -> Option<u64> {
        self.powers.get(validator).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address([tag; 20])
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut ledger = MemoryLedger::with_balances([(addr(1), Amount::from_u64(10))]);
        let result = ledger.apply_batch(&[
            BalanceOp::Credit {
                account: addr(2),
                amount: Amount::from_u64(5),
            },
            BalanceOp::Debit {
                account: addr(1),
                amount: Amount::from_u64(11),
            },
        ]);
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger.balance(&addr(1)), Amount::from_u64(10));
        assert_eq!(ledger.balance(&addr(2)), Amount::ZERO);
    }

    #[test]
    fn test_batch_sees_its_own_updates() {
        let mut ledger = MemoryLedger::new();
        ledger
            .apply_batch(&[
                BalanceOp::Credit {
                    account: addr(1),
                    amount: Amount::from_u64(5),
                },
                BalanceOp::Debit {
                    account: addr(1),
                    amount: Amount::from_u64(5),
                },
                BalanceOp::CreditFeePool {
                    amount: Amount::from_u64(2),
                },
                BalanceOp::Burn {
                    amount: Amount::from_u64(3),
                },
            ])
            .unwrap();
        assert_eq!(ledger.balance(&addr(1)), Amount::ZERO);
        assert_eq!(ledger.fee_pool(), Amount::from_u64(2));
        assert_eq!(ledger.burned(), Amount::from_u64(3));
    }

    #[test]
    fn test_zero_power_validators_are_inactive() {
        let mut set = StaticValidatorSet::new([(addr(1), 10), (addr(2), 0)]);
        assert_eq!(set.total_power(), 10);
        assert_eq!(set.voting_power(&addr(2)), None);
        set.set_power(addr(1), 0);
        assert_eq!(set.total_power(), 0);
    }
}

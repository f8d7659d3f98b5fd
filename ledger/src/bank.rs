//! Base-asset balances.

use accesskey_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("{account} holds {balance}, needs {needed}")]
    InsufficientBalance {
        account: Address,
        balance: u128,
        needed: u128,
    },

    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// The fungible base asset the ledger takes custody of.
pub trait AssetBank {
    fn balance_of(&self, account: &Address) -> u128;

    /// Move `amount` from `from` to `to`; all or nothing.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), BankError>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryBank {
    balances: BTreeMap<Address, u128>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air.
    pub fn mint(&mut self, account: &Address, amount: u128) -> Result<(), BankError> {
        let balance = self.balances.entry(account.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BankError::Overflow(account.clone()))?;
        Ok(())
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().sum()
    }
}

impl AssetBank for MemoryBank {
    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), BankError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(BankError::InsufficientBalance {
                account: from.clone(),
                balance,
                needed: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| BankError::Overflow(to.clone()))?;
        self.balances.insert(from.clone(), balance - amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_balance() {
        let (a, b) = (Address::new("a"), Address::new("b"));
        let mut bank = MemoryBank::new();
        bank.mint(&a, 100).unwrap();
        bank.transfer(&a, &b, 40).unwrap();
        assert_eq!(bank.balance_of(&a), 60);
        assert_eq!(bank.balance_of(&b), 40);
        assert_eq!(bank.total_supply(), 100);
    }

    #[test]
    fn overdraft_fails_without_effect() {
        let (a, b) = (Address::new("a"), Address::new("b"));
        let mut bank = MemoryBank::new();
        bank.mint(&a, 10).unwrap();
        assert_eq!(
            bank.transfer(&a, &b, 11),
            Err(BankError::InsufficientBalance {
                account: a.clone(),
                balance: 10,
                needed: 11
            })
        );
        assert_eq!(bank.balance_of(&a), 10);
        assert_eq!(bank.balance_of(&b), 0);
    }

    #[test]
    fn self_transfer_is_a_no_op() {
        let a = Address::new("a");
        let mut bank = MemoryBank::new();
        bank.mint(&a, 5).unwrap();
        bank.transfer(&a, &a, 5).unwrap();
        assert_eq!(bank.balance_of(&a), 5);
    }
}

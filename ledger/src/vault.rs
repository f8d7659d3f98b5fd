//! Collateral wrappers.
//!
//! Positions hold vault shares. A [`PassthroughVault`] is a 1:1 wrapper; a
//! [`SharePriceVault`] redeems shares at `total_assets / total_shares`, so
//! yield raises the value of every outstanding share.

use accesskey_types::{mul_div, Rounding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("cannot withdraw {requested} shares, vault has {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("arithmetic overflow in vault accounting")]
    Overflow,
}

pub trait Vault {
    /// Wrap `amount` of base asset, returning the shares minted.
    fn deposit(&mut self, amount: u128) -> Result<u128, VaultError>;

    /// Unwrap `shares`, returning the base asset released.
    fn withdraw(&mut self, shares: u128) -> Result<u128, VaultError>;

    fn shares_to_value(&self, shares: u128) -> Result<u128, VaultError>;

    /// Add base asset without minting shares.
    ///
    /// Returns `false` when there is no share price to raise; the caller keeps
    /// the amount.
    fn donate(&mut self, amount: u128) -> Result<bool, VaultError>;

    fn total_shares(&self) -> u128;
}

/// Shares are base units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassthroughVault {
    total: u128,
}

impl PassthroughVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Vault for PassthroughVault {
    fn deposit(&mut self, amount: u128) -> Result<u128, VaultError> {
        self.total = self.total.checked_add(amount).ok_or(VaultError::Overflow)?;
        Ok(amount)
    }

    fn withdraw(&mut self, shares: u128) -> Result<u128, VaultError> {
        self.total = self.total.checked_sub(shares).ok_or(VaultError::InsufficientShares {
            requested: shares,
            available: self.total,
        })?;
        Ok(shares)
    }

    fn shares_to_value(&self, shares: u128) -> Result<u128, VaultError> {
        Ok(shares)
    }

    fn donate(&mut self, _amount: u128) -> Result<bool, VaultError> {
        Ok(false)
    }

    fn total_shares(&self) -> u128 {
        self.total
    }
}

/// A yield-bearing wrapper priced by its asset-to-share ratio.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePriceVault {
    total_assets: u128,
    total_shares: u128,
}

impl SharePriceVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_assets(&self) -> u128 {
        self.total_assets
    }

    /// Credit externally earned yield to current shareholders.
    pub fn accrue_yield(&mut self, amount: u128) -> Result<(), VaultError> {
        self.total_assets = self.total_assets.checked_add(amount).ok_or(VaultError::Overflow)?;
        Ok(())
    }
}

impl Vault for SharePriceVault {
    fn deposit(&mut self, amount: u128) -> Result<u128, VaultError> {
        let shares = if self.total_shares == 0 || self.total_assets == 0 {
            amount
        } else {
            mul_div(amount, self.total_shares, self.total_assets, Rounding::Down).ok_or(VaultError::Overflow)?
        };
        self.total_assets = self.total_assets.checked_add(amount).ok_or(VaultError::Overflow)?;
        self.total_shares = self.total_shares.checked_add(shares).ok_or(VaultError::Overflow)?;
        Ok(shares)
    }

    fn withdraw(&mut self, shares: u128) -> Result<u128, VaultError> {
        if shares > self.total_shares {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available: self.total_shares,
            });
        }
        let amount = self.shares_to_value(shares)?;
        self.total_shares -= shares;
        self.total_assets -= amount;
        Ok(amount)
    }

    fn shares_to_value(&self, shares: u128) -> Result<u128, VaultError> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_assets, self.total_shares, Rounding::Down).ok_or(VaultError::Overflow)
    }

    fn donate(&mut self, amount: u128) -> Result<bool, VaultError> {
        if self.total_shares == 0 {
            return Ok(false);
        }
        self.accrue_yield(amount)?;
        Ok(true)
    }

    fn total_shares(&self) -> u128 {
        self.total_shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_one_to_one() {
        let mut v = PassthroughVault::new();
        assert_eq!(v.deposit(100).unwrap(), 100);
        assert_eq!(v.shares_to_value(40).unwrap(), 40);
        assert_eq!(v.withdraw(40).unwrap(), 40);
        assert_eq!(v.total_shares(), 60);
        assert!(!v.donate(10).unwrap());
        assert!(v.withdraw(61).is_err());
    }

    #[test]
    fn yield_raises_share_value() {
        let mut v = SharePriceVault::new();
        let shares = v.deposit(1_000).unwrap();
        v.accrue_yield(500).unwrap();
        assert_eq!(v.shares_to_value(shares).unwrap(), 1_500);

        // A later depositor buys in at the raised price.
        let late = v.deposit(300).unwrap();
        assert_eq!(late, 200);
        assert_eq!(v.shares_to_value(late).unwrap(), 300);
    }

    #[test]
    fn withdraw_floors_in_favour_of_the_vault() {
        let mut v = SharePriceVault::new();
        v.deposit(3).unwrap();
        v.accrue_yield(1).unwrap();
        // 1 share of 3 redeems floor(4/3) = 1.
        assert_eq!(v.withdraw(1).unwrap(), 1);
        assert_eq!(v.total_assets(), 3);
        assert_eq!(v.total_shares(), 2);
    }

    #[test]
    fn donation_needs_shareholders() {
        let mut v = SharePriceVault::new();
        assert!(!v.donate(10).unwrap());
        v.deposit(10).unwrap();
        assert!(v.donate(10).unwrap());
        assert_eq!(v.shares_to_value(10).unwrap(), 20);
    }
}

//! Per-tier accumulator and per-position deposit checkpoints.

use crate::accumulator::{accrued_to, spread, RewardAccumulator};
use crate::error::RewardError;
use accesskey_types::math::{ACC_PRECISION, SHARE_PRECISION};
use serde::{Deserialize, Serialize};

/// Reward state of one tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRewards {
    /// Pool accumulator value at the tier's last sync.
    pub pool_snapshot: u128,
    acc_per_share: u128,
    total_deposit_weight: u128,
    /// Received reward not yet in `acc_per_share`, scaled by `SHARE_PRECISION`.
    carry: u128,
    /// Reward settled into positions of this tier.
    pub total_credited: u128,
}

impl TierRewards {
    pub fn new(pool_snapshot: u128) -> Self {
        Self {
            pool_snapshot,
            ..Self::default()
        }
    }

    /// What the tier is owed by the pool between its snapshot and `pool_acc`.
    ///
    /// Measured as the difference of two floors so that the fractions dropped
    /// at one sync are picked up by the next.
    pub fn owed_from_pool(&self, recipient_weight: u128, pool_acc: u128) -> Result<u128, RewardError> {
        accrued_to(recipient_weight, pool_acc, ACC_PRECISION)?
            .checked_sub(accrued_to(recipient_weight, self.pool_snapshot, ACC_PRECISION)?)
            .ok_or(RewardError::Overflow)
    }

    /// Per-share accumulator after passing `owed` on, without mutating.
    pub fn acc_after(&self, owed: u128) -> Result<u128, RewardError> {
        if self.total_deposit_weight == 0 {
            return Ok(self.acc_per_share);
        }
        let step = spread(owed, self.carry, self.total_deposit_weight, SHARE_PRECISION)?;
        self.acc_per_share
            .checked_add(step.increment)
            .ok_or(RewardError::Overflow)
    }

    /// Whole base units received but not yet spread over the deposits.
    pub fn carried(&self) -> u128 {
        self.carry / SHARE_PRECISION
    }

    /// Move a deposit from `old_weight` to `new_weight`.
    pub(crate) fn replace_weight(&mut self, old_weight: u128, new_weight: u128) -> Result<(), RewardError> {
        self.total_deposit_weight = self
            .total_deposit_weight
            .checked_sub(old_weight)
            .and_then(|w| w.checked_add(new_weight))
            .ok_or(RewardError::Overflow)?;
        Ok(())
    }
}

impl RewardAccumulator for TierRewards {
    fn total_weight(&self) -> u128 {
        self.total_deposit_weight
    }

    fn acc_per_weight(&self) -> u128 {
        self.acc_per_share
    }

    fn distribute(&mut self, amount: u128) -> Result<u128, RewardError> {
        if self.total_deposit_weight == 0 {
            // Whole units go back with `amount`; the sub-unit rest stays.
            let returned = amount
                .checked_add(self.carried())
                .ok_or(RewardError::Overflow)?;
            self.carry %= SHARE_PRECISION;
            return Ok(returned);
        }
        let step = spread(amount, self.carry, self.total_deposit_weight, SHARE_PRECISION)?;
        self.acc_per_share = self
            .acc_per_share
            .checked_add(step.increment)
            .ok_or(RewardError::Overflow)?;
        self.carry = step.carry;
        Ok(0)
    }
}

/// A position's stake in its tier's accumulator.
///
/// `reward_debt` is `floor(weight * acc / SHARE_PRECISION)` at the last
/// settlement, so the reward owed now is the same product at the current
/// accumulator minus `reward_debt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCheckpoint {
    pub weight: u128,
    pub reward_debt: u128,
}

impl DepositCheckpoint {
    pub fn pending_at(&self, acc: u128) -> Result<u128, RewardError> {
        accrued_to(self.weight, acc, SHARE_PRECISION)?
            .checked_sub(self.reward_debt)
            .ok_or(RewardError::Overflow)
    }

    /// Take what is owed at `acc` and move the snapshot there.
    pub fn settle(&mut self, acc: u128) -> Result<u128, RewardError> {
        let accrued = accrued_to(self.weight, acc, SHARE_PRECISION)?;
        let pending = accrued.checked_sub(self.reward_debt).ok_or(RewardError::Overflow)?;
        self.reward_debt = accrued;
        Ok(pending)
    }

    /// Start over at `acc` with `weight`. Anything unsettled is dropped.
    pub fn reset(&mut self, weight: u128, acc: u128) -> Result<(), RewardError> {
        self.reward_debt = accrued_to(weight, acc, SHARE_PRECISION)?;
        self.weight = weight;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(tier: &mut TierRewards, weight: u128) -> DepositCheckpoint {
        let mut deposit = DepositCheckpoint::default();
        tier.replace_weight(0, weight).unwrap();
        deposit.reset(weight, tier.acc_per_weight()).unwrap();
        deposit
    }

    #[test]
    fn empty_tier_hands_everything_back() {
        let mut tier = TierRewards::new(0);
        assert_eq!(tier.distribute(500).unwrap(), 500);
        assert_eq!(tier.acc_per_weight(), 0);
    }

    #[test]
    fn deposits_share_by_weight() {
        let mut tier = TierRewards::new(0);
        let mut a = joined(&mut tier, 1);
        let mut b = joined(&mut tier, 3);
        tier.distribute(400).unwrap();
        assert_eq!(a.settle(tier.acc_per_weight()).unwrap(), 100);
        assert_eq!(b.settle(tier.acc_per_weight()).unwrap(), 300);
        // Settling twice at the same accumulator yields nothing.
        assert_eq!(a.settle(tier.acc_per_weight()).unwrap(), 0);
    }

    #[test]
    fn pending_is_measured_from_the_snapshot() {
        let mut deposit = DepositCheckpoint::default();
        deposit.reset(10, 5 * SHARE_PRECISION).unwrap();
        assert_eq!(deposit.pending_at(7 * SHARE_PRECISION).unwrap(), 20);
    }

    #[test]
    fn owed_from_pool_uses_recipient_weight() {
        let tier = TierRewards::new(2 * ACC_PRECISION);
        assert_eq!(tier.owed_from_pool(3, 12 * ACC_PRECISION).unwrap(), 30);
    }

    #[test]
    fn owed_from_pool_keeps_fractions_across_syncs() {
        // Weight 3 at a third of a unit per step: 1 unit every step in total.
        let third = ACC_PRECISION / 3;
        let mut tier = TierRewards::new(0);
        let mut owed = 0;
        for step in 1..=9 {
            owed += tier.owed_from_pool(3, step * third).unwrap();
            tier.pool_snapshot = step * third;
        }
        assert_eq!(owed, 8);
        assert_eq!(owed, accrued_to(3, 9 * third, ACC_PRECISION).unwrap());
    }

    #[test]
    fn amounts_below_one_step_are_carried_not_lost() {
        // 1000 whole tokens of shares: one accumulator step is worth 1000 units.
        let mut tier = TierRewards::new(0);
        let mut deposit = joined(&mut tier, 1_000 * SHARE_PRECISION);
        let mut paid = 0;
        for _ in 0..25 {
            tier.distribute(100).unwrap();
            paid += deposit.settle(tier.acc_per_weight()).unwrap();
        }
        assert_eq!(paid, 2_000);
        assert_eq!(tier.carried(), 500);
        assert_eq!(paid + tier.carried(), 2_500);
    }

    #[test]
    fn carried_units_return_when_the_tier_empties() {
        let mut tier = TierRewards::new(0);
        let deposit = joined(&mut tier, 1_000 * SHARE_PRECISION);
        tier.distribute(300).unwrap();
        tier.replace_weight(deposit.weight, 0).unwrap();
        assert_eq!(tier.distribute(50).unwrap(), 350);
        assert_eq!(tier.carried(), 0);
    }
}

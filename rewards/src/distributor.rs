//! Two-level distribution: pool to tiers, tier to positions.

use crate::accumulator::RewardAccumulator;
use crate::error::RewardError;
use crate::pool::RewardPool;
use crate::share::{DepositCheckpoint, TierRewards};
use accesskey_types::{TierId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete reward state of the ledger.
///
/// Every operation that changes a position's locked shares must, at the same
/// `now`, first [`settle`](Self::settle) the position and then
/// [`reweigh`](Self::reweigh) it to the new share count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsDistributor {
    pool: RewardPool,
    tiers: BTreeMap<TierId, TierRewards>,
}

impl RewardsDistributor {
    pub fn new(now: Timestamp) -> Self {
        Self {
            pool: RewardPool::new(now),
            tiers: BTreeMap::new(),
        }
    }

    pub fn pool(&self) -> &RewardPool {
        &self.pool
    }

    pub fn tier(&self, tier: TierId) -> Option<&TierRewards> {
        self.tiers.get(&tier)
    }

    pub fn add_recipient(&mut self, tier: TierId, weight: u128, now: Timestamp) -> Result<(), RewardError> {
        // Deposits already in the tier earned nothing before it was a recipient.
        self.sync_tier(tier, now)?;
        self.pool.add_recipient(tier, weight, now)?;
        let acc = self.pool.acc_per_weight();
        if let Some(state) = self.tiers.get_mut(&tier) {
            state.pool_snapshot = acc;
        }
        tracing::info!(%tier, weight, "reward recipient added");
        Ok(())
    }

    pub fn start(&mut self, reward_rate: u128, now: Timestamp) -> Result<(), RewardError> {
        if reward_rate == 0 {
            return Err(RewardError::ZeroRate);
        }
        self.pool.set_rate(reward_rate, now)
    }

    pub fn set_rate(&mut self, reward_rate: u128, now: Timestamp) -> Result<(), RewardError> {
        self.pool.set_rate(reward_rate, now)
    }

    pub fn stop(&mut self, now: Timestamp) -> Result<(), RewardError> {
        self.pool.set_rate(0, now)
    }

    pub fn fund(&mut self, amount: u128) -> Result<(), RewardError> {
        self.pool.fund(amount)
    }

    /// Bring the pool and one tier up to `now`.
    ///
    /// Reward owed to a recipient tier with no deposits goes back to the reserve.
    /// Reward too small to move the tier's accumulator stays with the tier.
    fn sync_tier(&mut self, tier: TierId, now: Timestamp) -> Result<&mut TierRewards, RewardError> {
        self.pool.update(now)?;
        let acc = self.pool.acc_per_weight();
        let state = self.tiers.entry(tier).or_insert_with(|| TierRewards::new(acc));
        if let Some(weight) = self.pool.recipient_weight(tier) {
            let owed = state.owed_from_pool(weight, acc)?;
            let undistributed = state.distribute(owed)?;
            if undistributed > 0 {
                self.pool.refund(undistributed)?;
            }
        }
        state.pool_snapshot = acc;
        Ok(state)
    }

    /// Pay out what `deposit` has earned in `tier` up to `now`.
    pub fn settle(&mut self, tier: TierId, deposit: &mut DepositCheckpoint, now: Timestamp) -> Result<u128, RewardError> {
        let state = self.sync_tier(tier, now)?;
        let pending = deposit.settle(state.acc_per_weight())?;
        state.total_credited = state.total_credited.checked_add(pending).ok_or(RewardError::Overflow)?;
        if pending > 0 {
            tracing::debug!(%tier, pending, weight = deposit.weight, "reward settled");
        }
        Ok(pending)
    }

    /// Change the weight of an already settled deposit.
    pub fn reweigh(
        &mut self,
        tier: TierId,
        deposit: &mut DepositCheckpoint,
        new_weight: u128,
        now: Timestamp,
    ) -> Result<(), RewardError> {
        let state = self.sync_tier(tier, now)?;
        state.replace_weight(deposit.weight, new_weight)?;
        deposit.reset(new_weight, state.acc_per_weight())
    }

    /// What `settle` would return at `now`, without mutating.
    pub fn pending(&self, tier: TierId, deposit: &DepositCheckpoint, now: Timestamp) -> Result<u128, RewardError> {
        let Some(state) = self.tiers.get(&tier) else {
            return Ok(0);
        };
        let acc = match self.pool.recipient_weight(tier) {
            Some(weight) => {
                let pool_acc = self.pool.acc_at(now)?;
                state.acc_after(state.owed_from_pool(weight, pool_acc)?)?
            }
            None => state.acc_per_weight(),
        };
        deposit.pending_at(acc)
    }
}

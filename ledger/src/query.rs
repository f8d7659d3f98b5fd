//! Side-effect free inspection.
//!
//! Views run the same checkpoint an operation would, on throwaway copies, so
//! a view at `now` agrees exactly with what an operation at `now` would see.

use crate::bank::AssetBank;
use crate::engine::AccessKeyLedger;
use crate::liquidation::Settlement;
use crate::position::{Position, PositionView};
use crate::registry::OwnershipRegistry;
use crate::vault::Vault;
use crate::LedgerError;
use accesskey_fees::SubscriptionTier;
use accesskey_rewards::{RewardPool, TierRewards};
use accesskey_types::{Address, KeyId, LedgerParams, TierId};

impl<R, B, V> AccessKeyLedger<R, B, V>
where
    R: OwnershipRegistry,
    B: AssetBank,
    V: Vault + Clone,
{
    /// Checkpoint a copy of the position at the current time.
    fn preview(&self, key: KeyId) -> Result<(Position, Settlement), LedgerError> {
        let mut position = self.position_record(key)?.clone();
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, self.clock.now())?;
        Ok((position, settlement))
    }

    pub fn position(&self, key: KeyId) -> Result<PositionView, LedgerError> {
        let stored = self.position_record(key)?;
        let (_, settlement) = self.preview(key)?;
        Ok(PositionView {
            key,
            owner: self.registry.owner_of(key)?,
            tier: stored.tier,
            subscribed_at: stored.subscribed_at,
            locked_shares: stored.locked_shares,
            locked_value: settlement.value_before_rewards,
            debt: settlement.debt,
            pending_rewards: settlement.credited_reward,
            last_checkpoint_at: stored.last_checkpoint_at(),
            liquidatable: settlement.is_liquidatable(&self.config.params),
        })
    }

    /// Checkpointed debt plus accrual since the last checkpoint.
    pub fn debt(&self, key: KeyId) -> Result<u128, LedgerError> {
        let position = self.position_record(key)?;
        let schedule = position.tier.and_then(|t| self.tiers.get(&t)).map(|t| t.schedule());
        Ok(position.debt.debt_at(schedule, self.clock.now())?)
    }

    pub fn pending_rewards(&self, key: KeyId) -> Result<u128, LedgerError> {
        let position = self.position_record(key)?;
        match position.tier {
            Some(tier) => Ok(self.rewards.pending(tier, &position.rewards, self.clock.now())?),
            None => Ok(0),
        }
    }

    pub fn is_liquidatable(&self, key: KeyId) -> Result<bool, LedgerError> {
        let (_, settlement) = self.preview(key)?;
        Ok(settlement.is_liquidatable(&self.config.params))
    }

    pub fn is_solvent(&self, key: KeyId) -> Result<bool, LedgerError> {
        self.is_liquidatable(key).map(|liquidatable| !liquidatable)
    }

    pub fn tier(&self, tier: TierId) -> Option<&SubscriptionTier> {
        self.tiers.get(&tier)
    }

    /// The most recently captured per-second rate of `tier`.
    pub fn tier_fee_rate(&self, tier: TierId) -> Result<u128, LedgerError> {
        self.tiers
            .get(&tier)
            .map(SubscriptionTier::fee_per_second)
            .ok_or(LedgerError::TierNotFound(tier))
    }

    /// Tiers in creation order.
    pub fn supported_tiers(&self) -> impl Iterator<Item = &SubscriptionTier> + '_ {
        self.tiers.values()
    }

    pub fn reward_pool(&self) -> &RewardPool {
        self.rewards.pool()
    }

    pub fn tier_rewards(&self, tier: TierId) -> Option<&TierRewards> {
        self.rewards.tier(tier)
    }

    pub fn params(&self) -> &LedgerParams {
        &self.config.params
    }

    pub fn treasury(&self) -> &Address {
        &self.config.treasury
    }

    pub fn keys_of(&self, owner: &Address) -> Vec<KeyId> {
        self.registry.keys_of(owner)
    }

    /// Every live key in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.positions.keys().copied()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

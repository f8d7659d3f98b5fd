//! Admin- and manager-guarded configuration of tiers, rewards and parameters.

use crate::bank::AssetBank;
use crate::engine::AccessKeyLedger;
use crate::events::LedgerEvent;
use crate::registry::OwnershipRegistry;
use crate::vault::Vault;
use crate::LedgerError;
use accesskey_fees::{FeeSpec, SubscriptionTier, TierSpec};
use accesskey_types::{Address, LedgerParams, TierId};

impl<R, B, V> AccessKeyLedger<R, B, V>
where
    R: OwnershipRegistry,
    B: AssetBank,
    V: Vault + Clone,
{
    fn require_admin(&self, caller: &Address) -> Result<(), LedgerError> {
        if caller != &self.config.admin {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// The admin or the tier's own manager.
    fn require_tier_admin(&self, caller: &Address, tier: TierId) -> Result<&SubscriptionTier, LedgerError> {
        let record = self.tiers.get(&tier).ok_or(LedgerError::TierNotFound(tier))?;
        if caller != &self.config.admin && caller != &record.manager {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        Ok(record)
    }

    // ── Tiers ──────────────────────────────────────────────────────────

    /// Add a tier to the supported set. Ids are sequential and never reused.
    pub fn create_tier(&mut self, caller: &Address, spec: TierSpec) -> Result<TierId, LedgerError> {
        self.require_admin(caller)?;
        if let FeeSpec::MonthlyUsd { asset, .. } = &spec.fee {
            if asset != &self.config.price_asset {
                return Err(LedgerError::Config(format!(
                    "tier quoted in {asset}, collateral is {}",
                    self.config.price_asset
                )));
            }
        }
        let id = next_tier_id(self.tiers.len())?;
        let now = self.clock.now();
        let tier = SubscriptionTier::from_spec(id, spec, self.config.params.seconds_per_month, self.oracle.as_ref(), now)?;
        let fee_per_second = tier.fee_per_second();
        let name = tier.name.clone();
        self.tiers.insert(id, tier);
        tracing::info!(tier = %id, %name, fee_per_second, "tier created");
        self.events.emit(&LedgerEvent::TierCreated {
            tier: id,
            name,
            fee_per_second,
        });
        Ok(id)
    }

    /// Charge a fixed per-second rate from now on.
    pub fn set_fee_per_second(&mut self, caller: &Address, tier: TierId, fee_per_second: u128) -> Result<(), LedgerError> {
        let mut record = self.require_tier_admin(caller, tier)?.clone();
        let now = self.clock.now();
        record.set_fee_per_second(fee_per_second, now)?;
        self.tiers.insert(tier, record);
        self.rate_changed(tier, fee_per_second);
        Ok(())
    }

    /// Charge a monthly USD fee, converted at the current oracle price.
    pub fn set_monthly_fee_usd(&mut self, caller: &Address, tier: TierId, monthly_fee_usd: u128) -> Result<u128, LedgerError> {
        let mut record = self.require_tier_admin(caller, tier)?.clone();
        let now = self.clock.now();
        let asset = self.config.price_asset.clone();
        let rate = record.set_monthly_fee_usd(
            &asset,
            monthly_fee_usd,
            self.config.params.seconds_per_month,
            self.oracle.as_ref(),
            now,
        )?;
        self.tiers.insert(tier, record);
        self.rate_changed(tier, rate);
        Ok(rate)
    }

    /// Re-read the oracle for a USD-priced tier.
    pub fn refresh_tier_rate(&mut self, caller: &Address, tier: TierId) -> Result<u128, LedgerError> {
        let mut record = self.require_tier_admin(caller, tier)?.clone();
        let now = self.clock.now();
        let rate = record.refresh_rate(self.config.params.seconds_per_month, self.oracle.as_ref(), now)?;
        self.tiers.insert(tier, record);
        self.rate_changed(tier, rate);
        Ok(rate)
    }

    pub fn set_subscribable(&mut self, caller: &Address, tier: TierId, subscribable: bool) -> Result<(), LedgerError> {
        self.require_tier_admin(caller, tier)?;
        if let Some(record) = self.tiers.get_mut(&tier) {
            record.subscribable = subscribable;
        }
        tracing::info!(%tier, subscribable, "tier subscribability changed");
        Ok(())
    }

    pub fn set_tier_manager(&mut self, caller: &Address, tier: TierId, manager: &Address) -> Result<(), LedgerError> {
        self.require_tier_admin(caller, tier)?;
        if !manager.is_valid() {
            return Err(LedgerError::Config(format!("invalid manager address {manager:?}")));
        }
        if let Some(record) = self.tiers.get_mut(&tier) {
            record.manager = manager.clone();
        }
        tracing::info!(%tier, %manager, "tier manager changed");
        Ok(())
    }

    fn rate_changed(&self, tier: TierId, fee_per_second: u128) {
        let effective_at = self.clock.now();
        tracing::info!(%tier, fee_per_second, at = %effective_at, "tier rate changed");
        self.events.emit(&LedgerEvent::TierRateChanged {
            tier,
            fee_per_second,
            effective_at,
        });
    }

    // ── Rewards ────────────────────────────────────────────────────────

    pub fn add_reward_recipient(&mut self, caller: &Address, tier: TierId, weight: u128) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if !self.tiers.contains_key(&tier) {
            return Err(LedgerError::TierNotFound(tier));
        }
        let mut rewards = self.rewards.clone();
        rewards.add_recipient(tier, weight, self.clock.now())?;
        self.rewards = rewards;
        Ok(())
    }

    pub fn start_rewards(&mut self, caller: &Address, reward_rate: u128) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let mut rewards = self.rewards.clone();
        rewards.start(reward_rate, self.clock.now())?;
        self.rewards = rewards;
        tracing::info!(reward_rate, "reward stream started");
        Ok(())
    }

    pub fn set_reward_rate(&mut self, caller: &Address, reward_rate: u128) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let mut rewards = self.rewards.clone();
        rewards.set_rate(reward_rate, self.clock.now())?;
        self.rewards = rewards;
        tracing::info!(reward_rate, "reward rate changed");
        Ok(())
    }

    pub fn stop_rewards(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let mut rewards = self.rewards.clone();
        rewards.stop(self.clock.now())?;
        self.rewards = rewards;
        tracing::info!("reward stream stopped");
        Ok(())
    }

    /// Top up the reward reserve from `funder`. Anyone may fund.
    pub fn fund_rewards(&mut self, funder: &Address, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let mut rewards = self.rewards.clone();
        rewards.fund(amount)?;
        self.bank.transfer(funder, &self.config.custody, amount)?;
        self.rewards = rewards;
        tracing::info!(%funder, amount, reserve = self.rewards.pool().reserve, "rewards funded");
        self.events.emit(&LedgerEvent::RewardsFunded {
            funder: funder.clone(),
            amount,
        });
        Ok(())
    }

    // ── Treasury & parameters ──────────────────────────────────────────

    pub fn set_treasury(&mut self, caller: &Address, treasury: &Address) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if !treasury.is_valid() || treasury == &self.config.custody {
            return Err(LedgerError::Config(format!("invalid treasury address {treasury:?}")));
        }
        let previous = std::mem::replace(&mut self.config.treasury, treasury.clone());
        tracing::info!(%previous, %treasury, "treasury changed");
        self.events.emit(&LedgerEvent::TreasuryChanged {
            previous,
            treasury: treasury.clone(),
        });
        Ok(())
    }

    /// Replace the economic parameters. Later fee conversions use the new month length.
    pub fn set_params(&mut self, caller: &Address, params: LedgerParams) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        params.validate()?;
        tracing::info!(?params, "ledger parameters changed");
        self.config.params = params;
        Ok(())
    }
}

/// Id for the tier created after `existing` others.
fn next_tier_id(existing: usize) -> Result<TierId, LedgerError> {
    u32::try_from(existing)
        .map(TierId)
        .map_err(|_| LedgerError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ids_follow_the_tier_count() {
        assert_eq!(next_tier_id(0), Ok(TierId(0)));
        assert_eq!(next_tier_id(u32::MAX as usize), Ok(TierId(u32::MAX)));
    }

    #[test]
    fn tier_ids_never_wrap() {
        if let Ok(past_max) = usize::try_from(u64::from(u32::MAX) + 1) {
            assert_eq!(next_tier_id(past_max), Err(LedgerError::Overflow));
        }
    }
}

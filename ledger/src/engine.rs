//! The position ledger.
//!
//! Every operation follows the same shape:
//! 1. Read the clock once; that `now` is used for every checkpoint in the call.
//! 2. Clone the touched position, the reward state and the vault into a stage.
//! 3. Checkpoint debt and settle rewards on the stage, then apply the
//!    operation's own changes and policy checks.
//! 4. Pull inbound funds (the only external call that may still fail).
//! 5. Commit the stage, then pay out and burn ownership tokens.
//!
//! A failure at any step before 5 leaves the ledger untouched.

use crate::bank::AssetBank;
use crate::config::LedgerConfig;
use crate::events::{EventBus, LedgerEvent};
use crate::liquidation::{shares_to_unwind, split_seizure, Settlement};
use crate::position::Position;
use crate::registry::OwnershipRegistry;
use crate::vault::Vault;
use crate::LedgerError;
use accesskey_fees::SubscriptionTier;
use accesskey_rewards::RewardsDistributor;
use accesskey_types::{Address, Clock, KeyId, PriceOracle, TierId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of a burn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub debt_paid: u128,
    pub returned: u128,
}

/// Outcome of a liquidation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationReceipt {
    pub debt: u128,
    pub seized: u128,
    pub liquidator_reward: u128,
    pub vault_donation: u128,
    pub treasury_amount: u128,
}

/// Copies of the shared state an operation may touch.
pub(crate) struct Stage<V> {
    pub(crate) rewards: RewardsDistributor,
    pub(crate) vault: V,
}

/// Debt paid out of a position by a resolve or burn.
struct Unwind {
    debt: u128,
    paid: u128,
    shares: u128,
}

pub struct AccessKeyLedger<R, B, V> {
    pub(crate) config: LedgerConfig,
    pub(crate) positions: BTreeMap<KeyId, Position>,
    pub(crate) tiers: BTreeMap<TierId, SubscriptionTier>,
    pub(crate) rewards: RewardsDistributor,
    pub(crate) registry: R,
    pub(crate) bank: B,
    pub(crate) vault: V,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) oracle: Arc<dyn PriceOracle>,
    pub(crate) events: EventBus,
}

impl<R, B, V> AccessKeyLedger<R, B, V>
where
    R: OwnershipRegistry,
    B: AssetBank,
    V: Vault + Clone,
{
    pub fn new(
        config: LedgerConfig,
        registry: R,
        bank: B,
        vault: V,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let rewards = RewardsDistributor::new(clock.now());
        Ok(Self {
            config,
            positions: BTreeMap::new(),
            tiers: BTreeMap::new(),
            rewards,
            registry,
            bank,
            vault,
            clock,
            oracle,
            events: EventBus::new(),
        })
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Direct access to the vault, e.g. to credit external yield.
    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ── User operations ────────────────────────────────────────────────

    /// Create an empty position and its access key.
    pub fn mint(&mut self, owner: &Address) -> Result<KeyId, LedgerError> {
        let now = self.clock.now();
        let key = self.registry.mint(owner)?;
        self.positions.insert(key, Position::new(key, now));
        tracing::info!(%key, %owner, "access key minted");
        self.events.emit(&LedgerEvent::KeyMinted {
            key,
            owner: owner.clone(),
        });
        Ok(key)
    }

    /// Lock `amount` of base asset from `funder` into `key`. Returns the shares added.
    pub fn fund(&mut self, funder: &Address, key: KeyId, amount: u128) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let now = self.clock.now();
        let mut position = self.position_record(key)?.clone();
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, now)?;

        let shares = self.deposit(&mut stage, &mut position, amount, now)?;
        self.bank.transfer(funder, &self.config.custody, amount)?;

        let tier = position.tier;
        self.commit(stage);
        self.positions.insert(key, position);
        tracing::info!(%key, %funder, amount, shares, "position funded");
        self.emit_credit(key, tier, &settlement);
        self.events.emit(&LedgerEvent::Funded {
            key,
            funder: funder.clone(),
            amount,
            shares,
        });
        Ok(shares)
    }

    /// Move `key` to `tier`. Debt and rewards so far are settled under the old tier.
    pub fn subscribe(&mut self, caller: &Address, key: KeyId, tier: TierId) -> Result<(), LedgerError> {
        self.require_approved(caller, key)?;
        self.require_subscribable(tier)?;
        let now = self.clock.now();
        let mut position = self.position_record(key)?.clone();
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, now)?;

        let previous = position.tier;
        if let Some(old) = previous {
            stage.rewards.reweigh(old, &mut position.rewards, 0, now)?;
        }
        stage
            .rewards
            .reweigh(tier, &mut position.rewards, position.locked_shares, now)?;
        position.tier = Some(tier);
        position.subscribed_at = Some(now);

        self.commit(stage);
        self.positions.insert(key, position);
        tracing::info!(%key, %tier, ?previous, "subscribed");
        self.emit_credit(key, previous, &settlement);
        self.events.emit(&LedgerEvent::Subscribed { key, tier, previous });
        Ok(())
    }

    /// Mint, fund and subscribe in one step; nothing happens unless all three succeed.
    pub fn mint_fund_subscribe(&mut self, owner: &Address, amount: u128, tier: TierId) -> Result<KeyId, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.require_subscribable(tier)?;
        let now = self.clock.now();
        let mut stage = self.stage();
        let mut position = Position::new(KeyId(0), now);
        let shares = self.deposit(&mut stage, &mut position, amount, now)?;
        stage.rewards.reweigh(tier, &mut position.rewards, shares, now)?;
        position.tier = Some(tier);
        position.subscribed_at = Some(now);

        self.bank.transfer(owner, &self.config.custody, amount)?;
        let key = match self.registry.mint(owner) {
            Ok(key) => key,
            Err(e) => {
                self.bank.transfer(&self.config.custody, owner, amount)?;
                return Err(e.into());
            }
        };
        position.key = key;

        self.commit(stage);
        self.positions.insert(key, position);
        tracing::info!(%key, %owner, amount, %tier, "minted, funded and subscribed");
        self.events.emit(&LedgerEvent::KeyMinted {
            key,
            owner: owner.clone(),
        });
        self.events.emit(&LedgerEvent::Funded {
            key,
            funder: owner.clone(),
            amount,
            shares,
        });
        self.events.emit(&LedgerEvent::Subscribed {
            key,
            tier,
            previous: None,
        });
        Ok(key)
    }

    /// Pay all accrued debt to the treasury out of the position. Returns the amount paid.
    pub fn resolve_debt(&mut self, caller: &Address, key: KeyId) -> Result<u128, LedgerError> {
        self.require_approved(caller, key)?;
        let now = self.clock.now();
        let mut position = self.position_record(key)?.clone();
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, now)?;

        let collateral = settlement.collateral(&self.config.params);
        if settlement.debt > collateral {
            tracing::warn!(%key, debt = settlement.debt, collateral, "resolve rejected");
            return Err(LedgerError::InsufficientFunds {
                key,
                debt: settlement.debt,
                collateral,
            });
        }
        let unwind = self.unwind_debt(&mut stage, &mut position, &settlement, now)?;
        self.ensure_custody_covers(unwind.paid)?;

        let tier = position.tier;
        let treasury = self.config.treasury.clone();
        self.commit(stage);
        self.positions.insert(key, position);
        self.pay(&treasury, unwind.paid)?;
        tracing::info!(%key, debt = unwind.debt, paid = unwind.paid, shares = unwind.shares, "debt resolved");
        self.emit_credit(key, tier, &settlement);
        self.events.emit(&LedgerEvent::DebtResolved {
            key,
            debt: unwind.debt,
            paid: unwind.paid,
            shares: unwind.shares,
        });
        Ok(unwind.paid)
    }

    /// Settle debt, return the rest to the owner and destroy the key.
    pub fn burn(&mut self, caller: &Address, key: KeyId) -> Result<BurnReceipt, LedgerError> {
        self.require_approved(caller, key)?;
        let owner = self.registry.owner_of(key)?;
        let now = self.clock.now();
        let mut position = self.position_record(key)?.clone();
        self.require_lockup_elapsed(&position, now)?;
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, now)?;

        let collateral = settlement.collateral(&self.config.params);
        if settlement.debt > collateral {
            tracing::warn!(%key, debt = settlement.debt, collateral, "burn rejected");
            return Err(LedgerError::NotSolvent {
                key,
                debt: settlement.debt,
                collateral,
            });
        }
        let unwind = self.unwind_debt(&mut stage, &mut position, &settlement, now)?;
        let returned = stage.vault.withdraw(position.locked_shares)?;
        self.release(&mut stage, &mut position, now)?;
        let total_out = unwind.paid.checked_add(returned).ok_or(LedgerError::Overflow)?;
        self.ensure_custody_covers(total_out)?;

        let tier = position.tier;
        let treasury = self.config.treasury.clone();
        self.commit(stage);
        self.positions.remove(&key);
        self.pay(&treasury, unwind.paid)?;
        self.pay(&owner, returned)?;
        self.registry.burn(key)?;
        tracing::info!(%key, %owner, debt_paid = unwind.paid, returned, "access key burned");
        self.emit_credit(key, tier, &settlement);
        self.events.emit(&LedgerEvent::Burned {
            key,
            owner,
            debt_paid: unwind.paid,
            returned,
        });
        Ok(BurnReceipt {
            debt_paid: unwind.paid,
            returned,
        })
    }

    /// Seize an insolvent position. Anyone may call; the caller takes the reward.
    pub fn liquidate(&mut self, caller: &Address, key: KeyId) -> Result<LiquidationReceipt, LedgerError> {
        let now = self.clock.now();
        let mut position = self.position_record(key)?.clone();
        let mut stage = self.stage();
        let settlement = self.settle(&mut stage, &mut position, now)?;

        let collateral = settlement.collateral(&self.config.params);
        if !settlement.is_liquidatable(&self.config.params) {
            tracing::debug!(%key, debt = settlement.debt, collateral, "liquidation rejected");
            return Err(LedgerError::Solvent {
                key,
                debt: settlement.debt,
                collateral,
            });
        }
        let seized = stage.vault.withdraw(position.locked_shares)?;
        self.release(&mut stage, &mut position, now)?;
        let split = split_seizure(seized, &self.config.params).ok_or(LedgerError::Overflow)?;
        let vault_donation = if split.sweep > 0 && stage.vault.donate(split.sweep)? {
            split.sweep
        } else {
            0
        };
        let treasury_amount = split.treasury + (split.sweep - vault_donation);
        self.ensure_custody_covers(split.liquidator + treasury_amount)?;

        let tier = position.tier;
        let treasury = self.config.treasury.clone();
        self.commit(stage);
        self.positions.remove(&key);
        self.pay(caller, split.liquidator)?;
        self.pay(&treasury, treasury_amount)?;
        self.registry.burn(key)?;
        tracing::info!(
            %key,
            liquidator = %caller,
            debt = settlement.debt,
            seized,
            reward = split.liquidator,
            vault_donation,
            treasury_amount,
            "position liquidated"
        );
        self.emit_credit(key, tier, &settlement);
        let receipt = LiquidationReceipt {
            debt: settlement.debt,
            seized,
            liquidator_reward: split.liquidator,
            vault_donation,
            treasury_amount,
        };
        self.events.emit(&LedgerEvent::Liquidated {
            key,
            liquidator: caller.clone(),
            debt: receipt.debt,
            seized,
            liquidator_reward: receipt.liquidator_reward,
            vault_donation,
            treasury_amount,
        });
        Ok(receipt)
    }

    // ── Internals ──────────────────────────────────────────────────────

    pub(crate) fn position_record(&self, key: KeyId) -> Result<&Position, LedgerError> {
        self.positions.get(&key).ok_or(LedgerError::KeyNotFound(key))
    }

    pub(crate) fn stage(&self) -> Stage<V> {
        Stage {
            rewards: self.rewards.clone(),
            vault: self.vault.clone(),
        }
    }

    fn commit(&mut self, stage: Stage<V>) {
        self.rewards = stage.rewards;
        self.vault = stage.vault;
    }

    /// Checkpoint debt and compound pending reward into the position.
    pub(crate) fn settle(
        &self,
        stage: &mut Stage<V>,
        position: &mut Position,
        now: Timestamp,
    ) -> Result<Settlement, LedgerError> {
        let schedule = position.tier.and_then(|t| self.tiers.get(&t)).map(|t| t.schedule());
        position.debt.checkpoint(schedule, now)?;
        let value_before_rewards = stage.vault.shares_to_value(position.locked_shares)?;

        let mut credited_reward = 0;
        if let Some(tier) = position.tier {
            let pending = stage.rewards.settle(tier, &mut position.rewards, now)?;
            if pending > 0 {
                let shares = stage.vault.deposit(pending)?;
                position.locked_shares = position.locked_shares.checked_add(shares).ok_or(LedgerError::Overflow)?;
                stage
                    .rewards
                    .reweigh(tier, &mut position.rewards, position.locked_shares, now)?;
                credited_reward = pending;
            }
        }
        Ok(Settlement {
            debt: position.debt.accrued_debt,
            credited_reward,
            value_before_rewards,
            value: stage.vault.shares_to_value(position.locked_shares)?,
        })
    }

    /// Wrap `amount` into the position and update its reward weight.
    fn deposit(
        &self,
        stage: &mut Stage<V>,
        position: &mut Position,
        amount: u128,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        let shares = stage.vault.deposit(amount)?;
        if shares == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        position.locked_shares = position.locked_shares.checked_add(shares).ok_or(LedgerError::Overflow)?;
        if let Some(tier) = position.tier {
            stage
                .rewards
                .reweigh(tier, &mut position.rewards, position.locked_shares, now)?;
        }
        Ok(shares)
    }

    /// Remove just enough shares to pay the checkpointed debt, then clear it.
    fn unwind_debt(
        &self,
        stage: &mut Stage<V>,
        position: &mut Position,
        settlement: &Settlement,
        now: Timestamp,
    ) -> Result<Unwind, LedgerError> {
        let debt = settlement.debt;
        let shares = shares_to_unwind(debt, position.locked_shares, settlement.value).ok_or(
            LedgerError::InsufficientFunds {
                key: position.key,
                debt,
                collateral: settlement.value,
            },
        )?;
        let paid = if shares > 0 { stage.vault.withdraw(shares)? } else { 0 };
        position.locked_shares -= shares;
        if let Some(tier) = position.tier {
            stage
                .rewards
                .reweigh(tier, &mut position.rewards, position.locked_shares, now)?;
        }
        position.debt.clear();
        Ok(Unwind { debt, paid, shares })
    }

    /// Drop a closing position's reward weight and shares.
    fn release(&self, stage: &mut Stage<V>, position: &mut Position, now: Timestamp) -> Result<(), LedgerError> {
        if let Some(tier) = position.tier {
            stage.rewards.reweigh(tier, &mut position.rewards, 0, now)?;
        }
        position.locked_shares = 0;
        Ok(())
    }

    fn ensure_custody_covers(&self, amount: u128) -> Result<(), LedgerError> {
        let held = self.bank.balance_of(&self.config.custody);
        if held < amount {
            return Err(LedgerError::Transfer(format!(
                "custody holds {held}, payout needs {amount}"
            )));
        }
        Ok(())
    }

    fn pay(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        self.bank.transfer(&self.config.custody, to, amount)?;
        Ok(())
    }

    fn emit_credit(&self, key: KeyId, tier: Option<TierId>, settlement: &Settlement) {
        if let (Some(tier), amount @ 1..) = (tier, settlement.credited_reward) {
            self.events.emit(&LedgerEvent::RewardsCredited { key, tier, amount });
        }
    }

    fn require_approved(&self, caller: &Address, key: KeyId) -> Result<(), LedgerError> {
        self.position_record(key)?;
        if !self.registry.is_approved_or_owner(caller, key) {
            return Err(LedgerError::ApprovalRequired {
                caller: caller.clone(),
                key,
            });
        }
        Ok(())
    }

    fn require_subscribable(&self, tier: TierId) -> Result<(), LedgerError> {
        let record = self.tiers.get(&tier).ok_or(LedgerError::UnsupportedTier(tier))?;
        if !record.subscribable {
            return Err(LedgerError::TierLocked(tier));
        }
        Ok(())
    }

    fn require_lockup_elapsed(&self, position: &Position, now: Timestamp) -> Result<(), LedgerError> {
        let (Some(tier), Some(since)) = (position.tier, position.subscribed_at) else {
            return Ok(());
        };
        let lockup = self.tiers.get(&tier).map(|t| t.lockup_secs).unwrap_or(0);
        let until = since.saturating_add_secs(lockup);
        if now < until {
            return Err(LedgerError::LockupActive {
                key: position.key,
                until,
            });
        }
        Ok(())
    }
}

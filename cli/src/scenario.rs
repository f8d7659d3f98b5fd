//! Deterministic replay of scripted ledger operations.
//!
//! A scenario is a TOML file with a start time, oracle prices and a list of
//! `[[step]]` tables. Each step runs against in-memory collaborators and a
//! manual clock; failures are reported and the replay continues.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use accesskey_fees::{FeeSpec, TierSpec};
use accesskey_ledger::{
    AccessKeyLedger, AssetBank, BurnReceipt, LedgerConfig, LedgerError, LiquidationReceipt, MemoryBank,
    MemoryRegistry, PositionView, SharePriceVault,
};
use accesskey_nullables::{NullClock, NullOracle};
use accesskey_rewards::RewardPool;
use accesskey_types::{Address, Clock, KeyId, TierId};
use accesskey_utils::{format_units, parse_units, ParseUnitsError};
use serde::{Deserialize, Serialize};

const DECIMALS: u32 = 18;

/// A token amount written as whole units (`100`) or a decimal string (`"0.5"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawUnits")]
pub struct Units(pub u128);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUnits {
    Whole(u64),
    Decimal(String),
}

impl TryFrom<RawUnits> for Units {
    type Error = ParseUnitsError;

    fn try_from(raw: RawUnits) -> Result<Self, Self::Error> {
        match raw {
            RawUnits::Whole(n) => parse_units(&n.to_string(), DECIMALS).map(Units),
            RawUnits::Decimal(s) => parse_units(&s, DECIMALS).map(Units),
        }
    }
}

fn default_start() -> u64 {
    1_700_000_000
}

fn default_manager() -> String {
    "manager".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_start")]
    pub start: u64,
    /// USD prices scaled by 10 000, keyed by asset.
    #[serde(default)]
    pub prices: BTreeMap<String, u64>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One scripted action. Admin actions default `caller` to the configured admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Advance {
        secs: u64,
    },
    SetPrice {
        asset: String,
        price: u64,
    },
    /// Credit an account with base asset out of thin air.
    Faucet {
        account: String,
        amount: Units,
    },
    CreateTier {
        caller: Option<String>,
        name: String,
        #[serde(default = "default_manager")]
        manager: String,
        fee_per_second: Option<u64>,
        monthly_usd: Option<Units>,
        #[serde(default)]
        lockup_secs: u64,
    },
    SetFeePerSecond {
        caller: Option<String>,
        tier: u32,
        fee_per_second: u64,
    },
    SetMonthlyFeeUsd {
        caller: Option<String>,
        tier: u32,
        monthly_usd: Units,
    },
    RefreshTierRate {
        caller: Option<String>,
        tier: u32,
    },
    SetSubscribable {
        caller: Option<String>,
        tier: u32,
        subscribable: bool,
    },
    Mint {
        owner: String,
    },
    Fund {
        funder: String,
        key: u64,
        amount: Units,
    },
    Subscribe {
        caller: String,
        key: u64,
        tier: u32,
    },
    Open {
        owner: String,
        amount: Units,
        tier: u32,
    },
    Resolve {
        caller: String,
        key: u64,
    },
    Burn {
        caller: String,
        key: u64,
    },
    Liquidate {
        caller: String,
        key: u64,
    },
    AddRewardRecipient {
        caller: Option<String>,
        tier: u32,
        weight: u64,
    },
    FundRewards {
        funder: String,
        amount: Units,
    },
    StartRewards {
        caller: Option<String>,
        rate: Units,
    },
    StopRewards {
        caller: Option<String>,
    },
    /// External yield earned by the vault.
    VaultYield {
        amount: Units,
    },
    Snapshot,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Advance { .. } => "advance",
            Step::SetPrice { .. } => "set_price",
            Step::Faucet { .. } => "faucet",
            Step::CreateTier { .. } => "create_tier",
            Step::SetFeePerSecond { .. } => "set_fee_per_second",
            Step::SetMonthlyFeeUsd { .. } => "set_monthly_fee_usd",
            Step::RefreshTierRate { .. } => "refresh_tier_rate",
            Step::SetSubscribable { .. } => "set_subscribable",
            Step::Mint { .. } => "mint",
            Step::Fund { .. } => "fund",
            Step::Subscribe { .. } => "subscribe",
            Step::Open { .. } => "open",
            Step::Resolve { .. } => "resolve",
            Step::Burn { .. } => "burn",
            Step::Liquidate { .. } => "liquidate",
            Step::AddRewardRecipient { .. } => "add_reward_recipient",
            Step::FundRewards { .. } => "fund_rewards",
            Step::StartRewards { .. } => "start_rewards",
            Step::StopRewards { .. } => "stop_rewards",
            Step::VaultYield { .. } => "vault_yield",
            Step::Snapshot => "snapshot",
        }
    }
}

/// Full ledger state as of one instant.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub at: u64,
    pub positions: Vec<PositionView>,
    pub reward_pool: RewardPool,
    pub vault: SharePriceVault,
    /// Balances of every account the scenario touched, in whole units.
    pub balances: BTreeMap<Address, String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StepResult {
    Done,
    Key(KeyId),
    Tier(TierId),
    Amount(u128),
    Burn(BurnReceipt),
    Liquidation(LiquidationReceipt),
    Snapshot(Box<Snapshot>),
}

#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub at: u64,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ReplayLedger = AccessKeyLedger<MemoryRegistry, MemoryBank, SharePriceVault>;

pub struct Replay {
    ledger: ReplayLedger,
    clock: Arc<NullClock>,
    oracle: Arc<NullOracle>,
    accounts: BTreeSet<Address>,
}

impl Replay {
    pub fn new(config: LedgerConfig, scenario: &Scenario) -> Result<Self, LedgerError> {
        let clock = Arc::new(NullClock::new(scenario.start));
        let oracle = Arc::new(NullOracle::new());
        for (asset, price) in &scenario.prices {
            oracle.set_price(asset, u128::from(*price));
        }
        let accounts = BTreeSet::from([config.treasury.clone(), config.custody.clone()]);
        let ledger = AccessKeyLedger::new(
            config,
            MemoryRegistry::new(),
            MemoryBank::new(),
            SharePriceVault::new(),
            clock.clone(),
            oracle.clone(),
        )?;
        Ok(Self {
            ledger,
            clock,
            oracle,
            accounts,
        })
    }

    pub fn ledger(&self) -> &ReplayLedger {
        &self.ledger
    }

    pub fn now(&self) -> u64 {
        self.clock.now().as_secs()
    }

    pub fn run(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let (result, error) = match self.apply(step) {
                Ok(result) => (Some(result), None),
                Err(e) => {
                    tracing::warn!(step = index, action = step.name(), error = %e, "step failed");
                    (None, Some(e.to_string()))
                }
            };
            outcomes.push(StepOutcome {
                step: index,
                at: self.now(),
                action: step.name(),
                result,
                error,
            });
        }
        outcomes
    }

    fn account(&mut self, name: &str) -> Address {
        let address = Address::new(name);
        self.accounts.insert(address.clone());
        address
    }

    fn admin_or(&mut self, caller: &Option<String>) -> Address {
        match caller {
            Some(name) => self.account(name),
            None => self.ledger.config().admin.clone(),
        }
    }

    pub fn apply(&mut self, step: &Step) -> Result<StepResult, LedgerError> {
        match step {
            Step::Advance { secs } => {
                self.clock.advance(*secs);
                Ok(StepResult::Done)
            }
            Step::SetPrice { asset, price } => {
                self.oracle.set_price(asset, u128::from(*price));
                Ok(StepResult::Done)
            }
            Step::Faucet { account, amount } => {
                let account = self.account(account);
                self.ledger.bank_mut().mint(&account, amount.0)?;
                Ok(StepResult::Amount(amount.0))
            }
            Step::CreateTier {
                caller,
                name,
                manager,
                fee_per_second,
                monthly_usd,
                lockup_secs,
            } => {
                let caller = self.admin_or(caller);
                let fee = match (fee_per_second, monthly_usd) {
                    (Some(rate), None) => FeeSpec::PerSecond(u128::from(*rate)),
                    (None, Some(fee)) => FeeSpec::MonthlyUsd {
                        asset: self.ledger.config().price_asset.clone(),
                        monthly_fee_usd: fee.0,
                    },
                    _ => {
                        return Err(LedgerError::Config(
                            "set exactly one of fee_per_second and monthly_usd".to_string(),
                        ))
                    }
                };
                let spec = TierSpec {
                    name: name.clone(),
                    manager: Address::new(manager.as_str()),
                    fee,
                    subscribable: true,
                    lockup_secs: *lockup_secs,
                };
                self.ledger.create_tier(&caller, spec).map(StepResult::Tier)
            }
            Step::SetFeePerSecond {
                caller,
                tier,
                fee_per_second,
            } => {
                let caller = self.admin_or(caller);
                self.ledger
                    .set_fee_per_second(&caller, TierId(*tier), u128::from(*fee_per_second))?;
                Ok(StepResult::Done)
            }
            Step::SetMonthlyFeeUsd {
                caller,
                tier,
                monthly_usd,
            } => {
                let caller = self.admin_or(caller);
                self.ledger
                    .set_monthly_fee_usd(&caller, TierId(*tier), monthly_usd.0)
                    .map(StepResult::Amount)
            }
            Step::RefreshTierRate { caller, tier } => {
                let caller = self.admin_or(caller);
                self.ledger
                    .refresh_tier_rate(&caller, TierId(*tier))
                    .map(StepResult::Amount)
            }
            Step::SetSubscribable {
                caller,
                tier,
                subscribable,
            } => {
                let caller = self.admin_or(caller);
                self.ledger.set_subscribable(&caller, TierId(*tier), *subscribable)?;
                Ok(StepResult::Done)
            }
            Step::Mint { owner } => {
                let owner = self.account(owner);
                self.ledger.mint(&owner).map(StepResult::Key)
            }
            Step::Fund { funder, key, amount } => {
                let funder = self.account(funder);
                self.ledger.fund(&funder, KeyId(*key), amount.0).map(StepResult::Amount)
            }
            Step::Subscribe { caller, key, tier } => {
                let caller = self.account(caller);
                self.ledger.subscribe(&caller, KeyId(*key), TierId(*tier))?;
                Ok(StepResult::Done)
            }
            Step::Open { owner, amount, tier } => {
                let owner = self.account(owner);
                self.ledger
                    .mint_fund_subscribe(&owner, amount.0, TierId(*tier))
                    .map(StepResult::Key)
            }
            Step::Resolve { caller, key } => {
                let caller = self.account(caller);
                self.ledger.resolve_debt(&caller, KeyId(*key)).map(StepResult::Amount)
            }
            Step::Burn { caller, key } => {
                let caller = self.account(caller);
                self.ledger.burn(&caller, KeyId(*key)).map(StepResult::Burn)
            }
            Step::Liquidate { caller, key } => {
                let caller = self.account(caller);
                self.ledger.liquidate(&caller, KeyId(*key)).map(StepResult::Liquidation)
            }
            Step::AddRewardRecipient { caller, tier, weight } => {
                let caller = self.admin_or(caller);
                self.ledger
                    .add_reward_recipient(&caller, TierId(*tier), u128::from(*weight))?;
                Ok(StepResult::Done)
            }
            Step::FundRewards { funder, amount } => {
                let funder = self.account(funder);
                self.ledger.fund_rewards(&funder, amount.0)?;
                Ok(StepResult::Amount(amount.0))
            }
            Step::StartRewards { caller, rate } => {
                let caller = self.admin_or(caller);
                self.ledger.start_rewards(&caller, rate.0)?;
                Ok(StepResult::Done)
            }
            Step::StopRewards { caller } => {
                let caller = self.admin_or(caller);
                self.ledger.stop_rewards(&caller)?;
                Ok(StepResult::Done)
            }
            Step::VaultYield { amount } => {
                let custody = self.ledger.config().custody.clone();
                self.ledger.bank_mut().mint(&custody, amount.0)?;
                self.ledger.vault_mut().accrue_yield(amount.0)?;
                Ok(StepResult::Amount(amount.0))
            }
            Step::Snapshot => self.snapshot().map(|s| StepResult::Snapshot(Box::new(s))),
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        let positions = self
            .ledger
            .keys()
            .map(|key| self.ledger.position(key))
            .collect::<Result<Vec<_>, _>>()?;
        let balances = self
            .accounts
            .iter()
            .map(|a| (a.clone(), format_units(self.ledger.bank().balance_of(a), DECIMALS)))
            .collect();
        Ok(Snapshot {
            at: self.now(),
            positions,
            reward_pool: self.ledger.reward_pool().clone(),
            vault: self.ledger.vault().clone(),
            balances,
        })
    }
}

//! Solvency policy, proportional unwind and seizure split.

use accesskey_types::math::bps_of;
use accesskey_types::{mul_div, LedgerParams, Rounding};
use serde::{Deserialize, Serialize};

/// A position's figures right after its checkpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    pub debt: u128,
    /// Reward credited into the position by this checkpoint.
    pub credited_reward: u128,
    /// Collateral value before the credit.
    pub value_before_rewards: u128,
    /// Collateral value after the credit.
    pub value: u128,
}

impl Settlement {
    /// Collateral that counts against debt under `params`.
    ///
    /// Resolve, burn and liquidate all use this one measure so that
    /// "resolvable" and "liquidatable" are exact complements.
    pub fn collateral(&self, params: &LedgerParams) -> u128 {
        if params.count_pending_rewards_toward_solvency {
            self.value
        } else {
            self.value_before_rewards
        }
    }

    /// `debt > collateral`. The equal case is resolvable.
    pub fn is_liquidatable(&self, params: &LedgerParams) -> bool {
        self.debt > self.collateral(params)
    }
}

/// Shares to remove so that withdrawing them pays at least `debt`.
///
/// `ceil(debt * shares / value)`, capped at `shares`. Returns `None` when a
/// non-zero debt meets a worthless position.
pub fn shares_to_unwind(debt: u128, shares: u128, value: u128) -> Option<u128> {
    if debt == 0 {
        return Some(0);
    }
    if value == 0 {
        return None;
    }
    mul_div(debt, shares, value, Rounding::Up).map(|s| s.min(shares))
}

/// How seized collateral is paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizureSplit {
    pub seized: u128,
    pub liquidator: u128,
    /// Offered back to the vault; goes to the treasury if the vault declines.
    pub sweep: u128,
    pub treasury: u128,
}

/// Liquidator takes `floor(seized * reward_bps)`, the vault is offered
/// `floor(rest * sweep_bps)` and the treasury gets the remainder.
pub fn split_seizure(seized: u128, params: &LedgerParams) -> Option<SeizureSplit> {
    let liquidator = bps_of(seized, params.liquidator_reward_bps)?;
    let rest = seized - liquidator;
    let sweep = bps_of(rest, params.vault_sweep_share_bps)?;
    Some(SeizureSplit {
        seized,
        liquidator,
        sweep,
        treasury: rest - sweep,
    })
}

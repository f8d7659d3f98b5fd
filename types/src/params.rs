//! Ledger parameters: the tunable economics shared by every position.
//!
//! Mutated only through the admin-guarded setters on the ledger.

use crate::math::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in the fee month used to convert monthly USD fees (30 days).
pub const SECONDS_PER_MONTH: u64 = 30 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("basis points {0} outside 0..=10000")]
    InvalidBasisPoints(u32),

    #[error("fee month length must be non-zero")]
    ZeroMonth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Share of seized collateral paid to the liquidator (basis points).
    #[serde(default = "default_liquidator_reward_bps")]
    pub liquidator_reward_bps: u32,

    /// Share of the post-reward seizure donated back to the vault (basis points).
    /// The rest goes to the treasury.
    #[serde(default)]
    pub vault_sweep_share_bps: u32,

    /// Whether reward credit not yet settled into a position counts toward
    /// its solvency in `resolve_debt`, `burn` and `liquidate`.
    #[serde(default = "default_true")]
    pub count_pending_rewards_toward_solvency: bool,

    /// Length of the fee month in seconds.
    #[serde(default = "default_seconds_per_month")]
    pub seconds_per_month: u64,
}

fn default_liquidator_reward_bps() -> u32 {
    500 // 5%
}

fn default_true() -> bool {
    true
}

fn default_seconds_per_month() -> u64 {
    SECONDS_PER_MONTH
}

impl LedgerParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        for bps in [self.liquidator_reward_bps, self.vault_sweep_share_bps] {
            if bps as u128 > BPS_DENOMINATOR {
                return Err(ParamsError::InvalidBasisPoints(bps));
            }
        }
        if self.seconds_per_month == 0 {
            return Err(ParamsError::ZeroMonth);
        }
        Ok(())
    }
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            liquidator_reward_bps: default_liquidator_reward_bps(),
            vault_sweep_share_bps: 0,
            count_pending_rewards_toward_solvency: true,
            seconds_per_month: SECONDS_PER_MONTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LedgerParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_basis_points_above_denominator() {
        let params = LedgerParams {
            liquidator_reward_bps: 10_001,
            ..LedgerParams::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::InvalidBasisPoints(10_001)));

        let params = LedgerParams {
            vault_sweep_share_bps: 20_000,
            ..LedgerParams::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::InvalidBasisPoints(20_000)));
    }

    #[test]
    fn rejects_zero_month() {
        let params = LedgerParams {
            seconds_per_month: 0,
            ..LedgerParams::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::ZeroMonth));
    }
}

//! Per-key collateral positions.

use accesskey_fees::DebtCheckpoint;
use accesskey_rewards::DepositCheckpoint;
use accesskey_types::{Address, KeyId, TierId, Timestamp};
use serde::{Deserialize, Serialize};

/// Collateral, debt and reward state backing one access key.
///
/// Collateral is held as vault shares; its base-asset value is whatever the
/// vault currently redeems those shares for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub key: KeyId,
    pub locked_shares: u128,
    pub tier: Option<TierId>,
    /// When the current tier was subscribed; drives the lock-up.
    pub subscribed_at: Option<Timestamp>,
    pub debt: DebtCheckpoint,
    pub rewards: DepositCheckpoint,
}

impl Position {
    pub fn new(key: KeyId, now: Timestamp) -> Self {
        Self {
            key,
            locked_shares: 0,
            tier: None,
            subscribed_at: None,
            debt: DebtCheckpoint::new(now),
            rewards: DepositCheckpoint::default(),
        }
    }

    pub fn last_checkpoint_at(&self) -> Timestamp {
        self.debt.last_checkpoint_at
    }
}

/// Read-only snapshot of a position as of a query time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub key: KeyId,
    pub owner: Address,
    pub tier: Option<TierId>,
    pub subscribed_at: Option<Timestamp>,
    pub locked_shares: u128,
    /// Base-asset value of `locked_shares`, pending reward excluded.
    pub locked_value: u128,
    pub debt: u128,
    /// Reward earned but not yet credited into `locked_shares`.
    pub pending_rewards: u128,
    pub last_checkpoint_at: Timestamp,
    pub liquidatable: bool,
}

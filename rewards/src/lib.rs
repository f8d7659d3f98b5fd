//! Reward streaming for access-key positions.
//!
//! A global [`RewardPool`] emits `reward_rate` per second, split across
//! registered tiers by static weight. Each tier's share is then split across
//! the positions subscribed to it in proportion to their locked shares, using
//! an accumulator-per-share so settlement is O(1) regardless of depositor count.
//!
//! Settlement is lazy: nothing moves until a position or the pool is touched.

pub mod accumulator;
pub mod distributor;
pub mod error;
pub mod pool;
pub mod share;

pub use accumulator::{accrued_to, RewardAccumulator};
pub use distributor::RewardsDistributor;
pub use error::RewardError;
pub use pool::{Emission, RewardPool};
pub use share::{DepositCheckpoint, TierRewards};

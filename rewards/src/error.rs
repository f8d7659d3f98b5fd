//! Reward-specific errors.

use accesskey_types::{TierId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("time order violated: {later} precedes {earlier}")]
    InvalidTimeOrder { earlier: Timestamp, later: Timestamp },

    #[error("{0} is already a reward recipient")]
    DuplicateRecipient(TierId),

    #[error("recipient weight must be positive")]
    ZeroWeight,

    #[error("reward rate must be positive")]
    ZeroRate,

    #[error("arithmetic overflow in reward computation")]
    Overflow,
}

//! Fee-specific errors.

use accesskey_types::{OracleError, TierId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("time order violated: {later} precedes {earlier}")]
    InvalidTimeOrder { earlier: Timestamp, later: Timestamp },

    #[error("arithmetic overflow in fee computation")]
    Overflow,

    #[error("oracle returned a zero price for {0}")]
    ZeroPrice(String),

    #[error("{0} is not priced in USD")]
    NotOraclePriced(TierId),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

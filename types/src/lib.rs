//! Fundamental types for the access-key ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! timestamps and clocks, account addresses, key/tier identifiers, fixed-point
//! arithmetic helpers, ledger parameters, and the price-oracle capability.

pub mod address;
pub mod ids;
pub mod math;
pub mod oracle;
pub mod params;
pub mod time;

pub use address::Address;
pub use ids::{KeyId, TierId};
pub use math::{mul_div, mul_div_rem, Rounding};
pub use oracle::{OracleError, PriceOracle};
pub use params::{LedgerParams, ParamsError};
pub use time::{Clock, SystemClock, Timestamp};

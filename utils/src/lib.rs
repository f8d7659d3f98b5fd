//! Shared utilities for the access-key ledger binaries.

pub mod logging;
pub mod time;
pub mod units;

pub use logging::{init_logging, LogFormat, ParseLogFormatError};
pub use time::format_duration;
pub use units::{format_units, parse_units, ParseUnitsError};

//! Nullable infrastructure for deterministic testing.
//!
//! Every environmental dependency of the ledger (clock, price feed, storage)
//! sits behind a trait. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod oracle;
pub mod store;

pub use clock::NullClock;
pub use oracle::NullOracle;
pub use store::NullStore;

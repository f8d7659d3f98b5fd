//! Abstract storage for the access-key ledger.
//!
//! Backends implement [`LedgerStore`]; the ledger serializes its own records,
//! so this crate does not depend on the ledger's types.

pub mod error;
pub mod ledger;

pub use error::StoreError;
pub use ledger::LedgerStore;

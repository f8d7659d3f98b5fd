//! Collateralized access-key ledger.
//!
//! Each access key is backed by a position: collateral locked as vault
//! shares, a subscription tier whose fee accrues against it, and a share of
//! the streamed rewards. Once accrued debt exceeds the collateral anyone may
//! liquidate the position for a reward.
//!
//! This crate handles:
//! - Positions and their checkpoint protocol (`engine`)
//! - Solvency policy, proportional unwind and seizure split (`liquidation`)
//! - Tier and reward administration (`admin`)
//! - Read-only inspection (`query`) and persistence (`persist`)
//! - The collaborator capabilities: ownership, asset bank, vault, authorization

pub mod access;
pub mod admin;
pub mod bank;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod liquidation;
pub mod persist;
pub mod position;
pub mod query;
pub mod registry;
pub mod vault;

pub use access::AccessAuthorization;
pub use bank::{AssetBank, BankError, MemoryBank};
pub use config::LedgerConfig;
pub use engine::{AccessKeyLedger, BurnReceipt, LiquidationReceipt};
pub use error::LedgerError;
pub use events::{EventBus, LedgerEvent};
pub use liquidation::{shares_to_unwind, split_seizure, SeizureSplit, Settlement};
pub use position::{Position, PositionView};
pub use registry::{MemoryRegistry, OwnershipRegistry, RegistryError};
pub use vault::{PassthroughVault, SharePriceVault, Vault, VaultError};

//! Fee accrual for access-key positions.
//!
//! A tier's fee is a piecewise-constant rate over time. Debt owed by a
//! position is the integral of that rate since its last checkpoint:
//! `debt(now) = checkpointed_debt + Σ(rate_i × overlap_i)`
//!
//! This crate handles:
//! - The append-only fee schedule and its integration (`schedule`)
//! - Per-position debt checkpoints (`accrual`)
//! - Subscription tiers, including USD-priced tiers frozen at oracle reads (`tier`)

pub mod accrual;
pub mod error;
pub mod schedule;
pub mod tier;

pub use accrual::{accrued_since, DebtCheckpoint};
pub use error::FeeError;
pub use schedule::{FeeRatePoint, FeeSchedule};
pub use tier::{usd_fee_to_rate, FeeSource, FeeSpec, SubscriptionTier, TierSpec};

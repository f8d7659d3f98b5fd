//! Ledger error taxonomy.
//!
//! Every failure leaves positions, balances and ownership as they were.

use crate::bank::BankError;
use crate::registry::RegistryError;
use crate::vault::VaultError;
use accesskey_fees::FeeError;
use accesskey_rewards::RewardError;
use accesskey_store::StoreError;
use accesskey_types::{Address, KeyId, OracleError, ParamsError, TierId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be positive")]
    InvalidAmount,

    #[error("{0} is not a supported tier")]
    UnsupportedTier(TierId),

    #[error("{0} is not subscribable")]
    TierLocked(TierId),

    #[error("{caller} is neither owner nor approved for {key}")]
    ApprovalRequired { caller: Address, key: KeyId },

    #[error("{key} is not solvent: debt {debt} exceeds collateral {collateral}")]
    NotSolvent { key: KeyId, debt: u128, collateral: u128 },

    #[error("{key} is solvent: debt {debt} within collateral {collateral}")]
    Solvent { key: KeyId, debt: u128, collateral: u128 },

    #[error("insufficient funds in {key}: debt {debt}, collateral {collateral}")]
    InsufficientFunds { key: KeyId, debt: u128, collateral: u128 },

    #[error("basis points {0} outside 0..=10000")]
    InvalidBasisPoints(u32),

    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("time order violated: {later} precedes {earlier}")]
    InvalidTimeOrder { earlier: Timestamp, later: Timestamp },

    #[error("{0} not found")]
    KeyNotFound(KeyId),

    #[error("{0} not found")]
    TierNotFound(TierId),

    #[error("{0} is not authorized for this operation")]
    Unauthorized(Address),

    #[error("{key} is locked up until {until}")]
    LockupActive { key: KeyId, until: Timestamp },

    #[error("{0} is already a reward recipient")]
    DuplicateRecipient(TierId),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("asset transfer failed: {0}")]
    Transfer(String),

    #[error("ownership registry: {0}")]
    Registry(String),

    #[error("vault: {0}")]
    Vault(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<FeeError> for LedgerError {
    fn from(e: FeeError) -> Self {
        match e {
            FeeError::InvalidTimeOrder { earlier, later } => Self::InvalidTimeOrder { earlier, later },
            FeeError::Overflow => Self::Overflow,
            FeeError::ZeroPrice(asset) => Self::OracleUnavailable(format!("zero price for {asset}")),
            FeeError::NotOraclePriced(tier) => Self::Config(format!("{tier} is not priced in USD")),
            FeeError::Oracle(e) => e.into(),
        }
    }
}

impl From<RewardError> for LedgerError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::InvalidTimeOrder { earlier, later } => Self::InvalidTimeOrder { earlier, later },
            RewardError::DuplicateRecipient(tier) => Self::DuplicateRecipient(tier),
            RewardError::ZeroWeight | RewardError::ZeroRate => Self::InvalidAmount,
            RewardError::Overflow => Self::Overflow,
        }
    }
}

impl From<OracleError> for LedgerError {
    fn from(e: OracleError) -> Self {
        Self::OracleUnavailable(e.to_string())
    }
}

impl From<ParamsError> for LedgerError {
    fn from(e: ParamsError) -> Self {
        match e {
            ParamsError::InvalidBasisPoints(bps) => Self::InvalidBasisPoints(bps),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<BankError> for LedgerError {
    fn from(e: BankError) -> Self {
        Self::Transfer(e.to_string())
    }
}

impl From<RegistryError> for LedgerError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e.to_string())
    }
}

impl From<VaultError> for LedgerError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::Overflow => Self::Overflow,
            other => Self::Vault(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_failures_surface_as_unavailable() {
        let e: LedgerError = FeeError::Oracle(OracleError::StalePrice { asset: "CMK".into() }).into();
        assert_eq!(e, LedgerError::OracleUnavailable("price for CMK is stale".into()));
    }

    #[test]
    fn time_order_is_preserved_across_layers() {
        let (earlier, later) = (Timestamp::new(10), Timestamp::new(5));
        let e: LedgerError = RewardError::InvalidTimeOrder { earlier, later }.into();
        assert_eq!(e, LedgerError::InvalidTimeOrder { earlier, later });
    }

    #[test]
    fn bad_basis_points_keep_their_value() {
        let e: LedgerError = ParamsError::InvalidBasisPoints(12_000).into();
        assert_eq!(e, LedgerError::InvalidBasisPoints(12_000));
    }
}

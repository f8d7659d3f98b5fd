//! The authorization surface consumed by access-gated services.

use crate::bank::AssetBank;
use crate::engine::AccessKeyLedger;
use crate::registry::OwnershipRegistry;
use crate::vault::Vault;
use accesskey_types::{Address, KeyId};

pub trait AccessAuthorization {
    /// True iff `account` owns `key` and the position is not liquidatable.
    fn authorize(&self, account: &Address, key: KeyId) -> bool;
}

impl<R, B, V> AccessAuthorization for AccessKeyLedger<R, B, V>
where
    R: OwnershipRegistry,
    B: AssetBank,
    V: Vault + Clone,
{
    fn authorize(&self, account: &Address, key: KeyId) -> bool {
        match self.registry.owner_of(key) {
            Ok(owner) if &owner == account => matches!(self.is_liquidatable(key), Ok(false)),
            _ => false,
        }
    }
}

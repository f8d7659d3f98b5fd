use crate::StoreError;
use accesskey_types::{KeyId, TierId};

/// Store trait for persisting ledger state to durable storage.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on `accesskey-ledger`
/// (which would create a circular dependency). The ledger serializes and
/// deserializes its own records.
pub trait LedgerStore {
    fn get_position(&self, key: KeyId) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_position(&self, key: KeyId, position: &[u8]) -> Result<(), StoreError>;
    fn delete_position(&self, key: KeyId) -> Result<(), StoreError>;
    /// All stored positions, ordered by key id.
    fn iter_positions(&self) -> Result<Vec<(KeyId, Vec<u8>)>, StoreError>;

    fn put_tier(&self, tier: TierId, record: &[u8]) -> Result<(), StoreError>;
    /// All stored tiers, ordered by tier id.
    fn iter_tiers(&self) -> Result<Vec<(TierId, Vec<u8>)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}

//! Nullable store: thread-safe in-memory storage for testing.

use accesskey_store::{LedgerStore, StoreError};
use accesskey_types::{KeyId, TierId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// An in-memory ledger store for testing.
#[derive(Debug, Default)]
pub struct NullStore {
    positions: Mutex<BTreeMap<KeyId, Vec<u8>>>,
    tiers: Mutex<BTreeMap<TierId, Vec<u8>>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_count(&self) -> usize {
        self.positions.lock().unwrap().len()
    }
}

fn lock<T>(table: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    table
        .lock()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

impl LedgerStore for NullStore {
    fn get_position(&self, key: KeyId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.positions)?.get(&key).cloned())
    }

    fn put_position(&self, key: KeyId, position: &[u8]) -> Result<(), StoreError> {
        lock(&self.positions)?.insert(key, position.to_vec());
        Ok(())
    }

    fn delete_position(&self, key: KeyId) -> Result<(), StoreError> {
        lock(&self.positions)?.remove(&key);
        Ok(())
    }

    fn iter_positions(&self) -> Result<Vec<(KeyId, Vec<u8>)>, StoreError> {
        Ok(lock(&self.positions)?
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn put_tier(&self, tier: TierId, record: &[u8]) -> Result<(), StoreError> {
        lock(&self.tiers)?.insert(tier, record.to_vec());
        Ok(())
    }

    fn iter_tiers(&self) -> Result<Vec<(TierId, Vec<u8>)>, StoreError> {
        Ok(lock(&self.tiers)?
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.meta)?.get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        lock(&self.meta)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

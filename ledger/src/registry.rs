//! Ownership of access keys.
//!
//! The ledger only needs mint, burn and ownership checks; enumeration and
//! approvals live with the registry implementation.

use accesskey_types::{Address, KeyId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{0} does not exist")]
    UnknownKey(KeyId),

    #[error("{caller} may not act on {key}")]
    NotAuthorized { caller: Address, key: KeyId },

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
}

pub trait OwnershipRegistry {
    /// Create a key owned by `owner`. Ids are sequential and never reused.
    fn mint(&mut self, owner: &Address) -> Result<KeyId, RegistryError>;

    fn burn(&mut self, key: KeyId) -> Result<(), RegistryError>;

    fn owner_of(&self, key: KeyId) -> Result<Address, RegistryError>;

    fn is_approved_or_owner(&self, account: &Address, key: KeyId) -> bool;

    /// Keys held by `owner`, in ascending id order.
    fn keys_of(&self, owner: &Address) -> Vec<KeyId>;
}

/// In-memory registry with an owner index and single-operator approvals.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryRegistry {
    next_id: u64,
    owners: BTreeMap<KeyId, Address>,
    by_owner: BTreeMap<Address, BTreeSet<KeyId>>,
    approvals: BTreeMap<KeyId, Address>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `operator` act on `key` on behalf of its owner.
    pub fn approve(&mut self, caller: &Address, key: KeyId, operator: &Address) -> Result<(), RegistryError> {
        let owner = self.owner_of(key)?;
        if &owner != caller {
            return Err(RegistryError::NotAuthorized {
                caller: caller.clone(),
                key,
            });
        }
        self.approvals.insert(key, operator.clone());
        Ok(())
    }

    /// Move `key` to `to`. Clears any approval.
    pub fn transfer(&mut self, caller: &Address, to: &Address, key: KeyId) -> Result<(), RegistryError> {
        if !to.is_valid() {
            return Err(RegistryError::InvalidAddress(to.to_string()));
        }
        if !self.is_approved_or_owner(caller, key) {
            return Err(RegistryError::NotAuthorized {
                caller: caller.clone(),
                key,
            });
        }
        let from = self.owner_of(key)?;
        self.unindex(&from, key);
        self.approvals.remove(&key);
        self.owners.insert(key, to.clone());
        self.by_owner.entry(to.clone()).or_default().insert(key);
        Ok(())
    }

    pub fn approved(&self, key: KeyId) -> Option<&Address> {
        self.approvals.get(&key)
    }

    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    fn unindex(&mut self, owner: &Address, key: KeyId) {
        if let Some(keys) = self.by_owner.get_mut(owner) {
            keys.remove(&key);
            if keys.is_empty() {
                self.by_owner.remove(owner);
            }
        }
    }
}

impl OwnershipRegistry for MemoryRegistry {
    fn mint(&mut self, owner: &Address) -> Result<KeyId, RegistryError> {
        if !owner.is_valid() {
            return Err(RegistryError::InvalidAddress(owner.to_string()));
        }
        let key = KeyId(self.next_id);
        self.next_id += 1;
        self.owners.insert(key, owner.clone());
        self.by_owner.entry(owner.clone()).or_default().insert(key);
        Ok(key)
    }

    fn burn(&mut self, key: KeyId) -> Result<(), RegistryError> {
        let owner = self.owners.remove(&key).ok_or(RegistryError::UnknownKey(key))?;
        self.unindex(&owner, key);
        self.approvals.remove(&key);
        Ok(())
    }

    fn owner_of(&self, key: KeyId) -> Result<Address, RegistryError> {
        self.owners.get(&key).cloned().ok_or(RegistryError::UnknownKey(key))
    }

    fn is_approved_or_owner(&self, account: &Address, key: KeyId) -> bool {
        self.owners.get(&key) == Some(account) || self.approvals.get(&key) == Some(account)
    }

    fn keys_of(&self, owner: &Address) -> Vec<KeyId> {
        self.by_owner
            .get(owner)
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }
}

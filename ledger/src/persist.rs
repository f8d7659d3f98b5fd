//! Saving and restoring ledger state through a [`LedgerStore`].

use crate::bank::AssetBank;
use crate::config::LedgerConfig;
use crate::engine::AccessKeyLedger;
use crate::position::Position;
use crate::registry::OwnershipRegistry;
use crate::vault::Vault;
use crate::LedgerError;
use accesskey_fees::SubscriptionTier;
use accesskey_rewards::RewardsDistributor;
use accesskey_store::{LedgerStore, StoreError};
use accesskey_types::{Address, Clock, LedgerParams, PriceOracle};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const META_REWARDS: &[u8] = b"rewards";
const META_PARAMS: &[u8] = b"params";
const META_TREASURY: &[u8] = b"treasury";

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8], record: impl fmt::Display) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Corruption(format!("{record}: {e}")))
}

impl<R, B, V> AccessKeyLedger<R, B, V>
where
    R: OwnershipRegistry,
    B: AssetBank,
    V: Vault + Clone,
{
    /// Persist positions, tiers, reward state and mutable configuration.
    ///
    /// Positions in the store that no longer exist here are deleted.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), LedgerError> {
        for (key, _) in store.iter_positions()? {
            if !self.positions.contains_key(&key) {
                store.delete_position(key)?;
            }
        }
        for (key, position) in &self.positions {
            store.put_position(*key, &encode(position)?)?;
        }
        for (id, tier) in &self.tiers {
            store.put_tier(*id, &encode(tier)?)?;
        }
        store.put_meta(META_REWARDS, &encode(&self.rewards)?)?;
        store.put_meta(META_PARAMS, &encode(&self.config.params)?)?;
        store.put_meta(META_TREASURY, &encode(&self.config.treasury)?)?;
        tracing::debug!(
            positions = self.positions.len(),
            tiers = self.tiers.len(),
            "ledger saved"
        );
        Ok(())
    }

    /// Restore a ledger saved with [`save_to_store`](Self::save_to_store).
    ///
    /// Collaborators are supplied by the caller. Stored parameters and
    /// treasury take precedence over `config`.
    pub fn load_from_store(
        store: &dyn LedgerStore,
        mut config: LedgerConfig,
        registry: R,
        bank: B,
        vault: V,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self, LedgerError> {
        if let Some(bytes) = store.get_meta(META_PARAMS)? {
            config.params = decode::<LedgerParams>(&bytes, "params")?;
        }
        if let Some(bytes) = store.get_meta(META_TREASURY)? {
            config.treasury = decode::<Address>(&bytes, "treasury")?;
        }
        let mut ledger = Self::new(config, registry, bank, vault, clock, oracle)?;
        if let Some(bytes) = store.get_meta(META_REWARDS)? {
            ledger.rewards = decode::<RewardsDistributor>(&bytes, "rewards")?;
        }

        let mut tiers = BTreeMap::new();
        for (id, bytes) in store.iter_tiers()? {
            tiers.insert(id, decode::<SubscriptionTier>(&bytes, id)?);
        }
        let mut positions = BTreeMap::new();
        for (key, bytes) in store.iter_positions()? {
            positions.insert(key, decode::<Position>(&bytes, key)?);
        }
        tracing::info!(positions = positions.len(), tiers = tiers.len(), "ledger loaded");
        ledger.tiers = tiers;
        ledger.positions = positions;
        Ok(ledger)
    }
}

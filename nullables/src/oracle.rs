//! Nullable price oracle: scripted prices and failures.

use accesskey_types::{OracleError, PriceOracle};
use std::collections::HashMap;
use std::sync::Mutex;

/// A price feed whose answers are set by the test.
///
/// Assets without a configured price report [`OracleError::Unavailable`].
#[derive(Debug, Default)]
pub struct NullOracle {
    prices: Mutex<HashMap<String, Result<u128, OracleError>>>,
}

impl NullOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle quoting one asset.
    pub fn with_price(asset: &str, price: u128) -> Self {
        let oracle = Self::new();
        oracle.set_price(asset, price);
        oracle
    }

    pub fn set_price(&self, asset: &str, price: u128) {
        self.prices.lock().unwrap().insert(asset.to_string(), Ok(price));
    }

    /// Make the next reads for `asset` report a stale price.
    pub fn set_stale(&self, asset: &str) {
        self.prices.lock().unwrap().insert(
            asset.to_string(),
            Err(OracleError::StalePrice {
                asset: asset.to_string(),
            }),
        );
    }

    pub fn clear(&self, asset: &str) {
        self.prices.lock().unwrap().remove(asset);
    }
}

impl PriceOracle for NullOracle {
    fn get_price(&self, asset: &str) -> Result<u128, OracleError> {
        self.prices
            .lock()
            .unwrap()
            .get(asset)
            .cloned()
            .unwrap_or_else(|| {
                Err(OracleError::Unavailable {
                    asset: asset.to_string(),
                })
            })
    }
}

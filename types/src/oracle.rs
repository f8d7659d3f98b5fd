//! Price-oracle capability.

use thiserror::Error;

/// Failure modes of a price feed. The core propagates these; it never
/// substitutes a default price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("price for {asset} is stale")]
    StalePrice { asset: String },

    #[error("price for {asset} is unavailable")]
    Unavailable { asset: String },
}

/// Supplies the price of one unit of an asset in fixed-point USD terms,
/// scaled by [`crate::math::PRICE_DENOMINATOR`].
pub trait PriceOracle {
    fn get_price(&self, asset: &str) -> Result<u128, OracleError>;
}

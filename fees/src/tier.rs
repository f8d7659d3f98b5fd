//! Subscription tiers.
//!
//! A tier is a fee policy shared by many positions. USD-priced tiers convert
//! their monthly fee into a per-second base-asset rate using the oracle price
//! read at the moment of the change; the result is captured as a new schedule
//! point and stays frozen until the next explicit change or refresh.

use crate::error::FeeError;
use crate::schedule::FeeSchedule;
use accesskey_types::math::PRICE_DENOMINATOR;
use accesskey_types::{mul_div, Address, PriceOracle, Rounding, TierId, Timestamp};
use serde::{Deserialize, Serialize};

/// How a new tier is priced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSpec {
    /// A fixed rate in base-asset raw units per second.
    PerSecond(u128),
    /// A monthly fee in USD (18-decimal fixed point) converted through the oracle.
    MonthlyUsd { asset: String, monthly_fee_usd: u128 },
}

/// Parameters for creating a tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    pub manager: Address,
    pub fee: FeeSpec,
    #[serde(default = "default_true")]
    pub subscribable: bool,
    /// Minimum seconds a position must stay subscribed before it can be burned.
    #[serde(default)]
    pub lockup_secs: u64,
}

fn default_true() -> bool {
    true
}

/// Where a tier's current rate came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSource {
    PerSecond,
    MonthlyUsd {
        asset: String,
        monthly_fee_usd: u128,
        /// Oracle price captured at the last conversion.
        price: u128,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTier {
    pub id: TierId,
    pub name: String,
    pub manager: Address,
    pub subscribable: bool,
    pub lockup_secs: u64,
    pub source: FeeSource,
    schedule: FeeSchedule,
}

/// Convert a monthly USD fee into base-asset raw units per second, given the
/// USD price of `asset`.
///
/// `floor(monthly_fee_usd * PRICE_DENOMINATOR / (price * seconds_per_month))`
pub fn usd_fee_to_rate(
    asset: &str,
    monthly_fee_usd: u128,
    price: u128,
    seconds_per_month: u64,
) -> Result<u128, FeeError> {
    if price == 0 {
        return Err(FeeError::ZeroPrice(asset.to_string()));
    }
    let denominator = price
        .checked_mul(seconds_per_month as u128)
        .ok_or(FeeError::Overflow)?;
    mul_div(monthly_fee_usd, PRICE_DENOMINATOR, denominator, Rounding::Down).ok_or(FeeError::Overflow)
}

impl SubscriptionTier {
    /// Build a tier from its spec, reading the oracle once if it is USD-priced.
    pub fn from_spec(
        id: TierId,
        spec: TierSpec,
        seconds_per_month: u64,
        oracle: &dyn PriceOracle,
        now: Timestamp,
    ) -> Result<Self, FeeError> {
        let (source, rate) = match spec.fee {
            FeeSpec::PerSecond(rate) => (FeeSource::PerSecond, rate),
            FeeSpec::MonthlyUsd {
                asset,
                monthly_fee_usd,
            } => {
                let price = oracle.get_price(&asset)?;
                let rate = usd_fee_to_rate(&asset, monthly_fee_usd, price, seconds_per_month)?;
                (
                    FeeSource::MonthlyUsd {
                        asset,
                        monthly_fee_usd,
                        price,
                    },
                    rate,
                )
            }
        };
        Ok(Self {
            id,
            name: spec.name,
            manager: spec.manager,
            subscribable: spec.subscribable,
            lockup_secs: spec.lockup_secs,
            source,
            schedule: FeeSchedule::new(rate, now),
        })
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    /// The most recently captured rate.
    pub fn fee_per_second(&self) -> u128 {
        self.schedule.current_rate()
    }

    /// Switch to a fixed per-second rate from `now` forward.
    pub fn set_fee_per_second(&mut self, fee_per_second: u128, now: Timestamp) -> Result<(), FeeError> {
        self.schedule.push_rate(fee_per_second, now)?;
        self.source = FeeSource::PerSecond;
        Ok(())
    }

    /// Change the monthly USD fee; the rate is converted at the current oracle price.
    ///
    /// A per-second tier becomes USD-priced in `asset`. Returns the new rate.
    pub fn set_monthly_fee_usd(
        &mut self,
        asset: &str,
        monthly_fee_usd: u128,
        seconds_per_month: u64,
        oracle: &dyn PriceOracle,
        now: Timestamp,
    ) -> Result<u128, FeeError> {
        let price = oracle.get_price(asset)?;
        let rate = usd_fee_to_rate(asset, monthly_fee_usd, price, seconds_per_month)?;
        self.schedule.push_rate(rate, now)?;
        self.source = FeeSource::MonthlyUsd {
            asset: asset.to_string(),
            monthly_fee_usd,
            price,
        };
        Ok(rate)
    }

    /// Re-read the oracle and capture a new rate for the unchanged USD fee.
    pub fn refresh_rate(
        &mut self,
        seconds_per_month: u64,
        oracle: &dyn PriceOracle,
        now: Timestamp,
    ) -> Result<u128, FeeError> {
        let (asset, monthly_fee_usd) = match &self.source {
            FeeSource::MonthlyUsd {
                asset,
                monthly_fee_usd,
                ..
            } => (asset.clone(), *monthly_fee_usd),
            FeeSource::PerSecond => return Err(FeeError::NotOraclePriced(self.id)),
        };
        self.set_monthly_fee_usd(&asset, monthly_fee_usd, seconds_per_month, oracle, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesskey_types::math::BASE_UNIT;
    use accesskey_types::params::SECONDS_PER_MONTH;
    use accesskey_types::OracleError;
    use std::cell::Cell;

    struct FixedOracle(Cell<Option<u128>>);

    impl PriceOracle for FixedOracle {
        fn get_price(&self, asset: &str) -> Result<u128, OracleError> {
            self.0.get().ok_or_else(|| OracleError::Unavailable {
                asset: asset.to_string(),
            })
        }
    }

    fn usd_spec(monthly: u128) -> TierSpec {
        TierSpec {
            name: "basic".into(),
            manager: Address::new("manager"),
            fee: FeeSpec::MonthlyUsd {
                asset: "CMK".into(),
                monthly_fee_usd: monthly,
            },
            subscribable: true,
            lockup_secs: 3600,
        }
    }

    #[test]
    fn usd_conversion_floors_like_two_step_division() {
        // $100/month at $0.2514
        let rate = usd_fee_to_rate("CMK", 100 * BASE_UNIT, 2514, SECONDS_PER_MONTH).unwrap();
        assert_eq!(rate, 100 * BASE_UNIT * 10_000 / 2514 / SECONDS_PER_MONTH as u128);
    }

    #[test]
    fn seven_days_at_one_hundred_dollars() {
        let oracle = FixedOracle(Cell::new(Some(2_500)));
        let tier = SubscriptionTier::from_spec(TierId(0), usd_spec(100 * BASE_UNIT), SECONDS_PER_MONTH, &oracle, Timestamp::new(0))
            .unwrap();
        let debt = tier
            .schedule()
            .accrued_since(Timestamp::new(0), Timestamp::new(7 * 24 * 3600))
            .unwrap();
        assert_eq!(debt / BASE_UNIT, 93);
    }

    #[test]
    fn rate_is_frozen_until_refreshed() {
        let oracle = FixedOracle(Cell::new(Some(2_500)));
        let mut tier =
            SubscriptionTier::from_spec(TierId(0), usd_spec(100 * BASE_UNIT), SECONDS_PER_MONTH, &oracle, Timestamp::new(0))
                .unwrap();
        let before = tier.fee_per_second();

        oracle.0.set(Some(5_000));
        assert_eq!(tier.fee_per_second(), before);

        let after = tier.refresh_rate(SECONDS_PER_MONTH, &oracle, Timestamp::new(10)).unwrap();
        assert_eq!(after, usd_fee_to_rate("CMK", 100 * BASE_UNIT, 5_000, SECONDS_PER_MONTH).unwrap());
        assert_eq!(tier.schedule().points().len(), 2);
    }

    #[test]
    fn oracle_failure_propagates_and_leaves_tier_unchanged() {
        let oracle = FixedOracle(Cell::new(Some(2_500)));
        let mut tier =
            SubscriptionTier::from_spec(TierId(0), usd_spec(100 * BASE_UNIT), SECONDS_PER_MONTH, &oracle, Timestamp::new(0))
                .unwrap();
        oracle.0.set(None);
        let err = tier
            .set_monthly_fee_usd("CMK", 200 * BASE_UNIT, SECONDS_PER_MONTH, &oracle, Timestamp::new(5))
            .unwrap_err();
        assert!(matches!(err, FeeError::Oracle(OracleError::Unavailable { .. })));
        assert_eq!(tier.schedule().points().len(), 1);
    }

    #[test]
    fn zero_price_is_rejected() {
        let oracle = FixedOracle(Cell::new(Some(0)));
        let err = SubscriptionTier::from_spec(TierId(0), usd_spec(BASE_UNIT), SECONDS_PER_MONTH, &oracle, Timestamp::new(0))
            .unwrap_err();
        assert_eq!(err, FeeError::ZeroPrice("CMK".into()));
    }

    #[test]
    fn zero_price_conversion_names_the_asset() {
        assert_eq!(
            usd_fee_to_rate("CMK", 100 * BASE_UNIT, 0, SECONDS_PER_MONTH),
            Err(FeeError::ZeroPrice("CMK".into()))
        );
        assert_eq!(usd_fee_to_rate("CMK", u128::MAX, 1, 1), Err(FeeError::Overflow));
    }

    #[test]
    fn per_second_tier_cannot_refresh() {
        let oracle = FixedOracle(Cell::new(None));
        let spec = TierSpec {
            fee: FeeSpec::PerSecond(100),
            ..usd_spec(0)
        };
        let mut tier = SubscriptionTier::from_spec(TierId(3), spec, SECONDS_PER_MONTH, &oracle, Timestamp::new(0)).unwrap();
        assert_eq!(tier.fee_per_second(), 100);
        assert_eq!(
            tier.refresh_rate(SECONDS_PER_MONTH, &oracle, Timestamp::new(1)),
            Err(FeeError::NotOraclePriced(TierId(3)))
        );
    }
}

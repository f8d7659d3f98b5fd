//! The accumulator contract shared by the pool and every tier.
//!
//! An accumulator tracks `acc_per_weight`, the reward paid to one unit of
//! weight since inception, scaled by the accumulator's precision. A
//! participant holding `weight` is owed `floor(weight * acc / precision)`
//! minus what was already settled.
//!
//! The part of a distribution too small to move the accumulator is kept as a
//! scaled remainder and added to the next distribution, so flooring delays
//! reward but never loses it.

use crate::error::RewardError;
use accesskey_types::{mul_div, mul_div_rem, Rounding};

pub trait RewardAccumulator {
    fn total_weight(&self) -> u128;

    fn acc_per_weight(&self) -> u128;

    /// Raise the accumulator by `amount / total_weight`.
    ///
    /// Returns the part of `amount` that could not be distributed (all of it,
    /// plus any whole units still carried, when there is no weight).
    fn distribute(&mut self, amount: u128) -> Result<u128, RewardError>;
}

/// Accumulator movement produced by [`spread`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Spread {
    pub increment: u128,
    /// What is left over, in units of `1 / precision` base units.
    pub carry: u128,
}

/// Spread `amount` plus an earlier `carry` over `total_weight`.
///
/// `increment * total_weight + carry` afterwards equals
/// `amount * precision + carry` before, and the new carry is below `total_weight`.
pub(crate) fn spread(amount: u128, carry: u128, total_weight: u128, precision: u128) -> Result<Spread, RewardError> {
    let (quotient, remainder) = mul_div_rem(amount, precision, total_weight).ok_or(RewardError::Overflow)?;
    let remainder = remainder.checked_add(carry).ok_or(RewardError::Overflow)?;
    let increment = quotient
        .checked_add(remainder / total_weight)
        .ok_or(RewardError::Overflow)?;
    Ok(Spread {
        increment,
        carry: remainder % total_weight,
    })
}

/// Reward accrued to `weight` at accumulator value `acc`, rounded down.
pub fn accrued_to(weight: u128, acc: u128, precision: u128) -> Result<u128, RewardError> {
    mul_div(weight, acc, precision, Rounding::Down).ok_or(RewardError::Overflow)
}

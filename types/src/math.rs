//! Fixed-point helpers.
//!
//! Amounts are raw `u128` base units. Products that may exceed `u128` go
//! through [`mul_div`], which keeps a 256-bit intermediate and rounds in an
//! explicit direction so every call site states who the remainder favours.

use serde::{Deserialize, Serialize};

/// One whole unit of the base asset (18 decimals).
pub const BASE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Denominator for basis-point values (10_000 = 100%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Denominator of oracle prices: a price of 2_500 means 0.25 USD per unit.
pub const PRICE_DENOMINATOR: u128 = 10_000;

/// Scale of the pool's reward-per-recipient-weight accumulator.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Scale of a tier's reward-per-share accumulator.
///
/// Shares carry 18 decimals, so one step of the accumulator is worth
/// `weight / SHARE_PRECISION` base units to a deposit of `weight` shares.
pub const SHARE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Direction in which a division remainder is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    Down,
    Up,
}

/// `a * b / denominator` with a 256-bit intermediate product.
///
/// Returns `None` when `denominator` is zero or the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> Option<u128> {
    let (quotient, remainder) = mul_div_rem(a, b, denominator)?;
    match rounding {
        Rounding::Up if remainder != 0 => quotient.checked_add(1),
        _ => Some(quotient),
    }
}

/// `a * b` divided by `denominator` as `(quotient, remainder)`.
///
/// Returns `None` when `denominator` is zero or the quotient does not fit in `u128`.
pub fn mul_div_rem(a: u128, b: u128, denominator: u128) -> Option<(u128, u128)> {
    if denominator == 0 {
        return None;
    }
    let (hi, lo) = full_mul(a, b);
    if hi == 0 {
        Some((lo / denominator, lo % denominator))
    } else {
        div_wide(hi, lo, denominator)
    }
}

/// `amount * bps / 10_000`, rounded down.
pub fn bps_of(amount: u128, bps: u32) -> Option<u128> {
    mul_div(amount, bps as u128, BPS_DENOMINATOR, Rounding::Down)
}

/// Full 256-bit product of two `u128`s as `(high, low)` halves.
fn full_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_lo, a_hi) = (a & MASK, a >> 64);
    let (b_lo, b_hi) = (b & MASK, b >> 64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // At most 3 * (2^64 - 1), so it cannot overflow.
    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | ((mid & MASK) << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Divide the 256-bit value `(hi, lo)` by `d`, returning `(quotient, remainder)`.
///
/// `None` if the quotient would not fit in 128 bits (`hi >= d`).
fn div_wide(hi: u128, lo: u128, d: u128) -> Option<(u128, u128)> {
    if hi >= d {
        return None;
    }
    let mut rem = hi;
    let mut quo: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quo <<= 1;
        // rem < d held before the shift, so the true value is below 2d.
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quo |= 1;
        }
    }
    Some((quo, rem))
}

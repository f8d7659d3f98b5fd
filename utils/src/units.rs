//! Fixed-point token amounts as decimal strings.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUnitsError {
    #[error("invalid amount {0:?}")]
    Invalid(String),
    #[error("amount {0:?} has more than {1} fractional digits")]
    TooPrecise(String, u32),
    #[error("amount {0:?} overflows")]
    Overflow(String),
}

/// Render `amount` with `decimals` fractional digits, trailing zeros trimmed.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a decimal string such as `"93.5"` into base units.
pub fn parse_units(s: &str, decimals: u32) -> Result<u128, ParseUnitsError> {
    let overflow = || ParseUnitsError::Overflow(s.to_string());
    let invalid = || ParseUnitsError::Invalid(s.to_string());

    let (whole, frac) = match s.trim().split_once('.') {
        Some((w, f)) => (w, f),
        None => (s.trim(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > decimals as usize {
        return Err(ParseUnitsError::TooPrecise(s.to_string(), decimals));
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(overflow)?;
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| overflow())? };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padding = 10u128.pow(decimals - frac.len() as u32);
        frac.parse::<u128>().map_err(|_| overflow())? * padding
    };
    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_value))
        .ok_or_else(overflow)
}

//! Raw on-chain amount → human-unit decimal conversion

use ethers::types::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Scale a raw integer amount string by `10^decimals`.
///
/// The value is parsed as `U256` and the decimal point is placed textually,
/// so amounts wider than 96 bits still convert as long as the integer part
/// fits. Fraction digits beyond decimal precision are rounded.
pub fn scale_raw_amount(raw: &str, decimals: u32) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let value = U256::from_dec_str(raw).ok()?;
    let digits = value.to_string();
    let decimals = decimals as usize;

    let (int_part, frac_part) = if digits.len() > decimals {
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        (int_part.to_string(), frac_part.to_string())
    } else {
        (
            "0".to_string(),
            format!("{}{}", "0".repeat(decimals - digits.len()), digits),
        )
    };

    // trailing zeros would only eat into the 28-digit budget
    let frac_part = frac_part.trim_end_matches('0');
    let text = if frac_part.is_empty() {
        int_part
    } else {
        format!("{}.{}", int_part, frac_part)
    };

    Decimal::from_str(&text).ok().map(|d| d.normalize())
}

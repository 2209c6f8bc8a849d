//! Fixed-point rounding for report values.
//!
//! All arithmetic stays in `Decimal`; these helpers only fix the scale of a
//! value on its way into the dataset.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

/// Decimal places carried by USD amounts
pub const USD_DP: u32 = 2;
/// Decimal places carried by BTC quantities
pub const BTC_DP: u32 = 8;

/// Round to `dp` places, ties toward zero, and pad the scale to `dp`
pub fn round_half_down(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointTowardZero);
    rounded.rescale(dp);
    rounded
}

pub fn usd(value: Decimal) -> Decimal {
    round_half_down(value, USD_DP)
}

pub fn btc(value: Decimal) -> Decimal {
    round_half_down(value, BTC_DP)
}

/// Round an amount in `currency`: cents for USD, satoshis otherwise
pub fn in_currency(value: Decimal, currency: Option<&str>) -> Decimal {
    match currency {
        Some(c) if c.eq_ignore_ascii_case("USD") => usd(value),
        _ => btc(value),
    }
}

pub fn or_zero(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// Deserialize a required decimal, reading `null` as zero
pub fn null_as_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a user-supplied decimal, rejecting anything that is not a plain number
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

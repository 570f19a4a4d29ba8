//! Decimal prices with the lenient coercion the catalog needs.
//!
//! The shoe store API is not consistent about how it serializes `PRICE`: some
//! endpoints send a JSON number, others a numeric string such as `"79.99"`,
//! and bad rows occasionally carry text. Prices are therefore coerced the way
//! a browser's `parseFloat(x) || 0` would: take the longest numeric prefix,
//! and fall back to zero when there is none.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Most significant digits a `Decimal` mantissa holds without overflow.
const SIGNIFICANT_DIGITS: usize = 28;

/// Most decimal places a `Decimal` carries.
const MAX_SCALE: u64 = 28;

/// Largest amount that still renders with two decimals. Prices saturate here
/// instead of overflowing.
const CEILING: Decimal = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, 2);

/// Negative counterpart of [`CEILING`].
const FLOOR: Decimal = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, true, 2);

/// A price in the store currency.
///
/// Display always renders exactly two decimals:
///
/// ```
/// use ys_shoe_core::Price;
///
/// assert_eq!(Price::parse_lenient("79.9").to_string(), "79.90");
/// assert_eq!(Price::parse_lenient("12.5 EGP").to_string(), "12.50");
/// assert_eq!(Price::parse_lenient("call us").to_string(), "0.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price, used whenever coercion fails.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from an exact decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The exact decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Coerce an arbitrary JSON value into a price.
    ///
    /// Numbers and strings go through [`Price::parse_lenient`]; every other
    /// JSON type coerces to zero.
    #[must_use]
    pub fn coerce(value: &Value) -> Self {
        match value {
            Value::Number(number) => Self::parse_lenient(&number.to_string()),
            Value::String(text) => Self::parse_lenient(text),
            _ => Self::ZERO,
        }
    }

    /// Parse the longest numeric prefix of `input`, or zero if there is none.
    ///
    /// Amounts beyond what a price can hold saturate at the largest
    /// representable price of the same sign.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Self {
        numeric_prefix(input).map_or(Self::ZERO, Self)
    }

    /// The price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .saturating_mul(Decimal::from(quantity))
                .clamp(FLOOR, CEILING),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        write!(f, "{rounded}")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0).clamp(FLOOR, CEILING))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::coerce(&value))
    }
}

/// Scan `[+-]digits[.digits][e[+-]digits]` from the start of the trimmed input.
fn numeric_prefix(input: &str) -> Option<Decimal> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    let integer = s.get(int_start..pos)?;

    let mut fraction = "";
    if bytes.get(pos) == Some(&b'.') {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if !integer.is_empty() || frac_end > frac_start {
            fraction = s.get(frac_start..frac_end)?;
            pos = frac_end;
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let exp = exponent(bytes, pos)
        .and_then(|(exp_negative, digits)| {
            let value = s.get(digits)?.parse::<i64>().unwrap_or(i64::MAX);
            Some(if exp_negative { -value } else { value })
        })
        .unwrap_or(0);

    let magnitude = compose(integer, fraction, exp);
    Some(if negative && !magnitude.is_zero() {
        -magnitude
    } else {
        magnitude
    })
}

/// The magnitude of `integer.fraction × 10^exponent`, clamped to [`CEILING`].
///
/// Digits past the 28th significant one are truncated; amounts too small for
/// 28 decimal places become zero.
fn compose(integer: &str, fraction: &str, exponent: i64) -> Decimal {
    let all: String = integer
        .chars()
        .chain(fraction.chars())
        .skip_while(|&c| c == '0')
        .collect();
    let mut digits = all.as_str();

    // value = digits × 10^shift
    let mut shift =
        exponent.saturating_sub(i64::try_from(fraction.len()).unwrap_or(i64::MAX));
    if digits.len() > SIGNIFICANT_DIGITS {
        let dropped = i64::try_from(digits.len() - SIGNIFICANT_DIGITS).unwrap_or(i64::MAX);
        shift = shift.saturating_add(dropped);
        digits = digits.get(..SIGNIFICANT_DIGITS).unwrap_or(digits);
    }

    let Ok(mut mantissa) = digits.parse::<i128>() else {
        return Decimal::ZERO;
    };

    let value = if shift >= 0 {
        u32::try_from(shift)
            .ok()
            .and_then(|shift| 10_i128.checked_pow(shift))
            .and_then(|factor| mantissa.checked_mul(factor))
            .and_then(|scaled| Decimal::try_from_i128_with_scale(scaled, 0).ok())
            .unwrap_or(CEILING)
    } else {
        let mut scale = shift.unsigned_abs();
        if scale > MAX_SCALE {
            mantissa = u32::try_from(scale - MAX_SCALE)
                .ok()
                .and_then(|excess| 10_i128.checked_pow(excess))
                .map_or(0, |divisor| mantissa / divisor);
            scale = MAX_SCALE;
        }
        u32::try_from(scale)
            .ok()
            .and_then(|scale| Decimal::try_from_i128_with_scale(mantissa, scale).ok())
            .unwrap_or(Decimal::ZERO)
    };

    value.min(CEILING)
}

/// Locate an exponent suffix starting at `pos`, returning its sign and digit range.
fn exponent(bytes: &[u8], pos: usize) -> Option<(bool, core::ops::Range<usize>)> {
    if !matches!(bytes.get(pos), Some(b'e' | b'E')) {
        return None;
    }
    let mut cursor = pos + 1;
    let negative = match bytes.get(cursor) {
        Some(b'-') => {
            cursor += 1;
            true
        }
        Some(b'+') => {
            cursor += 1;
            false
        }
        _ => false,
    };
    let start = cursor;
    while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
        cursor += 1;
    }
    (cursor > start).then_some((negative, start..cursor))
}

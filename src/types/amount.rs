use crate::types::errors::AmountError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Largest magnitude a single transaction may carry. Keeps annualized and reward arithmetic in range.
pub const MAX_TRANSACTION_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);
const CURRENCY_PREFIXES: [&str; 7] = ["Rs.", "Rs", "INR", "₹", "$", "€", "£"];

/// Parses a statement amount into a signed decimal, debits positive.
///
/// Accepts thousands separators, a leading currency marker, accounting parentheses and a
/// trailing `CR`/`DR` marker. `CR` and parentheses flip the sign to a credit.
pub fn parse_amount(value: &str) -> Result<Decimal, AmountError> {
    let mut text = value.trim();

    if text.is_empty() {
        return Err(AmountError::Empty);
    }

    let mut negative = false;

    if let Some(stripped) = strip_marker(text, "CR") {
        negative = true;
        text = stripped;
    } else if let Some(stripped) = strip_marker(text, "DR") {
        text = stripped;
    }

    if let Some(inner) = text.strip_prefix('(').and_then(|inner| inner.strip_suffix(')')) {
        negative = !negative;
        text = inner.trim();
    }

    if let Some(rest) = text.strip_prefix('-') {
        negative = !negative;
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.trim_start();
    }

    if let Some(rest) = CURRENCY_PREFIXES.iter().find_map(|prefix| text.strip_prefix(prefix)) {
        text = rest.trim_start();

        //NOTE: Some exports put the sign after the currency marker ("₹-120.00")
        if let Some(rest) = text.strip_prefix('-') {
            negative = !negative;
            text = rest;
        }
    }

    let digits: String = text.chars().filter(|character| *character != ',').collect();

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(AmountError::InvalidFormat(format!("'{value}' has no numeric part")));
    }

    let amount = Decimal::from_str(&digits).map_err(|error| {
        AmountError::InvalidFormat(format!("'{value}' is not a valid amount: {error}"))
    })?;

    if amount.abs() > MAX_TRANSACTION_AMOUNT {
        return Err(AmountError::Overflow(value.trim().to_string()));
    }

    Ok(if negative { -amount } else { amount })
}

/// Rounds to currency precision, midpoints away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_amount(&value).map_err(de::Error::custom)
}

fn strip_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(marker.len())?;

    if !text.is_char_boundary(split) || !text[split..].eq_ignore_ascii_case(marker) {
        return None;
    }

    Some(text[..split].trim_end())
}

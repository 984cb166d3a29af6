//! # Input Module
//!
//! Turns raw form text into the numbers the pricing engine works with.
//!
//! ## Coercion Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Field Coercion                                     │
//! │                                                                         │
//! │  Cell text            Field kind         Value used                     │
//! │  ─────────            ──────────         ──────────                     │
//! │  "12.5"               amount             12.5                           │
//! │  ""                   amount             0                              │
//! │  "abc"                amount             0                              │
//! │  "-4"                 amount             0                              │
//! │  ""                   tax rate           5   (default)                  │
//! │  "18"                 tax rate           18                             │
//! │  "250"                percent            100 (clamped)                  │
//! │  "31122026"           expiry             2026-12-31                     │
//! │                                                                         │
//! │  Nothing here returns an error: a half-typed row must still price.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use crate::DEFAULT_TAX_RATE_PERCENT;

// =============================================================================
// Numeric Sanitizers
// =============================================================================

/// Forces an amount into `[0, ∞)`. NaN, infinities and negatives become 0.
#[inline]
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Forces a percentage into `[0, 100]`. Non-finite values become 0.
#[inline]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

// =============================================================================
// Text Parsers
// =============================================================================

/// Parses a price or amount cell.
///
/// ## Example
/// ```rust
/// use medibill_core::input::parse_amount;
///
/// assert_eq!(parse_amount("10.50"), 10.5);
/// assert_eq!(parse_amount(""), 0.0);
/// assert_eq!(parse_amount("ten"), 0.0);
/// assert_eq!(parse_amount("-1"), 0.0);
/// ```
pub fn parse_amount(text: &str) -> f64 {
    text.trim().parse::<f64>().map(sanitize_amount).unwrap_or(0.0)
}

/// Parses a quantity cell. Same rules as [`parse_amount`]; fractional
/// quantities (strips, half packs) are allowed.
#[inline]
pub fn parse_quantity(text: &str) -> f64 {
    parse_amount(text)
}

/// Parses an optional amount cell such as MRP or actual price.
/// Blank means "not entered".
pub fn parse_optional_amount(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        None
    } else {
        Some(parse_amount(text))
    }
}

/// Parses a percentage cell.
///
/// Blank takes `default`; text that is not a number is 0; anything else is
/// clamped to `[0, 100]`.
pub fn parse_percent(text: &str, default: f64) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return clamp_percent(default);
    }
    text.parse::<f64>().map(clamp_percent).unwrap_or(0.0)
}

/// Parses a tax rate cell, defaulting to 5% when blank.
///
/// ## Example
/// ```rust
/// use medibill_core::input::parse_tax_rate;
///
/// assert_eq!(parse_tax_rate(""), 5.0);
/// assert_eq!(parse_tax_rate("12"), 12.0);
/// assert_eq!(parse_tax_rate("0"), 0.0);
/// ```
#[inline]
pub fn parse_tax_rate(text: &str) -> f64 {
    parse_percent(text, DEFAULT_TAX_RATE_PERCENT)
}

/// Parses a discount cell, defaulting to 0% when blank.
#[inline]
pub fn parse_discount(text: &str) -> f64 {
    parse_percent(text, 0.0)
}

/// Parses a batch expiry.
///
/// Accepts the compact `DDMMYYYY` form typed into the purchase grid and ISO
/// `YYYY-MM-DD`. Anything else, including impossible dates, is `None`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use medibill_core::input::parse_expiry;
///
/// assert_eq!(parse_expiry("31122026"), NaiveDate::from_ymd_opt(2026, 12, 31));
/// assert_eq!(parse_expiry("2026-12-31"), NaiveDate::from_ymd_opt(2026, 12, 31));
/// assert_eq!(parse_expiry("31/12"), None);
/// ```
pub fn parse_expiry(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let day = text[0..2].parse().ok()?;
        let month = text[2..4].parse().ok()?;
        let year = text[4..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

// =============================================================================
// Serde Field Adapters
// =============================================================================
//
// Document files carry whatever the form held: numbers, numeric text, null,
// or junk. These adapters apply the same coercion as the text parsers so a
// bad cell prices as zero instead of rejecting the whole document.

/// A numeric field as it arrives in a document file.
enum RawNumber {
    Number(f64),
    Text(String),
    Null,
    Other,
}

struct RawNumberVisitor;

impl<'de> Visitor<'de> for RawNumberVisitor {
    type Value = RawNumber;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, numeric text or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RawNumber::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RawNumber::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RawNumber::Number(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(RawNumber::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(RawNumber::Text(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(RawNumber::Other)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawNumber::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawNumber::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(RawNumberVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawNumber::Other)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(RawNumber::Other)
    }
}

fn raw_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RawNumber, D::Error> {
    deserializer.deserialize_any(RawNumberVisitor)
}

/// `deserialize_with` adapter for amounts and quantities. Null or junk is 0.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_number(deserializer)? {
        RawNumber::Number(v) => sanitize_amount(v),
        RawNumber::Text(text) => parse_amount(&text),
        RawNumber::Null | RawNumber::Other => 0.0,
    })
}

/// `deserialize_with` adapter for MRP and actual price. Null or blank is
/// "not entered".
pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_number(deserializer)? {
        RawNumber::Number(v) => Some(sanitize_amount(v)),
        RawNumber::Text(text) => parse_optional_amount(&text),
        RawNumber::Null | RawNumber::Other => None,
    })
}

/// `deserialize_with` adapter for the tax rate. Null takes the 5% default.
pub fn deserialize_tax_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_number(deserializer)? {
        RawNumber::Number(v) => clamp_percent(v),
        RawNumber::Text(text) => parse_tax_rate(&text),
        RawNumber::Null => DEFAULT_TAX_RATE_PERCENT,
        RawNumber::Other => 0.0,
    })
}

/// `deserialize_with` adapter for the discount percentage.
pub fn deserialize_discount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_number(deserializer)? {
        RawNumber::Number(v) => clamp_percent(v),
        RawNumber::Text(text) => parse_discount(&text),
        RawNumber::Null | RawNumber::Other => 0.0,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_amount() {
        assert_eq!(sanitize_amount(3.25), 3.25);
        assert_eq!(sanitize_amount(-3.25), 0.0);
        assert_eq!(sanitize_amount(f64::NAN), 0.0);
        assert_eq!(sanitize_amount(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(12.0), 12.0);
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 10.5 "), 10.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("1,000"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount(""), None);
        assert_eq!(parse_optional_amount("42"), Some(42.0));
        assert_eq!(parse_optional_amount("x"), Some(0.0));
    }

    #[test]
    fn test_parse_tax_rate() {
        assert_eq!(parse_tax_rate(""), 5.0);
        assert_eq!(parse_tax_rate("  "), 5.0);
        assert_eq!(parse_tax_rate("0"), 0.0);
        assert_eq!(parse_tax_rate("18"), 18.0);
        assert_eq!(parse_tax_rate("gst"), 0.0);
        assert_eq!(parse_tax_rate("-100"), 0.0);
        assert_eq!(parse_tax_rate("250"), 100.0);
    }

    #[test]
    fn test_parse_discount() {
        assert_eq!(parse_discount(""), 0.0);
        assert_eq!(parse_discount("10"), 10.0);
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("01062027"), NaiveDate::from_ymd_opt(2027, 6, 1));
        assert_eq!(parse_expiry("2027-06-01"), NaiveDate::from_ymd_opt(2027, 6, 1));
        assert_eq!(parse_expiry("31022027"), None);
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("June 2027"), None);
    }

    #[derive(serde::Deserialize)]
    struct Cells {
        #[serde(deserialize_with = "deserialize_amount")]
        amount: f64,
        #[serde(deserialize_with = "deserialize_tax_rate")]
        tax: f64,
        #[serde(deserialize_with = "deserialize_optional_amount")]
        mrp: Option<f64>,
    }

    fn cells(json: &str) -> Cells {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_adapters_accept_numbers_and_text() {
        let c = cells(r#"{"amount": 12, "tax": "18", "mrp": "45.5"}"#);
        assert_eq!(c.amount, 12.0);
        assert_eq!(c.tax, 18.0);
        assert_eq!(c.mrp, Some(45.5));
    }

    #[test]
    fn test_adapters_coerce_junk() {
        let c = cells(r#"{"amount": -3, "tax": true, "mrp": ""}"#);
        assert_eq!(c.amount, 0.0);
        assert_eq!(c.tax, 0.0);
        assert_eq!(c.mrp, None);

        let c = cells(r#"{"amount": [1, 2], "tax": 250, "mrp": {"v": 1}}"#);
        assert_eq!(c.amount, 0.0);
        assert_eq!(c.tax, 100.0);
        assert_eq!(c.mrp, None);
    }

    #[test]
    fn test_adapters_on_null() {
        let c = cells(r#"{"amount": null, "tax": null, "mrp": null}"#);
        assert_eq!(c.amount, 0.0);
        assert_eq!(c.tax, 5.0);
        assert_eq!(c.mrp, None);
    }
}

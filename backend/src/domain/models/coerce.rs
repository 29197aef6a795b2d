//! Lenient field decoders for rows written by older revisions of the tracker.
//!
//! Legacy rows carry numbers as text, floats where integers belong, negative
//! balances and contacts that went through a spreadsheet (`9876543210.0`).
//! Decoding never fails on these; it normalizes them.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Decode a non-negative integer, defaulting anything invalid or negative to 0
pub fn non_negative<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(NonNegativeVisitor)
}

/// Decode a contact token as text, undoing float formatting of phone numbers
pub fn contact<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_string(ContactVisitor)
}

/// Parse text into a non-negative integer using the same rules as the decoder
pub fn parse_non_negative(text: &str) -> u64 {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => float_to_non_negative(value),
        Err(_) => 0,
    }
}

/// Normalize a contact token: trims, and turns "9876543210.0" into "9876543210"
pub fn normalize_contact(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(digits) = trimmed.strip_suffix(".0") {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return digits.to_string();
        }
    }
    trimmed.to_string()
}

fn float_to_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

struct NonNegativeVisitor;

impl<'de> Visitor<'de> for NonNegativeVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        Ok(u64::try_from(v).unwrap_or(0))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        Ok(float_to_non_negative(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<u64, E> {
        Ok(0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        Ok(parse_non_negative(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
        Ok(0)
    }

    fn visit_none<E: de::Error>(self) -> Result<u64, E> {
        Ok(0)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(NonNegativeVisitor)
    }
}

struct ContactVisitor;

impl<'de> Visitor<'de> for ContactVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a contact token")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(normalize_contact(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(normalize_contact(&v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}

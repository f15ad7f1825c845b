//! Kilograms type for handling mass values read from sheet cells.
//!
//! This module provides the `Kilograms` type which wraps `Decimal` and handles
//! parsing cell values that may or may not include a `kg` suffix or commas.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a non-negative mass in kilograms.
///
/// This type wraps `Decimal` and provides custom serialization/deserialization
/// to handle cell values that may be formatted with or without a unit suffix or
/// thousands separators. An empty cell parses as zero; a negative value is a
/// parse error, since the scale cannot report one.
///
/// # Examples
///
/// Parsing a plain number:
/// ```
/// # use station_sync::model::Kilograms;
/// # use std::str::FromStr;
/// let weight = Kilograms::from_str("2.50").unwrap();
/// assert_eq!(weight.to_string(), "2.50");
/// ```
///
/// Parsing with a unit suffix:
/// ```
/// # use station_sync::model::Kilograms;
/// # use std::str::FromStr;
/// let weight = Kilograms::from_str("2.50 kg").unwrap();
/// assert_eq!(weight.to_string(), "2.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Kilograms(Decimal);

impl Kilograms {
    /// Creates a new `Kilograms` from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the mass is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the value rounded to two decimal places, the precision the
    /// kiosk writes to the log.
    pub fn rounded(&self) -> Kilograms {
        Self(self.0.round_dp(2))
    }
}

/// An error that can occur when parsing strings into `Kilograms` values.
#[derive(Clone)]
pub struct KilogramsError(String);

impl Debug for KilogramsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for KilogramsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for KilogramsError {}

impl FromStr for Kilograms {
    type Err = KilogramsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // An empty cell means no measurement, which we treat as zero.
        if trimmed.is_empty() {
            return Ok(Kilograms::default());
        }

        // Remove a unit suffix if present, e.g. "2.5 kg" or "2.5kg"
        let lower = trimmed.to_ascii_lowercase();
        let without_unit = lower.strip_suffix("kg").unwrap_or(&lower).trim_end();

        // Remove commas (thousand separators)
        let without_commas = without_unit.replace(',', "");

        let value = Decimal::from_str(&without_commas)
            .map_err(|e| KilogramsError(format!("'{s}' is not a valid mass: {e}")))?;
        if value.is_sign_negative() {
            return Err(KilogramsError(format!(
                "'{s}' is not a valid mass: a weight cannot be negative"
            )));
        }
        Ok(Kilograms(value))
    }
}

impl fmt::Display for Kilograms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Kilograms {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as a string, the way the value appears in a sheet cell
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Kilograms {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Kilograms::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Kilograms {
    fn from(value: Decimal) -> Self {
        Kilograms::new(value)
    }
}

impl From<Kilograms> for Decimal {
    fn from(kg: Kilograms) -> Self {
        kg.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let weight = Kilograms::from_str("2.50").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("2.50").unwrap());
    }

    #[test]
    fn test_parse_with_suffix() {
        let weight = Kilograms::from_str("2.50 kg").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("2.50").unwrap());
    }

    #[test]
    fn test_parse_with_suffix_no_space() {
        let weight = Kilograms::from_str("2.5kg").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("2.5").unwrap());
    }

    #[test]
    fn test_parse_uppercase_suffix() {
        let weight = Kilograms::from_str("2.5 KG").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("2.5").unwrap());
    }

    #[test]
    fn test_parse_with_commas() {
        let weight = Kilograms::from_str("1,042.75").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("1042.75").unwrap());
    }

    #[test]
    fn test_parse_empty_string() {
        let weight = Kilograms::from_str("").unwrap();
        assert_eq!(weight.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_whitespace() {
        let weight = Kilograms::from_str("  0.35  ").unwrap();
        assert_eq!(weight.value(), Decimal::from_str("0.35").unwrap());
    }

    #[test]
    fn test_parse_negative_is_error() {
        assert!(Kilograms::from_str("-2.5").is_err());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Kilograms::from_str("not-a-number").is_err());
    }

    #[test]
    fn test_display() {
        let weight = Kilograms::new(Decimal::from_str("2.50").unwrap());
        assert_eq!(weight.to_string(), "2.50");
    }

    #[test]
    fn test_rounded() {
        let weight = Kilograms::from_str("2.517").unwrap();
        assert_eq!(weight.rounded().to_string(), "2.52");
    }

    #[test]
    fn test_serialize() {
        let weight = Kilograms::new(Decimal::from_str("2.50").unwrap());
        let json = serde_json::to_string(&weight).unwrap();
        assert_eq!(json, "\"2.50\"");
    }

    #[test]
    fn test_deserialize_with_suffix() {
        let json = "\"2.50 kg\"";
        let weight: Kilograms = serde_json::from_str(json).unwrap();
        assert_eq!(weight.value(), Decimal::from_str("2.50").unwrap());
    }

    #[test]
    fn test_ordering() {
        let lighter = Kilograms::from_str("0.30").unwrap();
        let heavier = Kilograms::from_str("0.50").unwrap();
        assert!(lighter < heavier);
    }

    #[test]
    fn test_is_zero() {
        assert!(Kilograms::from_str("0.00").unwrap().is_zero());
        assert!(!Kilograms::from_str("0.01").unwrap().is_zero());
    }
}

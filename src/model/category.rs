//! Category labels for waste streams.
//!
//! A category arrives as free-form text typed or selected by a station
//! operator, so comparison is case-insensitive and whitespace-trimmed. The
//! two recognized streams are chopsticks and recyclables; anything else is
//! tracked under its own label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The normalized label for the chopsticks waste stream.
pub const CHOPSTICKS_LABEL: &str = "chopsticks";

/// The normalized label for the recyclables waste stream.
pub const RECYCLE_LABEL: &str = "recycle";

/// A waste-stream label, normalized for comparison.
///
/// Normalization trims surrounding whitespace and lower-cases the label, so
/// `"  Chopsticks "`, `"chopsticks"` and `"CHOPSTICKS"` are all the same
/// category.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Creates a `Category` from a raw label, normalizing it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// The normalized label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_chopsticks(&self) -> bool {
        self.0 == CHOPSTICKS_LABEL
    }

    pub fn is_recycle(&self) -> bool {
        self.0 == RECYCLE_LABEL
    }

    /// Whether this category counts toward the diverted-weight total.
    ///
    /// Policy: only the two recognized streams count. Other categories are
    /// tallied but excluded from the total.
    pub fn is_diverted(&self) -> bool {
        self.is_chopsticks() || self.is_recycle()
    }

    /// The label as written to the sheet: recognized streams get their
    /// canonical capitalized spelling, anything else stays normalized.
    pub fn sheet_label(&self) -> &str {
        if self.is_chopsticks() {
            "Chopsticks"
        } else if self.is_recycle() {
            "Recycle"
        } else {
            &self.0
        }
    }
}

impl<S: Into<String>> From<S> for Category {
    fn from(value: S) -> Self {
        Category::new(value.into())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::new(s))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Category::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(Category::new("  Chopsticks "), Category::new("chopsticks"));
        assert_eq!(Category::new("CHOPSTICKS"), Category::new("chopsticks"));
        assert_eq!(Category::new("Recycle").as_str(), "recycle");
    }

    #[test]
    fn test_recognized_labels() {
        assert!(Category::new("Chopsticks").is_chopsticks());
        assert!(Category::new("recycle").is_recycle());
        assert!(!Category::new("trash").is_chopsticks());
        assert!(!Category::new("trash").is_recycle());
    }

    #[test]
    fn test_diverted_policy() {
        assert!(Category::new("Chopsticks").is_diverted());
        assert!(Category::new(" RECYCLE ").is_diverted());
        assert!(!Category::new("Landfill").is_diverted());
    }

    #[test]
    fn test_sheet_label() {
        assert_eq!(Category::new("chopsticks").sheet_label(), "Chopsticks");
        assert_eq!(Category::new(" recycle").sheet_label(), "Recycle");
        assert_eq!(Category::new("Food Waste").sheet_label(), "food waste");
    }

    #[test]
    fn test_unknown_categories_keep_their_label() {
        let c = Category::new("  Food Waste ");
        assert_eq!(c.as_str(), "food waste");
    }
}

//! Derived-metrics estimation for the chopsticks waste stream.
//!
//! Chopsticks are weighed in bulk, so the kiosk estimates how many items a
//! weight represents and how much CO2 their reuse avoids. Both calibration
//! constants are configuration, not code: station crews have weighed their
//! chopsticks differently from one festival to the next.

use crate::model::Kilograms;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Assumed mass of a single chopsticks item, in kilograms.
fn default_unit_weight_kg() -> Decimal {
    // 3 grams per pair
    Decimal::new(3, 3)
}

/// CO2 reduction credited per chopsticks item, in kilograms.
fn default_per_item_co2_kg() -> Decimal {
    // 50 grams per pair
    Decimal::new(50, 3)
}

/// The two constants of the linear estimation model.
///
/// Both values are kilograms. They can be overridden in the `calibration`
/// section of `config.json`; the defaults below match the capture script the
/// kiosks currently run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Calibration {
    /// Assumed mass of one chopsticks item.
    #[serde(default = "default_unit_weight_kg")]
    unit_weight_kg: Decimal,

    /// CO2 reduction credited per chopsticks item.
    #[serde(default = "default_per_item_co2_kg")]
    per_item_co2_kg: Decimal,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            unit_weight_kg: default_unit_weight_kg(),
            per_item_co2_kg: default_per_item_co2_kg(),
        }
    }
}

/// The estimator's output for one weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChopsticksEstimate {
    /// Estimated number of chopsticks items in the weighed batch.
    pub count: u64,
    /// Estimated CO2 reduction for the batch.
    pub co2: Kilograms,
}

impl Calibration {
    pub fn new(unit_weight_kg: Decimal, per_item_co2_kg: Decimal) -> Self {
        Self {
            unit_weight_kg,
            per_item_co2_kg,
        }
    }

    pub fn unit_weight_kg(&self) -> Decimal {
        self.unit_weight_kg
    }

    pub fn per_item_co2_kg(&self) -> Decimal {
        self.per_item_co2_kg
    }

    /// Estimates the item count and CO2 reduction for a weight.
    ///
    /// `count = floor(weight / unit_weight)`, `co2 = count * per_item_co2`.
    /// A non-positive unit weight yields a zero estimate rather than a
    /// division error.
    pub fn estimate(&self, weight: Kilograms) -> ChopsticksEstimate {
        let count = if self.unit_weight_kg > Decimal::ZERO {
            weight
                .value()
                .checked_div(self.unit_weight_kg)
                .map(|ratio| ratio.floor().to_u64().unwrap_or(u64::MAX))
                .unwrap_or(0)
        } else {
            0
        };
        let co2 = Decimal::from(count) * self.per_item_co2_kg;
        ChopsticksEstimate {
            count,
            co2: Kilograms::new(co2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn kg(s: &str) -> Kilograms {
        Kilograms::from_str(s).unwrap()
    }

    #[test]
    fn test_zero_weight_is_zero_estimate() {
        let estimate = Calibration::default().estimate(kg("0"));
        assert_eq!(estimate.count, 0);
        assert!(estimate.co2.is_zero());
    }

    #[test]
    fn test_default_calibration() {
        // 0.5 kg at 3 g per item: floor(0.5 / 0.003) = 166 items
        let estimate = Calibration::default().estimate(kg("0.5"));
        assert_eq!(estimate.count, 166);
        // 166 items at 50 g each
        assert_eq!(estimate.co2.value(), Decimal::from_str("8.300").unwrap());
    }

    #[test]
    fn test_count_floors() {
        // 0.0059 kg is just short of two 3 g items
        let estimate = Calibration::default().estimate(kg("0.0059"));
        assert_eq!(estimate.count, 1);
    }

    #[test]
    fn test_custom_calibration() {
        let calibration =
            Calibration::new(Decimal::from_str("0.01").unwrap(), Decimal::from_str("0.025").unwrap());
        let estimate = calibration.estimate(kg("0.1"));
        assert_eq!(estimate.count, 10);
        assert_eq!(estimate.co2.value(), Decimal::from_str("0.250").unwrap());
    }

    #[test]
    fn test_monotonically_non_decreasing() {
        let calibration = Calibration::default();
        let mut last = calibration.estimate(kg("0"));
        for weight in ["0.001", "0.003", "0.01", "0.25", "0.5", "2", "10"] {
            let estimate = calibration.estimate(kg(weight));
            assert!(estimate.count >= last.count);
            assert!(estimate.co2 >= last.co2);
            last = estimate;
        }
    }

    #[test]
    fn test_zero_unit_weight_does_not_divide() {
        let calibration = Calibration::new(Decimal::ZERO, default_per_item_co2_kg());
        let estimate = calibration.estimate(kg("1.0"));
        assert_eq!(estimate.count, 0);
        assert!(estimate.co2.is_zero());
    }

    #[test]
    fn test_calibration_deserializes_with_defaults() {
        let calibration: Calibration = serde_json::from_str("{}").unwrap();
        assert_eq!(calibration, Calibration::default());
    }

    #[test]
    fn test_calibration_deserializes_overrides() {
        let json = r#"{"unit_weight_kg": "0.01", "per_item_co2_kg": "0.02"}"#;
        let calibration: Calibration = serde_json::from_str(json).unwrap();
        assert_eq!(
            calibration.unit_weight_kg(),
            Decimal::from_str("0.01").unwrap()
        );
    }
}

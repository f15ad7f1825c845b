//! The reading aggregator: folds the full log into per-category totals.
//!
//! Every consumer of the log (the report command, historically a pile of
//! dashboard scripts) needs the same numbers: total weight per category,
//! chopsticks CO2 and item-count totals, and the diverted-weight sum. This
//! module is that fold, written once. It is a pure pass over an in-memory
//! snapshot: no I/O, nothing persisted, and re-running it over the same rows
//! always produces identical totals.

use crate::model::{Category, Kilograms, Reading, Readings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// Running sums restricted to readings in the chopsticks category.
///
/// The CO2 and count values come from the log as written; they were derived
/// from the weight at capture time, but the aggregator takes them at face
/// value rather than recomputing them, so rows written under an older
/// calibration keep the numbers they were recorded with.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChopsticksTotals {
    co2: Kilograms,
    count: u64,
}

impl ChopsticksTotals {
    pub fn co2(&self) -> Kilograms {
        self.co2
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Accumulated weight per normalized category, plus the chopsticks totals.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    categories: BTreeMap<Category, Kilograms>,
    chopsticks: ChopsticksTotals,
}

impl Totals {
    /// The accumulated weight for a category label, zero if unseen.
    pub fn category_weight(&self, label: impl AsRef<str>) -> Kilograms {
        self.categories
            .get(&Category::new(label))
            .copied()
            .unwrap_or_default()
    }

    /// All category totals in label order.
    pub fn categories(&self) -> impl Iterator<Item = (&Category, Kilograms)> {
        self.categories.iter().map(|(c, w)| (c, *w))
    }

    pub fn chopsticks(&self) -> &ChopsticksTotals {
        &self.chopsticks
    }

    /// The total weight counted as diverted: recycle plus chopsticks.
    ///
    /// Other categories are tallied but excluded from this total by policy.
    pub fn diverted_weight(&self) -> Kilograms {
        let sum: Decimal = self
            .categories
            .iter()
            .filter(|(category, _)| category.is_diverted())
            .map(|(_, weight)| weight.value())
            .sum();
        Kilograms::new(sum)
    }
}

/// The outcome of an aggregation pass.
///
/// An empty log is a different fact from a log whose weights sum to zero, so
/// the two are distinct variants rather than a zeroed `Totals`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// No readings have been recorded.
    NoData,
    /// Totals folded from at least one reading.
    Data(Totals),
}

impl Aggregation {
    pub fn totals(&self) -> Option<&Totals> {
        match self {
            Aggregation::NoData => None,
            Aggregation::Data(totals) => Some(totals),
        }
    }
}

/// Folds the full set of readings into totals.
///
/// One left-to-right pass. The fold is commutative: reordering the readings
/// cannot change any total. Malformed numeric cells are skipped with one
/// warning per offending reading and contribute nothing; they never abort the
/// pass or disturb totals accumulated from other readings.
pub fn aggregate(readings: &Readings) -> Aggregation {
    if readings.is_empty() {
        return Aggregation::NoData;
    }

    let mut totals = Totals::default();
    for reading in readings.data() {
        fold_reading(&mut totals, reading);
    }
    Aggregation::Data(totals)
}

fn fold_reading(totals: &mut Totals, reading: &Reading) {
    let category = reading.category();

    match Kilograms::from_str(reading.weight_raw()) {
        Ok(weight) => {
            let entry = totals
                .categories
                .entry(category.clone())
                .or_insert_with(Kilograms::default);
            *entry = Kilograms::new(entry.value() + weight.value());
        }
        Err(e) => {
            warn!(
                "Skipping weight for a '{category}' reading at {}: {e}",
                reading.timestamp()
            );
            // Make sure the category still shows up in the report.
            totals
                .categories
                .entry(category.clone())
                .or_insert_with(Kilograms::default);
        }
    }

    if category.is_chopsticks() {
        // CO2 and count are applied together or not at all; a half-applied
        // reading would let the two totals drift apart.
        let co2 = Kilograms::from_str(reading.co2_emission_raw());
        let count = parse_count(reading.item_count_raw());
        match (co2, count) {
            (Ok(co2), Ok(count)) => {
                totals.chopsticks.co2 =
                    Kilograms::new(totals.chopsticks.co2.value() + co2.value());
                totals.chopsticks.count += count;
            }
            _ => {
                warn!(
                    "Skipping chopsticks metrics for a reading at {}: \
                    co2 '{}' and count '{}' could not both be parsed",
                    reading.timestamp(),
                    reading.co2_emission_raw(),
                    reading.item_count_raw()
                );
            }
        }
    }
}

/// Parses an item-count cell. An empty cell means zero items.
fn parse_count(raw: &str) -> Result<u64, std::num::ParseIntError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse()
}

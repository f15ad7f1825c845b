//! Types that represent the core data model, such as `Reading` and `Category`.
mod category;
mod mapping;
mod reading;
mod weight;

pub use category::{Category, CHOPSTICKS_LABEL, RECYCLE_LABEL};
pub use mapping::{Header, Mapping};
pub use reading::{Reading, ReadingColumn, Readings};
use serde::{Deserialize, Serialize};
pub use weight::Kilograms;

/// Represents the full contents of the waste-station log sheet.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StationData {
    /// Rows of data from the readings sheet.
    readings: Readings,
}

impl StationData {
    pub fn new(readings: Readings) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &Readings {
        &self.readings
    }
}

use crate::model::mapping::Mapping;
use crate::model::Category;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Represents the reading data from the log sheet, including the header
/// mapping.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Readings {
    mapping: Mapping,
    data: Vec<Reading>,
}

impl Readings {
    /// Parses raw sheet rows into `Readings`. The first row is the header
    /// row.
    ///
    /// A sheet with no rows at all yields an empty `Readings` (a fresh kiosk
    /// log is not an error). Blank rows are skipped. A row longer than the
    /// header row is truncated with a warning rather than rejected, since one
    /// bad row must not abort a report over the rest of the log.
    pub fn new<S, R>(sheet_data: impl IntoIterator<Item = R>) -> Result<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mut rows = sheet_data.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row.into_iter())?,
            None => return Ok(Self::default()),
        };

        let len = mapping.len();
        let mut readings = Vec::new();

        for (row_ix, row) in rows.enumerate() {
            let mut values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if values.is_empty() || values.iter().all(|v| v.trim().is_empty()) {
                continue; // Skip blank rows
            }
            if values.len() > len {
                warn!(
                    "Row {} has {} cells but the sheet has {} headers, ignoring the extras",
                    row_ix + 2,
                    values.len(),
                    len
                );
                values.truncate(len);
            }

            readings.push(Reading::new_with_sheet_headers(mapping.headers(), values)?);
        }
        Ok(Self {
            mapping,
            data: readings,
        })
    }

    pub fn data(&self) -> &[Reading] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }
}

/// Represents a single row from the log sheet.
///
/// The numeric cells are held as raw strings exactly as they appear in the
/// sheet. Parsing happens during aggregation so that a malformed cell can be
/// skipped with a diagnostic instead of poisoning the whole row set.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reading {
    timestamp: String,
    station: String,
    category: String,
    weight: String,
    co2_emission: String,
    item_count: String,
    other_fields: BTreeMap<String, String>,
}

impl Reading {
    /// Builds a new reading at capture time.
    pub fn new(
        timestamp: impl Into<String>,
        station: impl Into<String>,
        category: impl Into<String>,
        weight: impl Into<String>,
        co2_emission: impl Into<String>,
        item_count: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            station: station.into(),
            category: category.into(),
            weight: weight.into(),
            co2_emission: co2_emission.into(),
            item_count: item_count.into(),
            other_fields: BTreeMap::new(),
        }
    }

    pub fn new_with_sheet_headers<S1, S2, I>(headers: &[S1], values: I) -> Result<Self>
    where
        S1: AsRef<str>,
        S2: Into<String>,
        I: IntoIterator<Item = S2>,
    {
        let mut reading = Reading::default();
        for (ix, value) in values.into_iter().map(|s| s.into()).enumerate() {
            let header = headers
                .get(ix)
                .with_context(|| format!("No header found for column index {ix}"))?
                .as_ref();
            reading.set_with_header(header, value)?;
        }
        Ok(reading)
    }

    pub fn set_with_header<S1, S2>(&mut self, header: S1, value: S2) -> Result<()>
    where
        S1: AsRef<str>,
        S2: Into<String>,
    {
        let header = header.as_ref();
        let value = value.into();

        match ReadingColumn::from_header(header) {
            Ok(col) => match col {
                ReadingColumn::Timestamp => self.timestamp = value,
                ReadingColumn::Station => self.station = value,
                ReadingColumn::Category => self.category = value,
                ReadingColumn::Weight => self.weight = value,
                ReadingColumn::Co2Emission => self.co2_emission = value,
                ReadingColumn::ItemCount => self.item_count = value,
            },
            Err(_) => {
                let _ = self.other_fields.insert(header.to_string(), value);
            }
        }

        Ok(())
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// The normalized category this reading belongs to.
    pub fn category(&self) -> Category {
        Category::new(&self.category)
    }

    /// The weight cell, unparsed.
    pub fn weight_raw(&self) -> &str {
        &self.weight
    }

    /// The CO2 emission cell, unparsed.
    pub fn co2_emission_raw(&self) -> &str {
        &self.co2_emission
    }

    /// The item count cell, unparsed.
    pub fn item_count_raw(&self) -> &str {
        &self.item_count
    }

    /// The row in the canonical column order used when appending to the log.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.station.clone(),
            self.category.clone(),
            self.weight.clone(),
            self.co2_emission.clone(),
            self.item_count.clone(),
        ]
    }
}

/// Represents the known columns of the log sheet.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingColumn {
    #[default]
    Timestamp,
    Station,
    Category,
    Weight,
    Co2Emission,
    ItemCount,
}

serde_plain::derive_display_from_serialize!(ReadingColumn);
serde_plain::derive_fromstr_from_deserialize!(ReadingColumn);

impl ReadingColumn {
    /// Matches a sheet header to a known column.
    ///
    /// Matching is case-insensitive and whitespace-trimmed, and tolerates the
    /// header spellings that have appeared across the kiosk sheets: some carry
    /// the unit in the header (`Weight (kg)`), some do not (`Weight`), and the
    /// count column has been labeled both `Item Count` and
    /// `Chopsticks Count (pair)`.
    pub fn from_header(header: impl AsRef<str>) -> Result<ReadingColumn> {
        let normalized = header.as_ref().trim().to_lowercase();
        match normalized.as_str() {
            "time stamp" | "timestamp" => Ok(ReadingColumn::Timestamp),
            "station" => Ok(ReadingColumn::Station),
            "category" => Ok(ReadingColumn::Category),
            "weight" | "weight (kg)" => Ok(ReadingColumn::Weight),
            "co2 emission" | "co2 emission (kg)" => Ok(ReadingColumn::Co2Emission),
            "item count" | "chopsticks count (pair)" => Ok(ReadingColumn::ItemCount),
            bad => bail!("Unrecognized reading column header '{bad}'"),
        }
    }

    /// The canonical header spelling, used when a header row must be written.
    pub fn as_header_str(&self) -> &'static str {
        match self {
            ReadingColumn::Timestamp => TIMESTAMP_STR,
            ReadingColumn::Station => STATION_STR,
            ReadingColumn::Category => CATEGORY_STR,
            ReadingColumn::Weight => WEIGHT_STR,
            ReadingColumn::Co2Emission => CO2_EMISSION_STR,
            ReadingColumn::ItemCount => ITEM_COUNT_STR,
        }
    }
}

pub(super) const TIMESTAMP_STR: &str = "Time Stamp";
pub(super) const STATION_STR: &str = "Station";
pub(super) const CATEGORY_STR: &str = "Category";
pub(super) const WEIGHT_STR: &str = "Weight (kg)";
pub(super) const CO2_EMISSION_STR: &str = "CO2 Emission (kg)";
pub(super) const ITEM_COUNT_STR: &str = "Chopsticks Count (pair)";

//! Implements the very simple `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the
//! whole app, top-to-bottom, without using Google Sheets.

use crate::api::{Sheet, READINGS};
use crate::Result;
use anyhow::{anyhow, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, OnceLock};

/// Process-wide sheet contents, keyed by spreadsheet id and then by sheet
/// name. Keyed this way so that a `TestSheet` created later in the same
/// process (for example by a second command in one test) sees earlier appends.
static STATE: OnceLock<Mutex<HashMap<String, HashMap<String, Vec<Vec<String>>>>>> =
    OnceLock::new();

fn state() -> &'static Mutex<HashMap<String, HashMap<String, Vec<Vec<String>>>>> {
    STATE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// An implementation of the `Sheet` trait that does not use Google sheets. A spreadsheet id that
/// has not been seen before is seeded with the data in this module.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    /// Create a new `TestSheet` addressing the in-memory spreadsheet with `spreadsheet_id`.
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// The current rows of the readings sheet, for test assertions.
    #[cfg(test)]
    pub(crate) fn get_state(&self) -> Vec<Vec<String>> {
        let mut guard = state().lock().unwrap();
        let sheets = guard
            .entry(self.spreadsheet_id.clone())
            .or_insert_with(|| default_data().unwrap());
        sheets.get(READINGS).cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        let mut guard = state()
            .lock()
            .map_err(|_| anyhow!("The test sheet state is poisoned"))?;
        if !guard.contains_key(&self.spreadsheet_id) {
            let seeded = default_data()?;
            guard.insert(self.spreadsheet_id.clone(), seeded);
        }
        guard
            .get(&self.spreadsheet_id)
            .and_then(|sheets| sheets.get(sheet_name))
            .with_context(|| format!("Sheet '{sheet_name}' not found"))
            .cloned()
    }

    async fn append(&mut self, sheet_name: &str, row: Vec<String>) -> Result<()> {
        let mut guard = state()
            .lock()
            .map_err(|_| anyhow!("The test sheet state is poisoned"))?;
        if !guard.contains_key(&self.spreadsheet_id) {
            let seeded = default_data()?;
            guard.insert(self.spreadsheet_id.clone(), seeded);
        }
        guard
            .get_mut(&self.spreadsheet_id)
            .and_then(|sheets| sheets.get_mut(sheet_name))
            .with_context(|| format!("Sheet '{sheet_name}' not found"))?
            .push(row);
        Ok(())
    }
}

/// Provides the seed data from this module.
fn default_data() -> Result<HashMap<String, Vec<Vec<String>>>> {
    let mut map = HashMap::new();
    let readings = load_csv(READING_DATA)?;
    map.insert(READINGS.to_string(), readings);
    Ok(map)
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let bytes = csv_data.as_bytes();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .from_reader(Cursor::new(bytes));

    let mut rows: Vec<Vec<String>> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed reading data.
const READING_DATA: &str = r##"Time Stamp,Station,Category,Weight (kg),CO2 Emission (kg),Chopsticks Count (pair)
2026-08-01 10:02:11,Station 1,Recycle,2.00,0,0
2026-08-01 10:15:43,Station 2,Chopsticks,0.50,8.30,166
2026-08-01 11:40:09,Station 1,Landfill,5.00,0,0
2026-08-01 12:05:37,Station 3,Recycle,1.25,0,0
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data_parses() {
        let rows = load_csv(READING_DATA).unwrap();
        assert_eq!(rows.len(), 5); // header plus four readings
        assert_eq!(rows[0][2], "Category");
        assert_eq!(rows[2][2], "Chopsticks");
        assert_eq!(rows[2][5], "166");
    }

    #[tokio::test]
    async fn test_get_and_append() {
        let mut sheet = TestSheet::new("test_get_and_append");
        let before = sheet.get(READINGS).await.unwrap();
        sheet
            .append(
                READINGS,
                vec![
                    "2026-08-02 09:00:00".to_string(),
                    "Station 1".to_string(),
                    "Recycle".to_string(),
                    "0.75".to_string(),
                    "0".to_string(),
                    "0".to_string(),
                ],
            )
            .await
            .unwrap();
        let after = sheet.get(READINGS).await.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last().unwrap()[3], "0.75");
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_an_error() {
        let mut sheet = TestSheet::new("test_unknown_sheet");
        assert!(sheet.get("NoSuchTab").await.is_err());
    }
}

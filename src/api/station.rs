//! Converts between raw sheet rows and the station data model.

use crate::api::{Sheet, READINGS};
use crate::model::{Reading, Readings, StationData};
use crate::Result;

/// Wraps a dynamically-dispatched `Sheet` and speaks in model types.
pub(crate) struct StationSheet {
    sheet: Box<dyn Sheet + Send>,
}

impl StationSheet {
    /// Create a new `StationSheet` object that will use a dynamically-dispatched `sheet` to get
    /// and send its data.
    pub(crate) fn new(sheet: Box<dyn Sheet + Send>) -> Self {
        Self { sheet }
    }

    /// Fetches the full readings log.
    pub(crate) async fn get_data(&mut self) -> Result<StationData> {
        let values = self.sheet.get(READINGS).await?;
        Ok(StationData::new(Readings::new(values)?))
    }

    /// Appends one reading to the log.
    pub(crate) async fn append_reading(&mut self, reading: &Reading) -> Result<()> {
        self.sheet.append(READINGS, reading.to_row()).await
    }
}

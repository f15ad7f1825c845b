//! The spreadsheet boundary: a minimal `Sheet` trait with a Google-backed
//! implementation and an in-memory implementation for tests.

mod files;
mod oauth;
mod sheet_client;
mod sheet_test_client;
mod station;

use crate::{Config, Result};

pub(crate) use oauth::TokenProvider;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheet;
pub(crate) use station::StationSheet;

/// The sheet tab that holds the readings log. The kiosks write to the
/// spreadsheet's first tab.
pub(crate) const READINGS: &str = "Sheet1";

/// OAuth scope required for Sheets API access.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// When this environment variable is set and non-zero in length, the app uses
/// the in-memory test sheet instead of the Google APIs.
pub const IN_TEST_MODE: &str = "STATION_SYNC_IN_TEST_MODE";

/// Selects the `Sheet` implementation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// Use the real Google Sheets API.
    #[default]
    Google,
    /// Use the in-memory test sheet.
    Test,
}

impl Mode {
    /// This allows for testing the program without hitting the Google APIs.
    /// When `STATION_SYNC_IN_TEST_MODE` is set and non-zero in length, then
    /// the mode will be `Mode::Test`, otherwise it will be `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// The very simple interface this app needs from a spreadsheet: read a whole
/// tab, append one row.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    async fn get(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>>;
    async fn append(&mut self, sheet_name: &str, row: Vec<String>) -> Result<()>;
}

/// Creates the `Sheet` implementation for `mode`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path()).await?;
            Ok(Box::new(
                sheet_client::GoogleSheet::new(config.clone(), token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(sheet_test_client::TestSheet::new(
            config.spreadsheet_id(),
        ))),
    }
}

/// Creates a `StationSheet` over the `Sheet` implementation for `mode`.
pub(crate) async fn station(config: &Config, mode: Mode) -> Result<StationSheet> {
    Ok(StationSheet::new(sheet(config, mode).await?))
}

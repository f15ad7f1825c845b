//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::TestSheet;
use crate::Config;
use tempfile::TempDir;
use uuid::Uuid;

/// Test environment that sets up a station home directory with a `Config` and
/// an in-memory test sheet. Holds `TempDir` to keep the directory alive for
/// the duration of the test. Each environment gets its own random spreadsheet
/// id, so parallel tests do not see each other's sheets.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a ready-to-use `Config`.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("station");
        let secret_path = temp_dir.path().join("client_secret.json");

        // Create minimal client_secret.json
        let secret_content = r#"{
            "installed": {
                "client_id": "test-client-id",
                "client_secret": "test-secret",
                "redirect_uris": ["http://localhost"],
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;
        std::fs::write(&secret_path, secret_content).unwrap();

        let rand = Uuid::new_v4().to_string().replace('-', "");
        let sheet_url = format!("https://docs.google.com/spreadsheets/d/{}/edit", rand);
        let config = Config::create(&root, &secret_path, &sheet_url)
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    /// The current rows of this environment's test sheet.
    pub(crate) fn state(&self) -> Vec<Vec<String>> {
        TestSheet::new(self.config.spreadsheet_id()).get_state()
    }
}

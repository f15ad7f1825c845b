//! Serialization and deserialization structures for Google OAuth credential files.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: cached access and refresh tokens

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// Represents a file that we want to `Serialize`, `Deserialize`, and read from memory in-between
/// serializations and deserialization. Basically we are just holding the `path` and the `data`
/// here.
#[derive(Default, Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    /// Load data from a file and create a File instance
    pub(super) async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    /// Create a File instance with the given path and data
    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Save the current data to the file
    pub(super) async fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        // Set restrictive permissions on Unix-like systems
        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    /// Get a reference to the data
    pub(super) fn data(&self) -> &F {
        &self.data
    }

    /// Get a mutable reference to the data
    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// This file contains OAuth 2.0 Desktop Application credentials. The standard format from Google
/// has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct SecretFile {
    /// Wrapper containing the installed application credentials
    installed: InstalledCredentials,
}

impl SecretFile {
    /// Get the client ID
    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    /// Get the client secret
    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    /// Get the auth URI
    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    /// Get the token URI
    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct InstalledCredentials {
    /// OAuth client ID
    client_id: String,

    /// OAuth client secret
    client_secret: String,

    /// List of valid redirect URIs for OAuth callbacks
    /// For this application, should contain "http://localhost" (without a port number)
    redirect_uris: RedirectUris,

    /// Google's OAuth authorization endpoint
    auth_uri: String,

    /// Google's OAuth token endpoint
    token_uri: String,
}

#[derive(Default, Debug, Clone)]
struct RedirectUris(Vec<String>);

impl Serialize for RedirectUris {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RedirectUris {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<String>::deserialize(deserializer)?;
        if !vec.iter().any(|s| is_valid_redirect(s)) {
            return Err(D::Error::custom(format!(
                "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
                When creating the redirect URI for your Google API Key, you must include \
                '{REDIRECT}'"
            )));
        }
        Ok(Self(vec))
    }
}

/// A redirect is usable if it is localhost, with or without a port.
fn is_valid_redirect(s: &str) -> bool {
    s == REDIRECT || s.starts_with(&format!("{REDIRECT}:"))
}

/// Represents the structure of the cached `token.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct TokenFile {
    /// The short-lived access token presented to the Sheets API
    access_token: String,

    /// The long-lived token used to mint new access tokens without a browser
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,

    /// When the access token expires
    expiry: DateTime<Utc>,

    /// The scopes the token was granted
    scopes: Vec<String>,
}

impl TokenFile {
    pub(super) fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expiry: DateTime<Utc>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expiry,
            scopes,
        }
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub(crate) fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// True when the token is expired or within a minute of expiring.
    pub(super) fn is_near_expiry(&self) -> bool {
        Utc::now() + Duration::seconds(60) >= self.expiry
    }

    /// True when the token was granted every scope in `required`.
    pub(super) fn has_scopes(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|s| s == scope))
    }
}

/// Loads a `SecretFile` from the given path.
pub(super) async fn load_secret(path: &Path) -> Result<File<SecretFile>> {
    File::load(path)
        .await
        .with_context(|| format!("Unable to read OAuth client credentials at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_JSON: &str = r#"{
        "installed": {
            "client_id": "test-client-id",
            "client_secret": "test-secret",
            "redirect_uris": ["http://localhost"],
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }
    }"#;

    #[test]
    fn test_secret_file_parses() {
        let secret: SecretFile = serde_json::from_str(SECRET_JSON).unwrap();
        assert_eq!(secret.client_id(), "test-client-id");
        assert_eq!(secret.client_secret(), "test-secret");
        assert_eq!(secret.token_uri(), "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_secret_file_requires_localhost_redirect() {
        let json = r#"{
            "installed": {
                "client_id": "x",
                "client_secret": "y",
                "redirect_uris": ["https://example.com/callback"],
                "auth_uri": "a",
                "token_uri": "b"
            }
        }"#;
        assert!(serde_json::from_str::<SecretFile>(json).is_err());
    }

    #[test]
    fn test_redirect_with_port_is_valid() {
        assert!(is_valid_redirect("http://localhost:3030"));
        assert!(is_valid_redirect("http://localhost"));
        assert!(!is_valid_redirect("http://localhost.evil.com"));
    }

    #[test]
    fn test_token_file_expiry() {
        let expired = TokenFile::new(
            "t",
            None,
            Utc::now() - Duration::seconds(10),
            vec!["scope".to_string()],
        );
        assert!(expired.is_near_expiry());

        let fresh = TokenFile::new(
            "t",
            None,
            Utc::now() + Duration::seconds(3600),
            vec!["scope".to_string()],
        );
        assert!(!fresh.is_near_expiry());
    }

    #[test]
    fn test_token_file_scopes() {
        let token = TokenFile::new(
            "t",
            None,
            Utc::now(),
            vec!["https://www.googleapis.com/auth/spreadsheets".to_string()],
        );
        assert!(token.has_scopes(&["https://www.googleapis.com/auth/spreadsheets"]));
        assert!(!token.has_scopes(&["https://www.googleapis.com/auth/drive"]));
    }
}

//! OAuth 2.0 authentication flow implementation for Google Sheets API.
//!
//! This module handles the complete OAuth workflow including:
//! - Loading OAuth credentials from client_secret.json
//! - Managing access and refresh tokens in token.json
//! - Running the OAuth consent flow with a local callback server
//! - Automatic token refresh when expired

use crate::api::files::{load_secret, File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::Result;
use anyhow::{bail, Context};
use chrono::Utc;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{debug, info};

const OAUTH_CALLBACK_PORT: u16 = 3030;

/// Seconds an access token is assumed to live when the token endpoint does not
/// say.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

type OauthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Owns the OAuth credential and token files and produces valid access tokens,
/// refreshing them when they are close to expiry.
pub(crate) struct TokenProvider {
    secret: File<SecretFile>,
    token: File<TokenFile>,
}

impl TokenProvider {
    /// Runs the complete OAuth consent flow and caches the resulting tokens.
    ///
    /// This is the ONLY path that requires the user's browser. It:
    /// 1. Loads OAuth credentials from client_secret.json
    /// 2. Starts a local HTTP server on localhost
    /// 3. Prints the Google consent URL for the user to open
    /// 4. Waits for the OAuth callback with the authorization code
    /// 5. Exchanges the code for access and refresh tokens
    /// 6. Saves tokens to token.json
    ///
    /// # Errors
    /// Returns an error if any step fails (missing files, network errors, a
    /// state mismatch in the callback).
    pub(crate) async fn initialize(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        info!("Starting OAuth consent flow");
        let secret = load_secret(secret_path.as_ref()).await?;
        let client = oauth_client(secret.data())?;

        let mut authorize = client
            .authorize_url(CsrfToken::new_random)
            // Google only issues a refresh token for offline access requests
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");
        for scope in OAUTH_SCOPES {
            authorize = authorize.add_scope(Scope::new((*scope).to_string()));
        }
        let (auth_url, csrf_token) = authorize.url();

        info!("Open this URL in your browser to authorize access:");
        info!("{auth_url}");
        info!("Waiting for the callback on http://localhost:{OAUTH_CALLBACK_PORT} ...");

        let code = receive_authorization_code(&csrf_token).await?;

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&http_client()?)
            .await
            .context("Failed to exchange the authorization code for tokens")?;

        let token_file = token_file_from_response(&response, None);
        let token = File::new(token_path.as_ref(), token_file);
        token.save().await?;
        info!("Authorization successful, tokens saved");

        Ok(Self { secret, token })
    }

    /// Loads previously cached tokens. Never opens a browser; if the cached
    /// tokens are missing or were granted the wrong scopes, this fails with a
    /// message telling the user to run `station auth`.
    pub(crate) async fn load(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let secret = load_secret(secret_path.as_ref()).await?;
        let token: File<TokenFile> = File::load(token_path.as_ref()).await.with_context(|| {
            format!(
                "Unable to read cached tokens at {}. Run 'station auth' to authorize.",
                token_path.as_ref().display()
            )
        })?;
        if !token.data().has_scopes(OAUTH_SCOPES) {
            bail!(
                "The cached token is missing a required scope. \
                Run 'station auth' to re-authorize."
            );
        }
        Ok(Self { secret, token })
    }

    /// Returns a valid access token, refreshing first if the cached one is
    /// expired or within a minute of expiring.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<String> {
        if self.token.data().is_near_expiry() {
            debug!("Access token is near expiry, refreshing");
            self.refresh().await?;
        }
        Ok(self.token.data().access_token().to_string())
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .token
            .data()
            .refresh_token()
            .context(
                "No refresh token is cached. Run 'station auth' to authorize from scratch.",
            )?
            .to_string();

        let client = oauth_client(self.secret.data())?;
        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&http_client()?)
            .await
            .context("Failed to refresh the access token")?;

        // The refresh response usually omits the refresh token; keep the old one.
        *self.token.data_mut() = token_file_from_response(&response, Some(refresh_token));
        self.token.save().await?;
        debug!("Token refreshed, valid until {}", self.token.data().expiry());
        Ok(())
    }
}

/// Builds the oauth2 client from the installed-app credentials.
fn oauth_client(secret: &SecretFile) -> Result<OauthClient> {
    Ok(
        BasicClient::new(ClientId::new(secret.client_id().to_string()))
            .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
            .set_auth_uri(
                AuthUrl::new(secret.auth_uri().to_string())
                    .context("The auth_uri in client_secret.json is not a valid URL")?,
            )
            .set_token_uri(
                TokenUrl::new(secret.token_uri().to_string())
                    .context("The token_uri in client_secret.json is not a valid URL")?,
            )
            .set_redirect_uri(
                RedirectUrl::new(format!("http://localhost:{OAUTH_CALLBACK_PORT}"))
                    .context("Unable to construct the OAuth redirect URL")?,
            ),
    )
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        // Following redirects during a token exchange would be an SSRF hazard
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build the OAuth HTTP client")
}

/// Converts a token-endpoint response into our cached token format.
fn token_file_from_response(
    response: &oauth2::basic::BasicTokenResponse,
    fallback_refresh_token: Option<String>,
) -> TokenFile {
    let expiry = match response.expires_in() {
        Some(duration) => {
            Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(duration.as_secs()).unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
                )
        }
        None => Utc::now() + chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
    };
    let refresh_token = response
        .refresh_token()
        .map(|t| t.secret().clone())
        .or(fallback_refresh_token);
    let scopes = match response.scopes() {
        Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
        None => OAUTH_SCOPES.iter().map(|s| (*s).to_string()).collect(),
    };
    TokenFile::new(
        response.access_token().secret().clone(),
        refresh_token,
        expiry,
        scopes,
    )
}

/// Serves localhost until the browser delivers the authorization code, then
/// verifies the anti-forgery state and returns the code.
async fn receive_authorization_code(expected_state: &CsrfToken) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", OAUTH_CALLBACK_PORT))
        .await
        .with_context(|| {
            format!("Unable to listen on localhost:{OAUTH_CALLBACK_PORT} for the OAuth callback")
        })?;

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .context("Failed to accept the OAuth callback connection")?;
        let io = TokioIo::new(stream);
        let received: Arc<Mutex<Option<(String, String)>>> = Arc::new(Mutex::new(None));
        let captured = received.clone();

        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            let captured = captured.clone();
            async move {
                let mut code = None;
                let mut state = None;
                if let Some(query) = req.uri().query() {
                    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                        match key.as_ref() {
                            "code" => code = Some(value.into_owned()),
                            "state" => state = Some(value.into_owned()),
                            _ => {}
                        }
                    }
                }
                let body = match (code, state) {
                    (Some(code), Some(state)) => {
                        if let Ok(mut guard) = captured.lock() {
                            *guard = Some((code, state));
                        }
                        "Authorization received. You can close this window and \
                        return to the terminal."
                    }
                    _ => "The authorization response was missing its code. Please try again.",
                };
                Ok::<_, Infallible>(Response::new(body.to_string()))
            }
        });

        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
            // Browsers probe with extra requests (favicons and the like)
            debug!("OAuth callback connection ended with an error: {e}");
        }

        let delivered = received.lock().ok().and_then(|mut guard| guard.take());
        if let Some((code, state)) = delivered {
            if state != *expected_state.secret() {
                bail!("The OAuth state parameter did not match, aborting for safety");
            }
            return Ok(code);
        }
    }
}

//! OAuth 2.0 Authorization Code Flow
//!
//! Talks to the provider's authorization and token endpoints for one
//! account:
//! - Building the consent URL (offline access, so a refresh token is issued)
//! - Exchanging an authorization code for tokens
//! - Refreshing an access token
//!
//! Token values and authorization codes are never logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::google(
//!     "client-id.apps.googleusercontent.com",
//!     "client-secret",
//!     "http://localhost:3000/google/redirect/0",
//! );
//!
//! let flow = OAuthFlowManager::new(config, http_client);
//! let consent_url = flow.build_auth_url()?;
//! // Redirect the user to consent_url, then with the returned code:
//! let tokens = flow.exchange_code("4/0Ab...").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested on consent: read-only Drive access plus basic profile.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/userinfo.profile",
];

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REFRESH_ATTEMPTS: u32 = 3;

/// OAuth 2.0 client configuration for one account.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    /// Google endpoints with the Drive read-only scopes.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: GOOGLE_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Point both endpoints at another server (used by tests and proxies).
    pub fn with_endpoints(mut self, auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

impl From<TokenResponse> for OAuthTokens {
    fn from(response: TokenResponse) -> Self {
        OAuthTokens::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
        )
        .with_scope(response.scope)
        .with_token_type(response.token_type)
    }
}

/// OAuth 2.0 flow manager.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the consent URL the user is redirected to.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a
    /// valid URL.
    #[instrument(skip(self), fields(redirect_uri = %self.config.redirect_uri))]
    pub fn build_auth_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri);

        debug!("Built authorization URL");
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// One attempt only; codes are single-use, so a retry after an
    /// ambiguous failure would be rejected anyway.
    ///
    /// # Errors
    ///
    /// `AuthExchange` when the endpoint cannot be reached, rejects the code
    /// or returns an unparsable body.
    #[instrument(skip(self, code), fields(redirect_uri = %self.config.redirect_uri))]
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens> {
        if code.is_empty() {
            return Err(AuthError::AuthExchange(
                "authorization code is empty".to_string(),
            ));
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let request = HttpRequest::post(self.config.token_url.clone())
            .form(&params)
            .map_err(|e| AuthError::Other(e.to_string()))?
            .timeout(TOKEN_REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::AuthExchange(e.to_string()))?;

        if !response.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(
                status = response.status,
                error = %error_body,
                "Token endpoint rejected authorization code"
            );
            return Err(AuthError::AuthExchange(format!(
                "Token endpoint returned {}: {}",
                response.status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::AuthExchange(format!("Invalid token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Exchanged authorization code"
        );
        Ok(token_response.into())
    }

    /// Obtain a new access token from a refresh token.
    ///
    /// Retries transport failures, 429 and 5xx responses up to three
    /// attempts with exponential backoff. Any other 4xx (revoked or invalid
    /// grant) fails immediately. The returned set carries the refresh token from
    /// the response if one was issued; callers merge with the previous set
    /// via [`OAuthTokens::inherit_from`].
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let request = HttpRequest::post(self.config.token_url.clone())
            .form(&params)
            .map_err(|e| AuthError::Other(e.to_string()))?
            .timeout(TOKEN_REQUEST_TIMEOUT);

        let policy = RetryPolicy {
            max_attempts: MAX_REFRESH_ATTEMPTS,
            ..RetryPolicy::default()
        };

        let response = self
            .http_client
            .execute_with_retry(request, policy)
            .await
            .map_err(|e| {
                warn!(error = %e, "Token endpoint unreachable");
                AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts: {}",
                    MAX_REFRESH_ATTEMPTS, e
                ))
            })?;

        if !response.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(
                status = response.status,
                error = %error_body,
                "Token refresh rejected"
            );
            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                response.status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::TokenRefreshFailed(format!("Invalid token response: {}", e)))?;
        info!(expires_in = token_response.expires_in, "Refreshed access token");
        Ok(token_response.into())
    }
}

//! Token Persistence
//!
//! Reads and writes per-account OAuth token records through a
//! [`CredentialStore`]. One JSON object per account:
//!
//! ```json
//! {"access_token":"…","refresh_token":"…","scope":"…","token_type":"Bearer","expiry_date":1700000000000}
//! ```
//!
//! `expiry_date` is epoch milliseconds. Everything except `access_token` is
//! optional on read, so records written by other OAuth clients for the same
//! accounts load unchanged.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::CredentialStore;
//! # async fn example(store: Arc<dyn CredentialStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(store);
//!
//! let tokens = OAuthTokens::new(
//!     "access_token_value".to_string(),
//!     Some("refresh_token_value".to_string()),
//!     3600,
//! );
//!
//! token_store.store_tokens("creds_account1.json", &tokens).await?;
//! let retrieved = token_store.retrieve_tokens("creds_account1.json").await?;
//! assert!(retrieved.is_some());
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::storage::CredentialStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token persistence keyed by credential key.
///
/// Token values never reach the logs; failures are reported with the key
/// and the underlying storage error only.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn CredentialStore>,
}

/// On-disk record layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry_date: Option<i64>,
}

impl From<&OAuthTokens> for StoredTokens {
    fn from(tokens: &OAuthTokens) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            scope: tokens.scope.clone(),
            token_type: tokens.token_type.clone(),
            expiry_date: tokens.expires_at.map(|at| at.timestamp_millis()),
        }
    }
}

impl From<StoredTokens> for OAuthTokens {
    fn from(stored: StoredTokens) -> Self {
        Self {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at: stored.expiry_date.and_then(DateTime::<Utc>::from_timestamp_millis),
            scope: stored.scope,
            token_type: stored.token_type,
        }
    }
}

impl TokenStore {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Persist `tokens` under `key`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns `SecureStorageUnavailable` if the write fails. The previous
    /// record is left intact in that case.
    pub async fn store_tokens(&self, key: &str, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens::from(tokens);
        let json = serde_json::to_vec(&stored)
            .map_err(|e| AuthError::Other(format!("Failed to serialize tokens: {}", e)))?;

        self.store.put(key, &json).await.map_err(|e| {
            warn!(key, error = %e, "Failed to persist tokens");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        info!(
            key,
            has_refresh_token = stored.refresh_token.is_some(),
            "Tokens persisted"
        );
        Ok(())
    }

    /// Load the record under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(tokens))` if a readable record exists
    /// - `Ok(None)` if nothing is stored
    /// - `Err(TokenCorrupted)` if the record exists but does not parse; the
    ///   record is left in place for inspection
    pub async fn retrieve_tokens(&self, key: &str) -> Result<Option<OAuthTokens>> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "No stored tokens");
                return Ok(None);
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read tokens");
                return Err(AuthError::SecureStorageUnavailable(e.to_string()));
            }
        };

        let stored: StoredTokens =
            serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenCorrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if stored.access_token.is_empty() && stored.refresh_token.is_none() {
            return Err(AuthError::TokenCorrupted {
                key: key.to_string(),
                reason: "record holds neither an access nor a refresh token".to_string(),
            });
        }

        debug!(key, "Loaded stored tokens");
        Ok(Some(stored.into()))
    }
}

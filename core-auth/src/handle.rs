//! Per-account credential handle.
//!
//! An [`AccountHandle`] owns the live token set of one account. Readers take
//! a full clone under a read lock; writers replace the whole set, so a
//! request never sees a half-renewed credential. Renewals are single-flight
//! per handle and reach every registered [`TokenObserver`] before they are
//! installed.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::types::{Account, AccountId, OAuthTokens};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Seconds before expiry at which a token is treated as expired.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

/// Upper bound on one refresh round trip, retries included.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of a currently valid bearer token.
///
/// Implemented by [`AccountHandle`]; storage connectors depend on this
/// trait only.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Notified whenever a handle obtains a new token set.
///
/// Called before the set is installed. An error aborts the renewal and the
/// handle keeps its previous tokens.
#[async_trait]
pub trait TokenObserver: Send + Sync {
    async fn tokens_renewed(&self, account: &Account, tokens: &OAuthTokens) -> Result<()>;
}

pub struct AccountHandle {
    account: Account,
    flow: OAuthFlowManager,
    tokens: RwLock<Option<OAuthTokens>>,
    refresh_lock: Mutex<()>,
    observers: Vec<Arc<dyn TokenObserver>>,
}

impl AccountHandle {
    pub fn new(account: Account, flow: OAuthFlowManager) -> Self {
        Self {
            account,
            flow,
            tokens: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn id(&self) -> AccountId {
        self.account.id
    }

    /// Install tokens loaded from storage, without notifying observers.
    pub async fn install(&self, tokens: OAuthTokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn snapshot(&self) -> Option<OAuthTokens> {
        self.tokens.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    pub fn authorization_url(&self) -> Result<String> {
        self.flow.build_auth_url()
    }

    /// Trade a consent code for tokens, persist them, then install them.
    ///
    /// A consent that does not return a refresh token keeps the one already
    /// held, if any.
    #[instrument(skip(self, code), fields(account = %self.account.id))]
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens> {
        let _guard = self.refresh_lock.lock().await;

        let mut tokens = self.flow.exchange_code(code).await?;
        if let Some(previous) = self.snapshot().await {
            tokens = tokens.inherit_from(&previous);
        }

        self.notify(&tokens).await?;
        *self.tokens.write().await = Some(tokens.clone());

        info!(
            has_refresh_token = tokens.can_refresh(),
            "Account authorized"
        );
        Ok(tokens)
    }

    /// Force a renewal regardless of the current expiry.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if no tokens are held
    /// - `NoRefreshToken` if the held set cannot be renewed
    /// - `TokenRefreshFailed` if the token endpoint fails or times out
    /// - any observer error; the previous tokens stay installed
    #[instrument(skip(self), fields(account = %self.account.id))]
    pub async fn refresh(&self) -> Result<OAuthTokens> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.require_tokens().await?;
        self.renew(current).await
    }

    async fn require_tokens(&self) -> Result<OAuthTokens> {
        self.snapshot().await.ok_or(AuthError::NotAuthenticated {
            account: self.account.id,
        })
    }

    /// Refresh `current`; caller holds `refresh_lock`.
    async fn renew(&self, current: OAuthTokens) -> Result<OAuthTokens> {
        let refresh_token = match current.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                error!("No refresh token available");
                return Err(AuthError::NoRefreshToken {
                    account: self.account.id,
                });
            }
        };

        let renewed = match timeout(REFRESH_TIMEOUT, self.flow.refresh_access_token(&refresh_token))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                error!("Token refresh timed out");
                return Err(AuthError::TokenRefreshFailed(
                    "token refresh timed out".to_string(),
                ));
            }
        }
        .inherit_from(&current);

        self.notify(&renewed).await?;
        *self.tokens.write().await = Some(renewed.clone());

        info!(
            expires_in_secs = renewed.time_until_expiry().map(|d| d.num_seconds()),
            "Tokens renewed"
        );
        Ok(renewed)
    }

    async fn notify(&self, tokens: &OAuthTokens) -> Result<()> {
        for observer in &self.observers {
            if let Err(e) = observer.tokens_renewed(&self.account, tokens).await {
                warn!(error = %e, "Token observer failed, keeping previous tokens");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AccessTokenSource for AccountHandle {
    /// Current access token, refreshed first when it is about to expire.
    async fn access_token(&self) -> Result<String> {
        let current = self.require_tokens().await?;
        if !current.is_expired_with_buffer(TOKEN_REFRESH_BUFFER_SECS) {
            return Ok(current.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have renewed while we waited.
        let current = self.require_tokens().await?;
        if !current.is_expired_with_buffer(TOKEN_REFRESH_BUFFER_SECS) {
            debug!(account = %self.account.id, "Token renewed concurrently");
            return Ok(current.access_token);
        }

        info!(account = %self.account.id, "Access token expired, refreshing");
        Ok(self.renew(current).await?.access_token)
    }
}

impl std::fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountHandle")
            .field("account", &self.account)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

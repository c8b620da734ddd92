//! # Credential Manager
//!
//! Owns the account registry and one [`AccountHandle`] per account.
//!
//! ## Overview
//!
//! - Loads every persisted credential at startup; a missing or unreadable
//!   record leaves that account unauthenticated without affecting others
//! - Routes consent URLs and code exchanges to the right account
//! - Persists every renewed token set through a [`TokenObserver`] registered
//!   on each handle, before the handle switches to it
//! - Renews all accounts on demand, each independently
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{AccountRegistry, CredentialManager};
//! use core_runtime::config::AppConfig;
//! use std::sync::Arc;
//! # use bridge_traits::{http::HttpClient, storage::CredentialStore};
//! # async fn example(
//! #     http_client: Arc<dyn HttpClient>,
//! #     store: Arc<dyn CredentialStore>,
//! # ) -> core_auth::Result<()> {
//! let config = AppConfig::builder()
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .build()
//!     .expect("valid config");
//!
//! let manager = CredentialManager::from_app_config(&config, http_client, store);
//! manager.initialize().await;
//!
//! println!("consent at {}", manager.authorization_url(0)?);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::handle::{AccountHandle, TokenObserver};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::registry::AccountRegistry;
use crate::token_store::TokenStore;
use crate::types::{Account, AccountId, OAuthTokens};
use async_trait::async_trait;
use bridge_traits::{http::HttpClient, storage::CredentialStore};
use core_runtime::config::AppConfig;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Writes renewed tokens to the account's credential record.
struct PersistingObserver {
    token_store: TokenStore,
}

#[async_trait]
impl TokenObserver for PersistingObserver {
    async fn tokens_renewed(&self, account: &Account, tokens: &OAuthTokens) -> Result<()> {
        self.token_store
            .store_tokens(&account.credential_key, tokens)
            .await
    }
}

/// Outcome of one renewal sweep.
#[derive(Debug, Default)]
pub struct RenewalReport {
    pub renewed: Vec<AccountId>,
    /// Accounts with nothing to renew (no tokens held).
    pub skipped: Vec<AccountId>,
    pub failed: Vec<(AccountId, String)>,
}

pub struct CredentialManager {
    registry: AccountRegistry,
    handles: Vec<Arc<AccountHandle>>,
    token_store: TokenStore,
}

impl CredentialManager {
    /// Build a handle per registry entry.
    ///
    /// `oauth` supplies the client credentials and endpoints; each handle
    /// gets a copy with its own account's redirect URI.
    pub fn new(
        registry: AccountRegistry,
        oauth: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let token_store = TokenStore::new(store);
        let observer: Arc<dyn TokenObserver> = Arc::new(PersistingObserver {
            token_store: token_store.clone(),
        });

        let handles = registry
            .iter()
            .map(|account| {
                let config = OAuthConfig {
                    redirect_uri: account.redirect_uri.clone(),
                    ..oauth.clone()
                };
                let flow = OAuthFlowManager::new(config, http_client.clone());
                Arc::new(AccountHandle::new(account.clone(), flow).with_observer(observer.clone()))
            })
            .collect();

        Self {
            registry,
            handles,
            token_store,
        }
    }

    pub fn from_app_config(
        config: &AppConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let oauth = OAuthConfig::google(
            config.client_id.clone(),
            config.client_secret.clone(),
            String::new(),
        );
        Self::new(
            AccountRegistry::from_config(config),
            oauth,
            http_client,
            store,
        )
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn handles(&self) -> &[Arc<AccountHandle>] {
        &self.handles
    }

    /// Load every persisted credential. Returns how many accounts are
    /// authenticated afterwards.
    #[instrument(skip(self), fields(accounts = self.handles.len()))]
    pub async fn initialize(&self) -> usize {
        let loads = self.handles.iter().map(|handle| async move {
            let account = handle.account();
            match self.token_store.retrieve_tokens(&account.credential_key).await {
                Ok(Some(tokens)) => {
                    handle.install(tokens).await;
                    true
                }
                Ok(None) => {
                    warn!(
                        account = %account.id,
                        key = %account.credential_key,
                        "No stored credential, account needs authorization"
                    );
                    false
                }
                Err(e) => {
                    warn!(
                        account = %account.id,
                        key = %account.credential_key,
                        error = %e,
                        "Stored credential unusable, account needs authorization"
                    );
                    false
                }
            }
        });

        let loaded = join_all(loads).await.into_iter().filter(|ok| *ok).count();
        info!(loaded, "Credentials loaded");
        loaded
    }

    /// Resolve an account index to its handle.
    pub fn lookup(&self, index: i64) -> Result<Arc<AccountHandle>> {
        let account = self.registry.lookup(index)?;
        self.handles
            .get(account.id.index())
            .cloned()
            .ok_or(AuthError::AccountOutOfRange {
                index,
                count: self.handles.len(),
            })
    }

    pub fn authorization_url(&self, index: i64) -> Result<String> {
        self.lookup(index)?.authorization_url()
    }

    #[instrument(skip(self, code))]
    pub async fn exchange_authorization_code(&self, index: i64, code: &str) -> Result<OAuthTokens> {
        let handle = self.lookup(index)?;
        handle.exchange_code(code).await.map_err(|e| {
            error!(account = %handle.id(), error = %e, "Authorization failed");
            e
        })
    }

    /// Renew every authenticated account concurrently.
    ///
    /// One account's failure does not affect the others; failures are
    /// logged and returned in the report.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> RenewalReport {
        let attempts = self.handles.iter().map(|handle| async move {
            if !handle.is_authenticated().await {
                return (handle.id(), None);
            }
            (handle.id(), Some(handle.refresh().await))
        });

        let mut report = RenewalReport::default();
        for (id, outcome) in join_all(attempts).await {
            match outcome {
                None => report.skipped.push(id),
                Some(Ok(_)) => report.renewed.push(id),
                Some(Err(e)) => {
                    warn!(account = %id, error = %e, "Scheduled renewal failed");
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        info!(
            renewed = report.renewed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Renewal sweep finished"
        );
        report
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("accounts", &self.registry.len())
            .finish_non_exhaustive()
    }
}

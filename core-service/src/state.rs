//! Shared handler state.

use std::sync::Arc;

use bridge_traits::{HttpClient, StorageProvider};
use core_auth::{AccessTokenSource, AccountHandle, CredentialManager};
use core_runtime::StreamDefaults;
use provider_google_drive::GoogleDriveConnector;
use tokio_util::sync::CancellationToken;

/// Builds the storage provider that acts on behalf of one account.
pub trait StorageProviderFactory: Send + Sync {
    fn for_account(&self, account: Arc<AccountHandle>) -> Arc<dyn StorageProvider>;
}

/// Google Drive connectors sharing one HTTP client.
pub struct GoogleDriveProviders {
    http_client: Arc<dyn HttpClient>,
}

impl GoogleDriveProviders {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

impl StorageProviderFactory for GoogleDriveProviders {
    fn for_account(&self, account: Arc<AccountHandle>) -> Arc<dyn StorageProvider> {
        let token_source: Arc<dyn AccessTokenSource> = account;
        Arc::new(GoogleDriveConnector::new(
            self.http_client.clone(),
            token_source,
        ))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialManager>,
    pub providers: Arc<dyn StorageProviderFactory>,
    pub stream: StreamDefaults,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        credentials: Arc<CredentialManager>,
        providers: Arc<dyn StorageProviderFactory>,
        stream: StreamDefaults,
    ) -> Self {
        Self {
            credentials,
            providers,
            stream,
            shutdown: CancellationToken::new(),
        }
    }
}

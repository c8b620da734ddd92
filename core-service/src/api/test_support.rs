//! In-memory doubles and a router harness for the route tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    CredentialStore, FilePage, HttpClient, HttpRequest, HttpResponse, ListQuery, RemoteFile,
    StorageProvider,
};
use bytes::Bytes;
use core_auth::{AccountHandle, CredentialManager};
use core_runtime::AppConfig;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::api::server::build_router;
use crate::state::{AppState, StorageProviderFactory};

#[derive(Default)]
pub(crate) struct MemoryStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub(crate) fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
}

/// Answers every request with the same status and body; counts calls.
pub(crate) struct TokenEndpoint {
    status: u16,
    body: String,
    calls: AtomicUsize,
}

impl TokenEndpoint {
    pub(crate) fn granting(access_token: &str) -> Self {
        Self {
            status: 200,
            body: format!(
                r#"{{"access_token":"{}","refresh_token":"refresh","expires_in":3599}}"#,
                access_token
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejecting() -> Self {
        Self {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for TokenEndpoint {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: self.status,
            headers: HashMap::new(),
            body: Bytes::from(self.body.clone()),
        })
    }
}

/// Paged listing where a page token is the index of the next page.
/// Downloads return the file id as content.
#[derive(Default)]
pub(crate) struct FakeDrive {
    pub(crate) pages: Vec<Vec<RemoteFile>>,
    pub(crate) fail_listing: bool,
    pub(crate) queries: Mutex<Vec<ListQuery>>,
}

impl FakeDrive {
    pub(crate) fn with_files(files: Vec<RemoteFile>) -> Self {
        Self {
            pages: vec![files],
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub(crate) fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageProvider for FakeDrive {
    async fn list_page(&self, query: &ListQuery) -> BridgeResult<FilePage> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_listing {
            return Err(BridgeError::OperationFailed("503 from provider".to_string()));
        }
        let index: usize = query
            .page_token
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let next = index + 1;
        Ok(FilePage {
            files: self.pages.get(index).cloned().unwrap_or_default(),
            next_page_token: (next < self.pages.len()).then(|| next.to_string()),
        })
    }

    async fn download(&self, file_id: &str) -> BridgeResult<Bytes> {
        Ok(Bytes::from(file_id.as_bytes().to_vec()))
    }
}

/// Hands out one shared drive and records which accounts asked for it.
pub(crate) struct FakeProviders {
    drive: Arc<FakeDrive>,
    requested: Mutex<Vec<usize>>,
}

impl FakeProviders {
    pub(crate) fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

impl StorageProviderFactory for FakeProviders {
    fn for_account(&self, account: Arc<AccountHandle>) -> Arc<dyn StorageProvider> {
        self.requested.lock().unwrap().push(account.id().index());
        self.drive.clone()
    }
}

pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) drive: Arc<FakeDrive>,
    pub(crate) providers: Arc<FakeProviders>,
    pub(crate) token_endpoint: Arc<TokenEndpoint>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) shutdown: CancellationToken,
}

impl TestApp {
    pub(crate) fn new(accounts: usize, drive: FakeDrive) -> Self {
        Self::with_token_endpoint(accounts, drive, TokenEndpoint::granting("fresh"))
    }

    pub(crate) fn with_token_endpoint(
        accounts: usize,
        drive: FakeDrive,
        token_endpoint: TokenEndpoint,
    ) -> Self {
        let config = AppConfig::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .account_count(accounts)
            .redirect_uri(0, "https://camfeed.example/google/redirect/0")
            .build()
            .unwrap();

        let token_endpoint = Arc::new(token_endpoint);
        let store = Arc::new(MemoryStore::default());
        let credentials = Arc::new(CredentialManager::from_app_config(
            &config,
            token_endpoint.clone(),
            store.clone(),
        ));

        let drive = Arc::new(drive);
        let providers = Arc::new(FakeProviders {
            drive: drive.clone(),
            requested: Mutex::new(Vec::new()),
        });
        let state = AppState::new(credentials, providers.clone(), config.stream.clone());
        let shutdown = state.shutdown.clone();

        Self {
            router: build_router(state),
            drive,
            providers,
            token_endpoint,
            store,
            shutdown,
        }
    }

    pub(crate) async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }
}

pub(crate) fn photo(name: &str, size: u64) -> RemoteFile {
    RemoteFile {
        id: format!("id-{}", name),
        name: name.to_string(),
        mime_type: Some("image/jpeg".to_string()),
        size: Some(size),
        parent_ids: Vec::new(),
    }
}

//! Test doubles shared by the unit tests in this crate.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::CredentialStore;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory credential store; can be switched to fail writes.
#[derive(Default)]
pub(crate) struct MockCredentialStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MockCredentialStore {
    pub(crate) fn failing_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn put(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::StorageError("disk full".to_string()));
        }
        self.data
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.data.lock().await.get(key).cloned())
    }
}

/// Replays canned responses in order and records every request body.
#[derive(Default)]
pub(crate) struct ScriptedHttpClient {
    responses: StdMutex<Vec<BridgeResult<HttpResponse>>>,
    bodies: StdMutex<Vec<String>>,
    latency: Option<Duration>,
}

impl ScriptedHttpClient {
    pub(crate) fn new(mut responses: Vec<BridgeResult<HttpResponse>>) -> Self {
        responses.reverse();
        Self {
            responses: StdMutex::new(responses),
            ..Self::default()
        }
    }

    /// Delay every response, so concurrent callers overlap.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let body = request
            .body
            .map(|b| String::from_utf8_lossy(&b).to_string())
            .unwrap_or_default();
        self.bodies.lock().unwrap().push(body);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(BridgeError::OperationFailed("no scripted response".into())))
    }
}

pub(crate) fn response(status: u16, body: &str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    })
}

pub(crate) fn token_response(access_token: &str) -> BridgeResult<HttpResponse> {
    response(
        200,
        &format!(
            r#"{{"access_token":"{}","expires_in":3599,"token_type":"Bearer"}}"#,
            access_token
        ),
    )
}

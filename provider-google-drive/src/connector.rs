//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::storage::{FilePage, ListQuery, RemoteFile, StorageProvider};
use bytes::Bytes;
use core_auth::AccessTokenSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{GoogleDriveError, Result};
use crate::types::FilesListResponse;

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Fields requested when files are going to be filtered and downloaded.
pub const STREAM_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, parents)";

/// Fields requested for a plain name listing.
pub const LISTING_FIELDS: &str = "nextPageToken, files(id, name)";

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Google Drive API connector
///
/// Bound to one account through an [`AccessTokenSource`]; a token is
/// requested for every call, so renewals made elsewhere are picked up
/// immediately.
///
/// # Features
///
/// - Paginated file listing with caller-supplied query and field selector
/// - Whole-file downloads
/// - Exponential backoff for rate limiting and server errors on listings;
///   downloads are a single attempt
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::{ListQuery, StorageProvider};
///
/// let connector = GoogleDriveConnector::new(http_client, account_handle);
/// let page = connector.list_page(&ListQuery::new().filter("mimeType='image/jpeg'")).await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    token_source: Arc<dyn AccessTokenSource>,
    retry_policy: RetryPolicy,
    api_base: String,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, token_source: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            http_client,
            token_source,
            retry_policy: RetryPolicy::default(),
            api_base: DRIVE_API_BASE.to_string(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send requests to another API root (test servers, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn list_url(&self, query: &ListQuery) -> String {
        let mut url = format!(
            "{}/files?pageSize={}",
            self.api_base,
            query.page_size.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE)
        );

        if let Some(filter) = &query.filter {
            url.push_str(&format!("&q={}", urlencoding::encode(filter)));
        }
        if let Some(fields) = &query.fields {
            url.push_str(&format!("&fields={}", urlencoding::encode(fields)));
        }
        if let Some(page_token) = &query.page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(page_token)));
        }
        url
    }

    async fn bearer_token(&self) -> Result<String> {
        self.token_source
            .access_token()
            .await
            .map_err(|e| GoogleDriveError::AuthenticationFailed(e.to_string()))
    }

    /// Execute an authorized GET under `policy`.
    ///
    /// Retries (429, 5xx, transport failures) are the HTTP client's
    /// `execute_with_retry`; any non-success status left after that is an
    /// error.
    #[instrument(skip(self, policy), fields(url = %url, max_attempts = policy.max_attempts))]
    async fn get(&self, url: String, timeout: Duration, policy: &RetryPolicy) -> Result<HttpResponse> {
        let token = self.bearer_token().await?;
        let request = HttpRequest::get(url).bearer_token(token).timeout(timeout);

        let response = self
            .http_client
            .execute_with_retry(request, policy.clone())
            .await
            .map_err(|e| {
                warn!(error = %e, "API request failed");
                GoogleDriveError::from(e)
            })?;

        if response.is_success() {
            debug!(status = response.status, "API request succeeded");
            return Ok(response);
        }
        if response.is_retryable() {
            warn!(status = response.status, "API request failed after retries");
            return Err(Self::exhausted(&response, policy.max_attempts));
        }

        // Client error - don't retry
        warn!(status = response.status, "API request rejected");
        Err(GoogleDriveError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).to_string(),
        })
    }

    fn exhausted(response: &HttpResponse, attempts: u32) -> GoogleDriveError {
        if response.status == 429 {
            let retry_after_seconds = response
                .header("Retry-After")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            GoogleDriveError::RateLimitExceeded {
                retry_after_seconds,
            }
        } else {
            GoogleDriveError::ApiError {
                status_code: response.status,
                message: format!("Request failed after {} attempt(s)", attempts),
            }
        }
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self), fields(page_token = ?query.page_token))]
    async fn list_page(&self, query: &ListQuery) -> BridgeResult<FilePage> {
        let url = self.list_url(query);
        let response = self.get(url, LIST_TIMEOUT, &self.retry_policy).await?;

        let list_response: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        let files: Vec<RemoteFile> = list_response.files.into_iter().map(Into::into).collect();
        info!(
            files = files.len(),
            has_more = list_response.next_page_token.is_some(),
            "Listed files from Google Drive"
        );

        Ok(FilePage {
            files,
            next_page_token: list_response.next_page_token,
        })
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download(&self, file_id: &str) -> BridgeResult<Bytes> {
        let url = format!(
            "{}/files/{}?alt=media",
            self.api_base,
            urlencoding::encode(file_id)
        );

        // A failed fetch ends the stream session; it is never retried here.
        let response = self
            .get(url, DOWNLOAD_TIMEOUT, &RetryPolicy::no_retry())
            .await
            .map_err(|e| match e {
                GoogleDriveError::ApiError {
                    status_code: 404, ..
                } => GoogleDriveError::FileNotFound {
                    file_id: file_id.to_string(),
                },
                other => other,
            })?;

        info!(bytes = response.body.len(), "Downloaded file");
        Ok(response.body)
    }
}

//! Storage Abstractions
//!
//! Durable credential persistence and remote file enumeration.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Durable key-value persistence for credential records.
///
/// Keys are opaque strings chosen by the caller (one per account). A `put`
/// fully replaces the previous record; readers never observe a partially
/// written value.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::CredentialStore;
///
/// async fn save(store: &dyn CredentialStore, record: &[u8]) -> Result<()> {
///     store.put("creds_account1.json", record).await
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a record, overwriting any previous value under `key`.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a record.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// File metadata as reported by a remote storage provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    /// Size in bytes; absent for folders and provider-native documents.
    pub size: Option<u64>,
    pub parent_ids: Vec<String>,
}

/// Parameters for one page of a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Provider-side filter expression.
    pub filter: Option<String>,
    /// Provider-specific field selector.
    pub fields: Option<String>,
    pub page_size: Option<u32>,
    /// Continuation token returned by the previous page.
    pub page_token: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Same query, positioned at `token`.
    pub fn continue_from(&self, token: Option<String>) -> Self {
        Self {
            page_token: token,
            ..self.clone()
        }
    }
}

/// One page of a remote listing.
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    /// `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

impl FilePage {
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A remote storage account that can be enumerated and read.
///
/// Implementations are bound to one authenticated account.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Fetch one page of the listing described by `query`.
    async fn list_page(&self, query: &ListQuery) -> Result<FilePage>;

    /// Download the full binary content of a file.
    async fn download(&self, file_id: &str) -> Result<Bytes>;
}

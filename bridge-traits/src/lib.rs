//! # Host Bridge Traits
//!
//! Capability traits the core crates depend on, implemented by a host crate
//! (`bridge-desktop` for the server build).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with retry policies
//! - [`CredentialStore`](storage::CredentialStore) - Durable per-account token records
//! - [`StorageProvider`](storage::StorageProvider) - Paginated listing and download of remote files
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert their platform errors into it and keep enough context in the
//! message (paths, status codes) to be actionable in logs.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; instances are shared behind `Arc`
//! between request handlers and background tasks.

pub mod error;
pub mod http;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{CredentialStore, FilePage, ListQuery, RemoteFile, StorageProvider};

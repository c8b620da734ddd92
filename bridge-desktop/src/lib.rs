//! # Desktop Bridge Implementations
//!
//! Implementations of the bridge traits for a server process running on a
//! regular OS:
//! - `HttpClient` using `reqwest`
//! - `CredentialStore` using one JSON file per key in a directory
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileCredentialStore, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let store = FileCredentialStore::new("./credentials");
//! ```

mod credential_store;
mod http;

pub use credential_store::FileCredentialStore;
pub use http::ReqwestHttpClient;

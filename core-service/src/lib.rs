//! # Core Service
//!
//! HTTP front end of camfeed. Wires the credential manager, the Drive
//! connector and the sampling sessions behind an axum router:
//!
//! - `GET /` liveness
//! - `GET /auth/google/{index}` consent redirect
//! - `GET /google/redirect/{index}` authorization callback
//! - `GET /drive/files/{index}` plain listing
//! - `GET /drive/files/first/{index}` sampled SSE stream

pub mod api;
pub mod error;
pub mod state;

pub use api::server::{build_router, ApiServer};
pub use error::{Result, ServiceError};
pub use state::{AppState, GoogleDriveProviders, StorageProviderFactory};

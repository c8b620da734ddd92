//! Workspace umbrella crate.
//!
//! Re-exports the service crate so hosts embedding camfeed depend on a
//! single package. The `camfeed` binary lives in `core-service`.

pub use core_service::*;

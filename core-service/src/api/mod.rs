//! HTTP API: routes, error mapping and server setup.

pub mod error;
pub mod routes;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, ApiResult};

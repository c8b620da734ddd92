//! # Authentication Module
//!
//! Multi-account OAuth 2.0 credential management.
//!
//! ## Overview
//!
//! A fixed set of provider accounts, each with its own persisted token set.
//! The [`CredentialManager`] loads those sets at startup, exchanges consent
//! codes, renews tokens lazily on use and on a schedule, and persists every
//! renewal before it is used.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with offline access
//! - Per-account handles with single-flight refresh
//! - Renewal observers that persist tokens before they are installed
//! - Hourly background renewal with cooperative cancellation

pub mod error;
pub mod handle;
pub mod manager;
pub mod oauth;
pub mod registry;
pub mod renewal;
pub mod token_store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{AuthError, Result};
pub use handle::{AccessTokenSource, AccountHandle, TokenObserver};
pub use manager::{CredentialManager, RenewalReport};
pub use oauth::{OAuthConfig, OAuthFlowManager};
pub use registry::AccountRegistry;
pub use renewal::spawn_renewal_task;
pub use token_store::TokenStore;
pub use types::{Account, AccountId, OAuthTokens};

//! # Google Drive Provider
//!
//! Implements `StorageProvider` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paginated file listing with a caller-supplied query
//! - Whole-file downloads
//! - Bearer tokens from a per-account [`core_auth::AccessTokenSource`]
//! - Rate limiting and exponential backoff

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{GoogleDriveConnector, LISTING_FIELDS, MAX_PAGE_SIZE, STREAM_FIELDS};
pub use error::{GoogleDriveError, Result};

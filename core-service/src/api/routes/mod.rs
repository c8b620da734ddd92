//! API route handlers.

pub mod auth;
pub mod files;
pub mod health;
pub mod stream;

use std::sync::Arc;

use core_auth::AccountHandle;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Parse the `{index}` path segment; anything but an integer is a 404.
pub(crate) fn parse_index(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::not_found(format!("Account {} does not exist", raw)))
}

/// Resolve the `{index}` path segment to an account handle.
///
/// Anything that is not an integer naming a configured account is a 404;
/// no provider is touched.
pub(crate) fn resolve_account(state: &AppState, raw: &str) -> ApiResult<Arc<AccountHandle>> {
    Ok(state.credentials.lookup(parse_index(raw)?)?)
}

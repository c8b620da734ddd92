//! Consent redirect and authorization callback.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;

use super::parse_index;
use crate::api::error::{ApiError, ApiResult, AUTH_FAILED_MESSAGE};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/google/{index}", get(authorize))
        .route("/google/redirect/{index}", get(callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// Send the browser to the provider's consent page for this account.
async fn authorize(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ApiResult<Redirect> {
    let url = state.credentials.authorization_url(parse_index(&index)?)?;
    Ok(Redirect::to(&url))
}

async fn callback(
    State(state): State<AppState>,
    Path(index): Path<String>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<&'static str> {
    let index = parse_index(&index)?;
    // Unknown accounts are a 404 even when the code is missing.
    state.credentials.lookup(index)?;
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    match state.credentials.exchange_authorization_code(index, &code).await {
        Ok(_) => Ok("Success"),
        Err(_) => Err(ApiError::plain(
            StatusCode::INTERNAL_SERVER_ERROR,
            AUTH_FAILED_MESSAGE,
        )),
    }
}

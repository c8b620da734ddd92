//! Plain single-page listing of an account's files.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bridge_traits::{ListQuery, RemoteFile};
use provider_google_drive::{LISTING_FIELDS, MAX_PAGE_SIZE};
use serde::Serialize;
use tracing::error;

use super::resolve_account;
use crate::api::error::{ApiError, ApiResult, LIST_FAILED_MESSAGE};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/drive/files/{index}", get(list_files))
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
}

impl From<RemoteFile> for FileEntry {
    fn from(file: RemoteFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
        }
    }
}

async fn list_files(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ApiResult<Response> {
    let handle = resolve_account(&state, &index)?;
    let provider = state.providers.for_account(handle.clone());

    let query = ListQuery::new()
        .fields(LISTING_FIELDS)
        .page_size(MAX_PAGE_SIZE);
    let page = provider.list_page(&query).await.map_err(|e| {
        error!(account = %handle.id(), error = %e, "Listing failed");
        ApiError::plain(StatusCode::INTERNAL_SERVER_ERROR, LIST_FAILED_MESSAGE)
    })?;

    if page.files.is_empty() {
        return Ok("No files found.".into_response());
    }

    let entries: Vec<FileEntry> = page.files.into_iter().map(FileEntry::from).collect();
    Ok(Json(entries).into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{photo, FakeDrive, TestApp};
    use axum::http::StatusCode;
    use provider_google_drive::{LISTING_FIELDS, MAX_PAGE_SIZE};

    #[tokio::test]
    async fn test_lists_id_and_name() {
        let drive = FakeDrive::with_files(vec![
            photo("a.jpg", 10),
            photo("b.jpg", 600_000),
        ]);
        let app = TestApp::new(3, drive);

        let (status, _, body) = app.get("/drive/files/2").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": "id-a.jpg", "name": "a.jpg"},
                {"id": "id-b.jpg", "name": "b.jpg"},
            ])
        );
        assert_eq!(app.providers.requested(), vec![2]);

        let queries = app.drive.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].fields.as_deref(), Some(LISTING_FIELDS));
        assert_eq!(queries[0].page_size, Some(MAX_PAGE_SIZE));
        assert_eq!(queries[0].filter, None);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let app = TestApp::new(3, FakeDrive::default());

        let (status, _, body) = app.get("/drive/files/0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "No files found.");
    }

    #[tokio::test]
    async fn test_listing_failure_is_500() {
        let app = TestApp::new(3, FakeDrive::failing());

        let (status, _, body) = app.get("/drive/files/0").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Error fetching files");
    }

    #[tokio::test]
    async fn test_unknown_account_touches_no_provider() {
        let app = TestApp::new(15, FakeDrive::default());

        for uri in ["/drive/files/99", "/drive/files/-1", "/drive/files/abc"] {
            let (status, _, _) = app.get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        }
        assert!(app.providers.requested().is_empty());
        assert!(app.drive.queries().is_empty());
    }
}

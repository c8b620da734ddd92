//! Liveness route.

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(hello))
}

async fn hello() -> &'static str {
    "Hello World!"
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{FakeDrive, TestApp};
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn test_hello() {
        let app = TestApp::new(1, FakeDrive::default());

        let (status, headers, body) = app.get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello World!");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}

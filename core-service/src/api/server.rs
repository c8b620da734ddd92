//! API server setup.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::api::routes::{auth, files, health, stream};
use crate::error::Result;
use crate::state::AppState;

/// All routes with permissive CORS, response compression and request tracing.
///
/// The default compression predicate skips `text/event-stream`, so streamed
/// events are flushed as they are produced.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(files::router())
        .merge(stream::router())
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

pub struct ApiServer {
    addr: SocketAddr,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let cancel_token = state.shutdown.clone();
        Self {
            addr,
            state,
            cancel_token,
        }
    }

    /// Token that stops the server and its open streams when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Serve until the cancel token fires, then drain in-flight requests.
    pub async fn run(&self) -> Result<()> {
        let router = build_router(self.state.clone());
        let listener = TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "Listening");

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("Server shutting down");
            })
            .await?;

        Ok(())
    }
}

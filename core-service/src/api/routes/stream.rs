//! Sampled file stream over server-sent events.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use bridge_traits::ListQuery;
use core_sampler::{
    SelectionConfig, StreamEvent, StreamSession, TimeWindowSelector, STREAM_ERROR_MESSAGE,
};
use futures::Stream;
use provider_google_drive::{MAX_PAGE_SIZE, STREAM_FIELDS};
use serde::Deserialize;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{error, info};

use super::resolve_account;
use crate::api::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/drive/files/first/{index}", get(stream_files))
}

/// Raw request parameters; validation is lenient and happens in
/// [`SelectionConfig::with_request`].
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    pub n: Option<String>,
    pub t: Option<String>,
    pub unit: Option<String>,
}

async fn stream_files(
    State(state): State<AppState>,
    Path(index): Path<String>,
    Query(params): Query<StreamParams>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let handle = resolve_account(&state, &index)?;
    let provider = state.providers.for_account(handle.clone());

    let config = SelectionConfig::from_defaults(&state.stream).with_request(
        params.n.as_deref(),
        params.t.as_deref(),
        params.unit.as_deref(),
    );
    info!(
        account = %handle.id(),
        max_files = config.max_files,
        min_gap_secs = config.min_gap.num_seconds(),
        "Starting file stream"
    );

    let query = ListQuery::new()
        .filter(state.stream.query.clone())
        .fields(STREAM_FIELDS)
        .page_size(MAX_PAGE_SIZE);
    let session = StreamSession::new(provider, query, TimeWindowSelector::new(config))
        .with_shutdown(state.shutdown.child_token());

    // The session task ends once the response body is dropped or the server
    // shuts down.
    let (events, _task) = session.start();
    let stream = ReceiverStream::new(events).map(|event| Ok(to_sse(&event)));

    Ok(Sse::new(stream))
}

fn to_sse(event: &StreamEvent) -> Event {
    let mut sse = Event::default();
    if let Some(name) = event.event_name() {
        sse = sse.event(name);
    }
    match event.data_json() {
        Ok(data) => sse.data(data),
        Err(e) => {
            error!(error = %e, "Failed to serialize stream event");
            Event::default()
                .event("error")
                .data(format!(r#"{{"message":"{}"}}"#, STREAM_ERROR_MESSAGE))
        }
    }
}

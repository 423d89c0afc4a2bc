use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use attendance_core::Credential;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use events::{SequencedMessage, WireMessage};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScrapeQuery {
    /// Registration number; also used as the password
    pub query: Option<String>,
}

/// No `event:` name is set so `EventSource.onmessage` sees every record.
pub(crate) fn to_sse_event(message: &SequencedMessage) -> Result<Event, Infallible> {
    Ok(Event::default()
        .id(message.seq.to_string())
        .data(message.message.to_json()))
}

#[utoipa::path(
    get,
    path = "/api/scrape",
    params(ScrapeQuery),
    responses(
        (status = 200, description = "SSE stream of progress records ending in one result or fault", body = WireMessage, content_type = "text/event-stream"),
        (status = 400, description = "Missing or empty query", body = ErrorResponse),
    ),
    tag = "scrape"
)]
pub async fn scrape_stream(
    State(state): State<AppState>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let credential = Credential::parse(query.query.unwrap_or_default())?;

    tracing::info!(username = %credential, "Scrape requested");
    let receiver = orchestrator::spawn_attempt(Arc::clone(&state.orchestrator), credential);
    let stream = receiver.into_stream().map(|message| to_sse_event(&message));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}

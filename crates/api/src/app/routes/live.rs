//! Live stock feed endpoint.
//!
//! Bridges one HTTP connection to one broadcast-hub listener via
//! Server-Sent Events.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Extension,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
};
use tokio_stream::StreamExt;

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/live", get(stream_stock))
}

/// GET /live
///
/// One `stock` event per committed mutation, carrying the full item
/// snapshot as JSON. The connection has no natural end; when the client
/// goes away the stream is dropped, which drops the listener, which
/// removes it from the hub's active set exactly once.
pub async fn stream_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, axum::Error>>> {
    let listener = services.hub().subscribe();
    tracing::info!(
        listener_id = %listener.id(),
        total = services.hub().listener_count(),
        "live feed client connected"
    );

    let stream = listener.map(|item| SseEvent::default().event("stock").json_data(&item));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use tokio_stream::wrappers::{IntervalStream, WatchStream};
use tokio_stream::StreamExt;

use crate::state::AppState;

// GET /api/events — SSE stream of screen snapshots
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    // Yields the current snapshot first, then one per change
    let snapshots = WatchStream::new(state.screen.subscribe()).map(|snapshot| {
        let data = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("screen"))
    });

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Sse::new(snapshots.merge(keepalive))
}

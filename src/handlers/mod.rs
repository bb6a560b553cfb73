pub mod events;
pub mod health;
pub mod screen;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/screen", get(screen::render_screen))
        .route("/api/screen", get(screen::get_screen))
        .route("/api/services", get(screen::get_services))
        .route(
            "/api/services/:id/select",
            post(screen::select_service),
        )
        .route("/api/form/close", post(screen::close_form))
        .route(
            "/api/bookings",
            get(screen::get_bookings).post(screen::submit_booking),
        )
        .route("/api/bookings/refresh", post(screen::refresh_bookings))
        .route("/api/bookings/:id/status", post(screen::respond))
        .route("/api/bookings/:id/cancel", post(screen::cancel))
        .route("/api/alert/dismiss", post(screen::dismiss_alert))
        .route("/api/events", get(events::events_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

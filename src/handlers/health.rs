use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::config::BackendKind;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let backend = match state.config.backend {
        BackendKind::Sqlite => "sqlite",
        BackendKind::Rest => "rest",
    };
    Json(serde_json::json!({
        "status": "ok",
        "backend": backend,
        "booking_limit": state.config.booking_limit,
    }))
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingForm, BookingStatus, BookingViewModel, ServiceWithProvider};
use crate::screen::ScreenState;
use crate::state::AppState;
use crate::view;

// GET /screen
pub async fn render_screen(State(state): State<Arc<AppState>>) -> String {
    view::render(&state.screen.snapshot())
}

// GET /api/screen
pub async fn get_screen(State(state): State<Arc<AppState>>) -> Json<ScreenState> {
    Json(state.screen.snapshot())
}

// GET /api/services
pub async fn get_services(State(state): State<Arc<AppState>>) -> Json<Vec<ServiceWithProvider>> {
    Json(state.screen.snapshot().services)
}

// GET /api/bookings
pub async fn get_bookings(State(state): State<Arc<AppState>>) -> Json<Vec<BookingViewModel>> {
    Json(state.screen.snapshot().bookings)
}

// POST /api/bookings/refresh
pub async fn refresh_bookings(State(state): State<Arc<AppState>>) -> Json<Vec<BookingViewModel>> {
    state.screen.refresh().await;
    Json(state.screen.snapshot().bookings)
}

// POST /api/services/:id/select
pub async fn select_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let known = state
        .screen
        .snapshot()
        .services
        .iter()
        .any(|s| s.service.id == id);
    if !known {
        return Err(AppError::NotFound(format!("service {id}")));
    }

    state.screen.select_service(&id);
    Ok(Json(serde_json::json!({"ok": true, "selected_service": id})))
}

// POST /api/form/close
pub async fn close_form(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.screen.close_form();
    Json(serde_json::json!({"ok": true}))
}

// POST /api/bookings
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.screen.submit_booking(form).await?;
    Ok(Json(booking))
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct RespondRequest {
    pub status: BookingStatus,
}

pub async fn respond(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !body.status.is_practitioner_outcome() {
        return Err(AppError::BadRequest(format!(
            "status must be confirmed or declined, got {}",
            body.status.as_str()
        )));
    }

    state.screen.respond(&id, body.status).await?;
    Ok(Json(serde_json::json!({"ok": true, "status": body.status})))
}

// POST /api/bookings/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.screen.cancel(&id).await?;
    Ok(Json(serde_json::json!({"ok": true, "status": BookingStatus::Cancelled})))
}

// POST /api/alert/dismiss
pub async fn dismiss_alert(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.screen.dismiss_alert();
    Json(serde_json::json!({"ok": true}))
}

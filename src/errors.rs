use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::backend::BackendError;
use crate::services::mutations::MutationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl From<MutationError> for AppError {
    fn from(e: MutationError) -> Self {
        match e {
            MutationError::NotSignedIn => AppError::Unauthorized,
            MutationError::NoServiceSelected | MutationError::MissingDate => {
                AppError::BadRequest(e.to_string())
            }
            MutationError::Backend(BackendError::NotFound(what)) => AppError::NotFound(what),
            MutationError::Backend(inner) => AppError::Backend(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Backend(BackendError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

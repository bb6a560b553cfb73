use std::env;

use crate::errors::AppError;
use crate::models::Role;
use crate::services::bookings::DEFAULT_BOOKING_LIMIT;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Rest,
}

/// How the screen learns whether the viewer is a client or a practitioner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleSource {
    Fixed(Role),
    Stored,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub backend: BackendKind,
    pub database_url: String,
    pub backend_url: String,
    pub backend_api_key: String,
    pub access_token: Option<String>,
    pub session_user_id: Option<String>,
    pub role: RoleSource,
    pub booking_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            backend: match env::var("BACKEND").as_deref() {
                Ok("rest") => BackendKind::Rest,
                _ => BackendKind::Sqlite,
            },
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "servicebook.db".to_string()),
            backend_url: env::var("BACKEND_URL").unwrap_or_default(),
            backend_api_key: env::var("BACKEND_API_KEY").unwrap_or_default(),
            access_token: env::var("ACCESS_TOKEN").ok().filter(|v| !v.is_empty()),
            session_user_id: env::var("SESSION_USER_ID").ok().filter(|v| !v.is_empty()),
            role: env::var("ROLE")
                .map(|v| parse_role_source(&v))
                .unwrap_or(RoleSource::Stored),
            booking_limit: env::var("BOOKING_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_BOOKING_LIMIT),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.backend == BackendKind::Rest && self.backend_url.is_empty() {
            return Err(AppError::Config(
                "BACKEND_URL must be set when BACKEND=rest".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_role_source(s: &str) -> RoleSource {
    match s.trim().to_ascii_lowercase().as_str() {
        "stored" | "" => RoleSource::Stored,
        other => RoleSource::Fixed(Role::parse(other)),
    }
}

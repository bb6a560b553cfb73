use serde::{Deserialize, Serialize};

use super::booking::BookingStatus;

pub const UNKNOWN_SERVICE: &str = "Unknown Service";
pub const UNKNOWN_PRACTITIONER: &str = "Unknown Practitioner";

/// Flat, display-ready booking derived from a [`super::BookingRow`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingViewModel {
    pub id: String,
    pub date: String,
    pub time: String,
    pub special_request: String,
    pub status: BookingStatus,
    pub service_title: String,
    pub practitioner_name: String,
}

/// A blocking, user-visible alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::user::UserName;

/// A booking row as stored in the `bookings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    pub client_id: String,
    pub booking_date: String,
    #[serde(default)]
    pub special_request: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A booking row fetched with `services(title, users(name))` embedded.
/// Either relation may come back null.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRow {
    pub id: String,
    pub booking_date: String,
    #[serde(default)]
    pub special_request: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub services: Option<ServiceRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceRef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub users: Option<UserName>,
}

/// Insert payload for a new booking request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBooking {
    pub service_id: String,
    pub client_id: String,
    pub booking_date: String,
    pub special_request: String,
    pub status: BookingStatus,
}

/// What the inline request form hands back on submit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingForm {
    pub booking_date: String,
    #[serde(default)]
    pub special_request: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "declined" => Some(BookingStatus::Declined),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Outcomes a practitioner may set on a pending request.
    pub fn is_practitioner_outcome(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Declined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(BookingStatus::parse("pending"), Some(BookingStatus::Pending));
        assert_eq!(BookingStatus::parse("cancelled"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("CANCELLED"), None);
        assert_eq!(BookingStatus::parse(""), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(BookingStatus::Declined).unwrap();
        assert_eq!(json, "declined");
    }

    #[test]
    fn test_booking_row_tolerates_null_relations() {
        let row: BookingRow = serde_json::from_value(serde_json::json!({
            "id": "bk-1",
            "booking_date": "2024-06-01",
            "special_request": null,
            "status": "pending",
            "services": { "title": "Massage", "users": null }
        }))
        .unwrap();
        assert!(row.special_request.is_none());
        let service = row.services.unwrap();
        assert_eq!(service.title.as_deref(), Some("Massage"));
        assert!(service.users.is_none());
    }
}

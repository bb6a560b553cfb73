use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{BookingRow, BookingViewModel, UNKNOWN_PRACTITIONER, UNKNOWN_SERVICE};

pub const DATE_FORMAT: &str = "%m/%d/%Y";
pub const TIME_FORMAT: &str = "%I:%M %p";
pub const INVALID_DATE: &str = "Invalid Date";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a stored booking date. Offsets are kept as written rather than
/// shifted into any local zone; a bare date means midnight.
pub fn parse_booking_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Splits a stored date into display date and time strings.
pub fn split_date_time(raw: &str) -> (String, String) {
    match parse_booking_date(raw) {
        Some(dt) => (
            dt.format(DATE_FORMAT).to_string(),
            dt.format(TIME_FORMAT).to_string(),
        ),
        None => {
            tracing::warn!(booking_date = raw, "unparseable booking date");
            (INVALID_DATE.to_string(), String::new())
        }
    }
}

pub fn format_booking(row: &BookingRow) -> BookingViewModel {
    let (date, time) = split_date_time(&row.booking_date);
    let service = row.services.as_ref();

    BookingViewModel {
        id: row.id.clone(),
        date,
        time,
        special_request: row.special_request.clone().unwrap_or_default(),
        status: row.status,
        service_title: service
            .and_then(|s| s.title.clone())
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
        practitioner_name: service
            .and_then(|s| s.users.as_ref())
            .and_then(|u| u.name.clone())
            .unwrap_or_else(|| UNKNOWN_PRACTITIONER.to_string()),
    }
}

pub fn format_bookings(rows: &[BookingRow]) -> Vec<BookingViewModel> {
    rows.iter().map(format_booking).collect()
}

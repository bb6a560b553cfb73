use serde_json::Value;

use crate::backend::{BackendError, DataService, Table};
use crate::models::{Booking, BookingForm, BookingStatus, BookingViewModel, NewBooking};

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("you must be logged in to make a booking")]
    NotSignedIn,

    #[error("no service selected")]
    NoServiceSelected,

    #[error("booking_date is required")]
    MissingDate,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub fn new_booking(client_id: &str, service_id: &str, form: &BookingForm) -> NewBooking {
    NewBooking {
        service_id: service_id.to_string(),
        client_id: client_id.to_string(),
        booking_date: form.booking_date.clone(),
        special_request: form.special_request.clone(),
        status: BookingStatus::Pending,
    }
}

/// Inserts a pending booking request for `service_id`. Nothing is written
/// without a signed-in user.
pub async fn create_booking(
    data: &dyn DataService,
    user_id: Option<&str>,
    service_id: &str,
    form: &BookingForm,
) -> Result<Booking, MutationError> {
    let user_id = user_id.ok_or(MutationError::NotSignedIn)?;

    let payload = serde_json::to_value(new_booking(user_id, service_id, form))
        .map_err(BackendError::from)?;
    let inserted = data.insert(Table::Bookings, payload).await?;
    let booking: Booking = serde_json::from_value(inserted).map_err(BackendError::from)?;

    tracing::info!(booking_id = %booking.id, service_id, user_id, "booking requested");
    Ok(booking)
}

pub async fn update_booking_status(
    data: &dyn DataService,
    id: &str,
    status: BookingStatus,
) -> Result<(), MutationError> {
    let patch = serde_json::json!({ "status": status.as_str() });
    data.update(Table::Bookings, id, patch).await?;
    tracing::info!(booking_id = id, status = status.as_str(), "booking status updated");
    Ok(())
}

pub async fn cancel_booking(data: &dyn DataService, id: &str) -> Result<(), MutationError> {
    update_booking_status(data, id, BookingStatus::Cancelled).await
}

/// Sets the status of the matching entry only. Returns false if `id` is not
/// in the list.
pub fn patch_status(bookings: &mut [BookingViewModel], id: &str, status: BookingStatus) -> bool {
    match bookings.iter_mut().find(|b| b.id == id) {
        Some(booking) => {
            booking.status = status;
            true
        }
        None => false,
    }
}

/// Pulls the row id out of a change event record, if it has one.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(id: &str) -> BookingViewModel {
        BookingViewModel {
            id: id.to_string(),
            date: "06/01/2024".into(),
            time: "10:00 AM".into(),
            special_request: String::new(),
            status: BookingStatus::Pending,
            service_title: "Deep Tissue".into(),
            practitioner_name: "Alice".into(),
        }
    }

    #[test]
    fn test_new_booking_is_pending() {
        let form = BookingForm {
            booking_date: "2024-06-01".into(),
            special_request: "first visit".into(),
        };
        let payload = serde_json::to_value(new_booking("u-carol", "s1", &form)).unwrap();
        assert_eq!(payload["status"], "pending");
        assert_eq!(payload["service_id"], "s1");
        assert_eq!(payload["client_id"], "u-carol");
        assert_eq!(payload["booking_date"], "2024-06-01");
        assert_eq!(payload["special_request"], "first visit");
    }

    #[test]
    fn test_patch_status_touches_one_entry() {
        let mut list = vec![vm("a"), vm("b"), vm("c")];
        let before = list.clone();

        assert!(patch_status(&mut list, "b", BookingStatus::Confirmed));
        assert_eq!(list[1].status, BookingStatus::Confirmed);
        assert_eq!(list[0], before[0]);
        assert_eq!(list[2], before[2]);
        assert_eq!(list[1].date, before[1].date);

        assert!(!patch_status(&mut list, "zzz", BookingStatus::Cancelled));
    }
}

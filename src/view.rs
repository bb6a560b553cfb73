use std::fmt::Write;

use crate::models::{BookingStatus, BookingViewModel, Role, ServiceWithProvider};
use crate::screen::ScreenState;

pub const LOADING_TEXT: &str = "Loading services...";

/// Actions the booking list offers for one entry.
pub fn booking_actions(role: Role, status: BookingStatus) -> &'static [&'static str] {
    match (role, status) {
        (Role::Practitioner, BookingStatus::Pending) => &["Confirm", "Decline"],
        (Role::Client, BookingStatus::Pending | BookingStatus::Confirmed) => &["Cancel"],
        _ => &[],
    }
}

/// Plain-text rendering of the whole screen.
pub fn render(state: &ScreenState) -> String {
    if state.loading {
        return LOADING_TEXT.to_string();
    }

    let mut out = String::new();

    if let Some(alert) = &state.alert {
        let _ = writeln!(out, "!! {}: {}", alert.title, alert.message);
        out.push('\n');
    }

    out.push_str("Available Services\n");
    if state.services.is_empty() {
        out.push_str("  No services available.\n");
    }
    for service in &state.services {
        let open = state.selected_service.as_deref() == Some(service.service.id.as_str());
        render_service(&mut out, service, open);
    }

    out.push_str("\nYour Bookings\n");
    if state.bookings.is_empty() {
        out.push_str("  No bookings yet.\n");
    }
    for booking in &state.bookings {
        render_booking(&mut out, booking, state.role);
    }

    out
}

fn render_service(out: &mut String, entry: &ServiceWithProvider, form_open: bool) {
    let service = &entry.service;
    let _ = writeln!(out, "- {}", service.title);
    if let Some(description) = service.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  {description}");
    }
    if !service.specialties.is_empty() {
        let _ = writeln!(out, "  Specialties: {}", service.specialties.join(", "));
    }
    let _ = writeln!(out, "  Price: ${:.2}", service.price);
    let _ = writeln!(out, "  Provider: {}", entry.provider_name());
    if form_open {
        out.push_str("  [Booking request form open: date, special request | Submit | Cancel]\n");
    } else {
        out.push_str("  [Request Booking]\n");
    }
}

fn render_booking(out: &mut String, booking: &BookingViewModel, role: Role) {
    let _ = writeln!(
        out,
        "- {} with {} on {} at {} [{}]",
        booking.service_title,
        booking.practitioner_name,
        booking.date,
        booking.time,
        booking.status.as_str()
    );
    if !booking.special_request.is_empty() {
        let _ = writeln!(out, "  Note: {}", booking.special_request);
    }
    let actions = booking_actions(role, booking.status);
    if !actions.is_empty() {
        let _ = writeln!(out, "  Actions: {}", actions.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alert, Service, UserName};

    fn alice_service() -> ServiceWithProvider {
        ServiceWithProvider {
            service: Service {
                id: "s1".into(),
                title: "Deep Tissue".into(),
                description: Some("Sixty minutes".into()),
                specialties: vec!["back".into(), "sports".into()],
                price: 80.0,
                user_id: "u-alice".into(),
            },
            users: Some(UserName {
                name: Some("Alice".into()),
            }),
        }
    }

    fn pending_booking() -> BookingViewModel {
        BookingViewModel {
            id: "bk-1".into(),
            date: "06/01/2024".into(),
            time: "10:00 AM".into(),
            special_request: "first visit".into(),
            status: BookingStatus::Pending,
            service_title: "Deep Tissue".into(),
            practitioner_name: "Alice".into(),
        }
    }

    #[test]
    fn test_loading() {
        let state = ScreenState {
            loading: true,
            ..Default::default()
        };
        assert_eq!(render(&state), LOADING_TEXT);
    }

    #[test]
    fn test_provider_name_shown() {
        let state = ScreenState {
            services: vec![alice_service()],
            ..Default::default()
        };
        let text = render(&state);
        assert!(text.contains("Provider: Alice"));
        assert!(text.contains("Price: $80.00"));
        assert!(text.contains("Specialties: back, sports"));
        assert!(text.contains("[Request Booking]"));
    }

    #[test]
    fn test_selected_service_shows_form() {
        let state = ScreenState {
            services: vec![alice_service()],
            selected_service: Some("s1".into()),
            ..Default::default()
        };
        assert!(render(&state).contains("Booking request form open"));
    }

    #[test]
    fn test_role_actions() {
        let mut state = ScreenState {
            bookings: vec![pending_booking()],
            role: Role::Practitioner,
            ..Default::default()
        };
        assert!(render(&state).contains("Actions: Confirm | Decline"));

        state.role = Role::Client;
        let text = render(&state);
        assert!(text.contains("Actions: Cancel"));
        assert!(text.contains("Note: first visit"));

        state.role = Role::Unknown;
        assert!(!render(&state).contains("Actions:"));
    }

    #[test]
    fn test_alert_banner() {
        let state = ScreenState {
            alert: Some(Alert::new("Not Logged In", "You must be logged in to make a booking.")),
            ..Default::default()
        };
        assert!(render(&state).starts_with("!! Not Logged In:"));
    }
}

pub mod booking;
pub mod role;
pub mod service;
pub mod user;
pub mod view;

pub use booking::{Booking, BookingForm, BookingRow, BookingStatus, NewBooking, ServiceRef};
pub use role::Role;
pub use service::{Service, ServiceWithProvider};
pub use user::{Session, User, UserName};
pub use view::{Alert, BookingViewModel, UNKNOWN_PRACTITIONER, UNKNOWN_SERVICE};

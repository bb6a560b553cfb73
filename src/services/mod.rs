pub mod bookings;
pub mod catalog;
pub mod formatter;
pub mod listener;
pub mod mutations;
pub mod role;
pub mod session;

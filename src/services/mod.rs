pub mod bookings;
pub mod catalog;
pub mod phone;
pub mod seed;

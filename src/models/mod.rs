pub mod booking;
pub mod geo;
pub mod listing;

pub use booking::{Booking, BookingRequest, NewBooking};
pub use geo::{GeoBounds, GeoPoint, EARTH_RADIUS_KM};
pub use listing::{Category, CategoryFilter, Listing, ListingKind, ListingRequest, NewListing};

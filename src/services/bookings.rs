use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingRequest};
use crate::services::phone::PhoneVerdict;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Validates, verifies and stores a booking. All field failures are reported
/// together. The external phone check only runs once the payload is otherwise
/// valid and never blocks when it cannot give an answer.
pub async fn submit_booking(state: &AppState, request: BookingRequest) -> Result<Booking, AppError> {
    let mut errors = FieldErrors::new();

    if let Some(listing_id) = request.listing_id() {
        let exists = {
            let db = state.db()?;
            queries::listing_exists(&db, listing_id)?
        };
        if !exists {
            errors.add("listingId", format!("No listing with id '{listing_id}'"));
        }
    }

    let new_booking = match request.validate_into() {
        Ok(booking) => booking,
        Err(field_errors) => {
            errors.merge(field_errors);
            return Err(AppError::Validation(errors));
        }
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if let Some(phone) = &new_booking.phone {
        match state.phone_verifier.validate(phone).await {
            PhoneVerdict::Invalid => {
                tracing::info!(phone = %phone, "phone rejected by verifier");
                errors.add("phone", "Invalid phone number (checked via NumVerify)");
                return Err(AppError::Validation(errors));
            }
            PhoneVerdict::Valid => {}
            PhoneVerdict::Unknown => {
                tracing::debug!(phone = %phone, "phone not verified, allowing");
            }
        }
    }

    let booking = Booking::from_new(new_booking);
    {
        let db = state.db()?;
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(
        id = %booking.id,
        listing_id = ?booking.listing_id,
        guests = booking.guests,
        "booking created"
    );

    Ok(booking)
}

pub fn list_bookings(state: &AppState) -> Result<Vec<Booking>, AppError> {
    let db = state.db()?;
    Ok(queries::list_bookings(&db)?)
}

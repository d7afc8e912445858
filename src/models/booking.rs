use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

use crate::validation::{error_with_message, is_plausible_phone, non_blank, FieldErrors, Lenient};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub listing_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guests: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_new(new: NewBooking) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: new.listing_id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            guests: new.guests,
            notes: new.notes,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub listing_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guests: i64,
    pub notes: Option<String>,
}

/// Body of `POST /api/bookings`, also validated by the client before sending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub listing_id: Option<String>,
    #[validate(
        required(message = "Please add a name"),
        custom(function = "name_present")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "Please add an email"),
        custom(function = "email_format")
    )]
    pub email: Option<String>,
    #[validate(custom(function = "phone_format"))]
    pub phone: Option<String>,
    pub guests: Option<Lenient<i64>>,
    pub notes: Option<String>,
}

fn name_present(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(error_with_message("required", "Please add a name"));
    }
    Ok(())
}

fn email_format(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(error_with_message("required", "Please add an email"));
    }
    // The domain needs at least one dot with text on both sides.
    let dotted_domain = email.rsplit_once('@').is_some_and(|(_, domain)| {
        domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
    });
    if dotted_domain && email.validate_email() {
        return Ok(());
    }
    Err(error_with_message("email", "Please add a valid email"))
}

fn phone_format(phone: &str) -> Result<(), ValidationError> {
    // An empty phone field means "not given".
    if phone.trim().is_empty() || is_plausible_phone(phone) {
        return Ok(());
    }
    Err(error_with_message("phone", "Please enter a valid phone number"))
}

impl BookingRequest {
    pub fn listing_id(&self) -> Option<&str> {
        self.listing_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Checks every field and returns the normalized booking, or all failures.
    pub fn validate_into(self) -> Result<NewBooking, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        let guests = match self.guests.as_ref().map(|g| g.whole()) {
            None => {
                errors.add("guests", "Please add the number of guests");
                0
            }
            Some(None) => {
                errors.add("guests", "Guests must be a whole number");
                0
            }
            Some(Some(n)) if n < 1 => {
                errors.add("guests", "At least one guest is required");
                0
            }
            Some(Some(n)) => n,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewBooking {
            listing_id: non_blank(self.listing_id),
            name: self.name.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone: non_blank(self.phone),
            guests,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

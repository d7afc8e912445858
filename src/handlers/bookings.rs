use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Booking, BookingRequest};
use crate::services::bookings;
use crate::state::AppState;

use super::check_auth;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(request) = payload?;
    let booking = bookings::submit_booking(&state, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(bookings::list_bookings(&state)?))
}

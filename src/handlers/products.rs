use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Listing, ListingRequest};
use crate::services::catalog::{self, CatalogParams, CatalogQuery};
use crate::state::AppState;

use super::check_auth;

// GET /api/products?category=&lat=&lng=&dist=
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let query = CatalogQuery::from_params(&params)?;

    let listings = {
        let db = state.db()?;
        catalog::search(&db, &query)?
    };

    Ok(Json(listings))
}

// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, AppError> {
    let listing = {
        let db = state.db()?;
        catalog::get_listing(&db, &id)?
    };

    listing
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product".to_string()))
}

// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(request) = payload?;

    let listing = Listing::from_new(request.validate_into()?);
    {
        let db = state.db()?;
        queries::create_listing(&db, &listing)?;
    }

    tracing::info!(id = %listing.id, title = %listing.title, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

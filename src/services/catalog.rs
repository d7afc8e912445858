use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::models::{CategoryFilter, GeoBounds, GeoPoint, Listing};
use crate::validation::FieldErrors;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Raw query string of `GET /api/products`. Kept as text so malformed values
/// can be reported per parameter instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub dist: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub center: GeoPoint,
    pub radius_km: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub near: Option<Proximity>,
}

impl CatalogQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn near(mut self, center: GeoPoint, radius_km: f64) -> Self {
        self.near = Some(Proximity { center, radius_km });
        self
    }

    pub fn from_params(params: &CatalogParams) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let category = match present(&params.category) {
            None => CategoryFilter::All,
            Some(raw) => CategoryFilter::parse(raw).unwrap_or_else(|| {
                errors.add(
                    "category",
                    format!("Unknown category '{raw}', expected all, food, lifestyle or education"),
                );
                CategoryFilter::All
            }),
        };

        let lat = parse_number(&mut errors, "lat", &params.lat, |v| {
            (-90.0..=90.0).contains(&v).then_some(v).ok_or("lat must be between -90 and 90")
        });
        let lng = parse_number(&mut errors, "lng", &params.lng, |v| {
            (-180.0..=180.0).contains(&v).then_some(v).ok_or("lng must be between -180 and 180")
        });
        let dist = parse_number(&mut errors, "dist", &params.dist, |v| {
            (v > 0.0).then_some(v).ok_or("dist must be greater than 0")
        });

        let near = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Proximity {
                center: GeoPoint::new(lat, lng),
                radius_km: dist.unwrap_or(DEFAULT_RADIUS_KM),
            }),
            (Some(_), None) if !errors.contains("lng") => {
                errors.add("lng", "lng is required when lat is given");
                None
            }
            (None, Some(_)) if !errors.contains("lat") => {
                errors.add("lat", "lat is required when lng is given");
                None
            }
            _ => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { category, near })
    }

    /// Query-string form understood by `from_params`.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![];
        if let CategoryFilter::Only(category) = self.category {
            params.push(("category", category.as_str().to_string()));
        }
        if let Some(near) = &self.near {
            params.push(("lat", near.center.lat.to_string()));
            params.push(("lng", near.center.lng.to_string()));
            params.push(("dist", near.radius_km.to_string()));
        }
        params
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(
    errors: &mut FieldErrors,
    field: &str,
    raw: &Option<String>,
    check: impl Fn(f64) -> Result<f64, &'static str>,
) -> Option<f64> {
    let raw = present(raw)?;
    let value = match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            errors.add(field, format!("{field} must be a number, got '{raw}'"));
            return None;
        }
    };
    match check(value) {
        Ok(v) => Some(v),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Runs a catalog query. Without a proximity filter listings come back in
/// insertion order; with one, only geo-tagged listings within the radius are
/// returned, nearest first.
pub fn search(conn: &Connection, query: &CatalogQuery) -> anyhow::Result<Vec<Listing>> {
    let category = query.category.category();

    let Some(near) = query.near else {
        return queries::list_listings(conn, category, None);
    };

    let bounds = GeoBounds::around(near.center, near.radius_km);
    let candidates = queries::list_listings(conn, category, Some(&bounds))?;

    let mut hits: Vec<(f64, Listing)> = candidates
        .into_iter()
        .filter_map(|listing| {
            let distance = listing.geometry?.distance_km(&near.center);
            (distance <= near.radius_km).then_some((distance, listing))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    tracing::debug!(
        lat = near.center.lat,
        lng = near.center.lng,
        radius_km = near.radius_km,
        hits = hits.len(),
        "proximity search"
    );

    Ok(hits.into_iter().map(|(_, listing)| listing).collect())
}

pub fn get_listing(conn: &Connection, id: &str) -> anyhow::Result<Option<Listing>> {
    queries::get_listing(conn, id)
}

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG) in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

// Widens SQL bounding boxes so rounding never drops a point the exact check keeps.
const BOUNDS_SLACK_DEG: f64 = 1e-6;

/// A WGS84 coordinate. Serialized as a GeoJSON point, `[lng, lat]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonPoint", try_from = "GeoJsonPoint")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

#[derive(Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [point.lng, point.lat],
        }
    }
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = String;

    fn try_from(value: GeoJsonPoint) -> Result<Self, Self::Error> {
        if value.kind != "Point" {
            return Err(format!("unsupported geometry type: {}", value.kind));
        }
        let [lng, lat] = value.coordinates;
        Ok(GeoPoint { lat, lng })
    }
}

/// Latitude/longitude box enclosing every point within a radius of a centre.
/// Used as a cheap indexed prefilter before the exact distance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    /// `None` when the circle touches a pole or crosses the antimeridian.
    pub lng_range: Option<(f64, f64)>,
}

impl GeoBounds {
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let lat = center.lat.to_radians();
        let lng = center.lng.to_radians();

        let min_lat = lat - angular;
        let max_lat = lat + angular;

        if min_lat > -FRAC_PI_2 && max_lat < FRAC_PI_2 {
            let delta_lng = (angular.sin() / lat.cos()).asin();
            let min_lng = lng - delta_lng;
            let max_lng = lng + delta_lng;
            let lng_range = if min_lng < -std::f64::consts::PI || max_lng > std::f64::consts::PI {
                None
            } else {
                Some((
                    min_lng.to_degrees() - BOUNDS_SLACK_DEG,
                    max_lng.to_degrees() + BOUNDS_SLACK_DEG,
                ))
            };
            Self {
                min_lat: min_lat.to_degrees() - BOUNDS_SLACK_DEG,
                max_lat: max_lat.to_degrees() + BOUNDS_SLACK_DEG,
                lng_range,
            }
        } else {
            Self {
                min_lat: min_lat.to_degrees().max(-90.0),
                max_lat: max_lat.to_degrees().min(90.0),
                lng_range: None,
            }
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        let lat_ok = point.lat >= self.min_lat && point.lat <= self.max_lat;
        let lng_ok = match self.lng_range {
            Some((min, max)) => point.lng >= min && point.lng <= max,
            None => true,
        };
        lat_ok && lng_ok
    }
}

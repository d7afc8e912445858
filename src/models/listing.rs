use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::geo::GeoPoint;
use crate::validation::{error_with_message, non_blank, FieldErrors, Lenient};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Lifestyle,
    Education,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Food, Category::Lifestyle, Category::Education];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Lifestyle => "lifestyle",
            Category::Education => "education",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "food" => Some(Category::Food),
            "lifestyle" => Some(Category::Lifestyle),
            "education" => Some(Category::Education),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category selection for catalog views. `All` is the unfiltered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(CategoryFilter::All),
            other => Category::parse(other).map(CategoryFilter::Only),
        }
    }

    /// Reads a `?category=` URL value. Missing, blank or unknown values give `None`.
    pub fn from_query(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim).filter(|v| !v.is_empty()).and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(*category),
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => listing.category == Some(*category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Product,
    Workshop,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Product => "product",
            ListingKind::Workshop => "workshop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(ListingKind::Product),
            "workshop" => Some(ListingKind::Workshop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub in_stock: bool,
    pub date: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub geometry: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_new(new: NewListing) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            long_description: new.long_description,
            price: new.price,
            image: new.image,
            category: new.category,
            kind: new.kind,
            in_stock: new.in_stock,
            date: new.date,
            location: new.location,
            duration: new.duration,
            geometry: new.geometry,
            // Stored with microsecond precision; truncate so the echo matches the row.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// A listing that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub kind: ListingKind,
    pub in_stock: bool,
    pub date: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub geometry: Option<GeoPoint>,
}

/// Body of `POST /api/products`. Everything is optional at the wire level so
/// that a missing field shows up as a field error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    #[validate(
        required(message = "Please add a title"),
        custom(function = "title_present")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: Option<Lenient<f64>>,
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub in_stock: Option<bool>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: Option<f64>,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub lng: Option<f64>,
}

fn title_present(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(error_with_message("required", "Please add a title"));
    }
    Ok(())
}

impl ListingRequest {
    /// Checks every field and returns the normalized listing, or all failures.
    pub fn validate_into(self) -> Result<NewListing, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        let price = match self.price.as_ref().map(|p| p.number()) {
            None => {
                errors.add("price", "Please add a price");
                0.0
            }
            Some(None) => {
                errors.add("price", "Price must be a number");
                0.0
            }
            Some(Some(p)) if p < 0.0 => {
                errors.add("price", "Price must not be negative");
                0.0
            }
            Some(Some(p)) => p,
        };

        let category = match non_blank(self.category) {
            None => None,
            Some(raw) => match Category::parse(&raw) {
                Some(category) => Some(category),
                None => {
                    errors.add(
                        "category",
                        format!("Unknown category '{raw}', expected food, lifestyle or education"),
                    );
                    None
                }
            },
        };

        let kind = match non_blank(self.kind) {
            None => ListingKind::default(),
            Some(raw) => ListingKind::parse(&raw).unwrap_or_else(|| {
                errors.add("type", format!("Unknown type '{raw}', expected product or workshop"));
                ListingKind::default()
            }),
        };

        let geometry = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            (None, None) => None,
            (Some(_), None) => {
                errors.add("lng", "Longitude is required when latitude is given");
                None
            }
            (None, Some(_)) => {
                errors.add("lat", "Latitude is required when longitude is given");
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewListing {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: non_blank(self.description),
            long_description: non_blank(self.long_description),
            price,
            image: non_blank(self.image),
            category,
            kind,
            in_stock: self.in_stock.unwrap_or(true),
            date: non_blank(self.date),
            location: non_blank(self.location),
            duration: non_blank(self.duration),
            geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn veg_box() -> ListingRequest {
        ListingRequest {
            title: Some("Organic Vegetable Box".to_string()),
            price: Some(Lenient::Value(35.0)),
            category: Some("food".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_listing_defaults() {
        let listing = veg_box().validate_into().unwrap();
        assert_eq!(listing.title, "Organic Vegetable Box");
        assert_eq!(listing.price, 35.0);
        assert_eq!(listing.category, Some(Category::Food));
        assert_eq!(listing.kind, ListingKind::Product);
        assert!(listing.in_stock);
        assert_eq!(listing.geometry, None);
    }

    #[test]
    fn test_missing_title_and_price_reported_together() {
        let errors = ListingRequest::default().validate_into().unwrap_err();
        assert!(errors.contains("title"));
        assert!(errors.contains("price"));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut request = veg_box();
        request.title = Some("   ".to_string());
        let errors = request.validate_into().unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["Please add a title"]);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut request = veg_box();
        request.price = Some(Lenient::Value(-1.0));
        let errors = request.validate_into().unwrap_err();
        assert!(errors.contains("price"));
    }

    #[test]
    fn test_price_wrong_type_is_a_field_error() {
        let request: ListingRequest = serde_json::from_value(serde_json::json!({
            "title": "",
            "price": "35",
            "category": "toys"
        }))
        .unwrap();
        let errors = request.validate_into().unwrap_err();
        assert_eq!(errors.get("price").unwrap(), ["Price must be a number"]);
        assert!(errors.contains("title"));
        assert!(errors.contains("category"));
    }

    #[test]
    fn test_blank_descriptions_dropped() {
        let mut request = veg_box();
        request.description = Some("  Weekly box ".to_string());
        request.long_description = Some("   ".to_string());
        let listing = request.validate_into().unwrap();
        assert_eq!(listing.description.as_deref(), Some("Weekly box"));
        assert_eq!(listing.long_description, None);
    }

    #[test]
    fn test_free_listing_allowed() {
        let mut request = veg_box();
        request.price = Some(Lenient::Value(0.0));
        assert!(request.validate_into().is_ok());
    }

    #[test]
    fn test_unknown_category_and_type() {
        let mut request = veg_box();
        request.category = Some("toys".to_string());
        request.kind = Some("service".to_string());
        let errors = request.validate_into().unwrap_err();
        assert!(errors.contains("category"));
        assert!(errors.contains("type"));
    }

    #[test]
    fn test_coordinates_must_come_in_pairs() {
        let mut request = veg_box();
        request.lat = Some(51.5);
        let errors = request.validate_into().unwrap_err();
        assert!(errors.contains("lng"));

        let mut request = veg_box();
        request.lat = Some(51.5);
        request.lng = Some(-0.12);
        let listing = request.validate_into().unwrap();
        assert_eq!(listing.geometry, Some(GeoPoint::new(51.5, -0.12)));
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let mut request = veg_box();
        request.lat = Some(91.0);
        request.lng = Some(-181.0);
        let errors = request.validate_into().unwrap_err();
        assert!(errors.contains("lat"));
        assert!(errors.contains("lng"));
    }

    #[test]
    fn test_workshop_fields_kept() {
        let request = ListingRequest {
            title: Some("Urban Composting Workshop".to_string()),
            price: Some(Lenient::Value(25.0)),
            category: Some("education".to_string()),
            kind: Some("workshop".to_string()),
            date: Some("Jan 15, 2025".to_string()),
            location: Some("Urban Harvest Community Center".to_string()),
            duration: Some("3 hours".to_string()),
            ..Default::default()
        };
        let listing = request.validate_into().unwrap();
        assert_eq!(listing.kind, ListingKind::Workshop);
        assert_eq!(listing.duration.as_deref(), Some("3 hours"));
    }

    #[test]
    fn test_category_filter() {
        let listing = Listing::from_new(veg_box().validate_into().unwrap());
        assert!(CategoryFilter::All.matches(&listing));
        assert!(CategoryFilter::Only(Category::Food).matches(&listing));
        assert!(!CategoryFilter::Only(Category::Lifestyle).matches(&listing));

        assert_eq!(CategoryFilter::parse("all"), Some(CategoryFilter::All));
        assert_eq!(
            CategoryFilter::parse("education"),
            Some(CategoryFilter::Only(Category::Education))
        );
        assert_eq!(CategoryFilter::parse("Food"), None);
    }

    #[test]
    fn test_listing_wire_format() {
        let listing = Listing::from_new(veg_box().validate_into().unwrap());
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["type"], "product");
        assert_eq!(json["inStock"], true);
        assert_eq!(json["category"], "food");
        assert!(json.get("longDescription").is_some());
    }
}

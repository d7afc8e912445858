use anyhow::Context;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Listing, ListingRequest};
use crate::validation::Lenient;

fn listing(
    title: &str,
    description: &str,
    price: f64,
    image: &str,
    category: &str,
    kind: &str,
    in_stock: bool,
) -> ListingRequest {
    ListingRequest {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        price: Some(Lenient::Value(price)),
        image: Some(image.to_string()),
        category: Some(category.to_string()),
        kind: Some(kind.to_string()),
        in_stock: Some(in_stock),
        ..Default::default()
    }
}

/// The starter catalog.
pub fn sample_listings() -> Vec<ListingRequest> {
    vec![
        ListingRequest {
            long_description: Some(
                "Experience the freshest produce with our weekly Organic Vegetable Box. We partner with over 50 local farms to bring you a curated selection of seasonal vegetables, picked at peak ripeness and delivered within 24 hours of harvest. Each box contains 8-10 different vegetables, enough to feed a family of four for a week. Our farmers follow strict organic practices, using no synthetic pesticides or fertilizers."
                    .to_string(),
            ),
            ..listing(
                "Organic Vegetable Box",
                "Weekly delivery of fresh, seasonal organic vegetables from local farms.",
                35.0,
                "https://images.unsplash.com/photo-1540420773420-3366772f4999?w=800",
                "food",
                "product",
                true,
            )
        },
        ListingRequest {
            long_description: Some(
                "Join us for an immersive 3-hour workshop where you'll learn the art and science of composting in urban environments. Perfect for apartment dwellers and homeowners alike, this workshop covers everything from vermicomposting to bokashi fermentation. You'll leave with a starter kit and the confidence to reduce your kitchen waste by up to 80%."
                    .to_string(),
            ),
            date: Some("Jan 15, 2025".to_string()),
            location: Some("Urban Harvest Community Center".to_string()),
            duration: Some("3 hours".to_string()),
            ..listing(
                "Urban Composting Workshop",
                "Learn how to turn kitchen scraps into garden gold in this hands-on workshop.",
                25.0,
                "https://images.unsplash.com/photo-1416879595882-3373a0480b5b?w=800",
                "education",
                "workshop",
                true,
            )
        },
        listing(
            "Bamboo Starter Kit",
            "Complete eco-friendly bathroom essentials made from sustainable bamboo.",
            42.0,
            "https://images.unsplash.com/photo-1607006344380-b6775a0824a7?w=800",
            "lifestyle",
            "product",
            true,
        ),
        listing(
            "Farm-to-Table Fruit Basket",
            "Handpicked seasonal fruits sourced directly from local orchards.",
            28.0,
            "https://images.unsplash.com/photo-1619566636858-adf3ef46400b?w=800",
            "food",
            "product",
            true,
        ),
        ListingRequest {
            date: Some("Jan 22, 2025".to_string()),
            ..listing(
                "Rooftop Garden Basics",
                "Transform your rooftop or balcony into a thriving urban garden.",
                45.0,
                "https://images.unsplash.com/photo-1466692476868-aef1dfb1e735?w=800",
                "education",
                "workshop",
                true,
            )
        },
        listing(
            "Reusable Produce Bags",
            "Set of 6 mesh bags for zero-waste grocery shopping.",
            18.0,
            "https://images.unsplash.com/photo-1591193686104-fddba4d0e4d8?w=800",
            "lifestyle",
            "product",
            false,
        ),
    ]
}

/// Replaces the catalog with the sample listings. Returns how many were removed.
pub fn reseed(conn: &mut Connection) -> anyhow::Result<usize> {
    let tx = conn.transaction().context("failed to start seed transaction")?;

    let removed = queries::clear_listings(&tx)?;
    for request in sample_listings() {
        let new_listing = request
            .validate_into()
            .map_err(|e| anyhow::anyhow!("invalid sample listing: {e}"))?;
        queries::create_listing(&tx, &Listing::from_new(new_listing))?;
    }

    tx.commit().context("failed to commit seed transaction")?;
    Ok(removed)
}

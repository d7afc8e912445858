use chrono::{DateTime, SecondsFormat, Utc};
use anyhow::Context;
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::models::{Booking, Category, GeoBounds, GeoPoint, Listing, ListingKind};

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

// ── Listings ──

const LISTING_COLUMNS: &str = "id, title, description, long_description, price, image, category, kind, in_stock, date, location, duration, lat, lng, created_at";

pub fn create_listing(conn: &Connection, listing: &Listing) -> anyhow::Result<()> {
    let (lat, lng) = match listing.geometry {
        Some(point) => (Some(point.lat), Some(point.lng)),
        None => (None, None),
    };

    conn.execute(
        "INSERT INTO listings (id, title, description, long_description, price, image, category, kind, in_stock, date, location, duration, lat, lng, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            listing.id,
            listing.title,
            listing.description,
            listing.long_description,
            listing.price,
            listing.image,
            listing.category.map(|c| c.as_str()),
            listing.kind.as_str(),
            listing.in_stock as i32,
            listing.date,
            listing.location,
            listing.duration,
            lat,
            lng,
            format_timestamp(&listing.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_listing(conn: &Connection, id: &str) -> anyhow::Result<Option<Listing>> {
    let result = conn.query_row(
        &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_listing_row(row)),
    );

    match result {
        Ok(listing) => Ok(Some(listing?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn listing_exists(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM listings WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Listings in insertion order, narrowed by category and, when `bounds` is
/// given, to geo-tagged rows inside the box.
pub fn list_listings(
    conn: &Connection,
    category: Option<Category>,
    bounds: Option<&GeoBounds>,
) -> anyhow::Result<Vec<Listing>> {
    let mut sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE 1 = 1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = category {
        params_vec.push(Box::new(category.as_str()));
        sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
    }

    if let Some(bounds) = bounds {
        sql.push_str(" AND lat IS NOT NULL AND lng IS NOT NULL");
        params_vec.push(Box::new(bounds.min_lat));
        params_vec.push(Box::new(bounds.max_lat));
        sql.push_str(&format!(
            " AND lat BETWEEN ?{} AND ?{}",
            params_vec.len() - 1,
            params_vec.len()
        ));
        if let Some((min_lng, max_lng)) = bounds.lng_range {
            params_vec.push(Box::new(min_lng));
            params_vec.push(Box::new(max_lng));
            sql.push_str(&format!(
                " AND lng BETWEEN ?{} AND ?{}",
                params_vec.len() - 1,
                params_vec.len()
            ));
        }
    }

    sql.push_str(" ORDER BY rowid ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_listing_row(row)))?;

    let mut listings = vec![];
    for row in rows {
        listings.push(row??);
    }
    Ok(listings)
}

pub fn count_listings(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn clear_listings(conn: &Connection) -> anyhow::Result<usize> {
    let count = conn.execute("DELETE FROM listings", [])?;
    Ok(count)
}

fn parse_listing_row(row: &rusqlite::Row) -> anyhow::Result<Listing> {
    let category: Option<String> = row.get(6)?;
    let kind: String = row.get(7)?;
    let in_stock: i32 = row.get(8)?;
    let lat: Option<f64> = row.get(12)?;
    let lng: Option<f64> = row.get(13)?;
    let created_at_str: String = row.get(14)?;

    let geometry = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    Ok(Listing {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        long_description: row.get(3)?,
        price: row.get(4)?,
        image: row.get(5)?,
        category: category.as_deref().and_then(Category::parse),
        kind: ListingKind::parse(&kind).unwrap_or_default(),
        in_stock: in_stock != 0,
        date: row.get(9)?,
        location: row.get(10)?,
        duration: row.get(11)?,
        geometry,
        created_at: parse_timestamp(&created_at_str)
            .with_context(|| format!("bad created_at on listing row: {created_at_str}"))?,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, listing_id, name, email, phone, guests, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            booking.id,
            booking.listing_id,
            booking.name,
            booking.email,
            booking.phone,
            booking.guests,
            booking.notes,
            format_timestamp(&booking.created_at),
        ],
    )?;
    Ok(())
}

/// All bookings, newest first.
pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, listing_id, name, email, phone, guests, notes, created_at
         FROM bookings ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let created_at_str: String = row.get(7)?;
        Ok(Booking {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            guests: row.get(5)?,
            notes: row.get(6)?,
            created_at: parse_timestamp(&created_at_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
            })?,
        })
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

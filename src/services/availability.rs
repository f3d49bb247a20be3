use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::Booking;

/// Half-open overlap: a booking ending exactly when the candidate starts
/// (or starting exactly when it ends) does not collide.
pub fn overlaps(existing: &Booking, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
    existing.start_date < *end && existing.end_date > *start
}

pub fn has_conflict(bookings: &[Booking], start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
    bookings
        .iter()
        .filter(|b| b.blocks_car())
        .any(|b| overlaps(b, start, end))
}

/// Whether `car_id` is free for `[start, end)`. The car's existence is the
/// caller's concern.
pub fn is_available(
    conn: &Connection,
    car_id: i64,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let bookings = queries::get_active_bookings_for_car(conn, car_id)?;
    Ok(!has_conflict(&bookings, start, end))
}

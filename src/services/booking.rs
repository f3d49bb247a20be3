use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingStatus, BookingWithCar, CreateBookingRequest, Identity, NewBooking, Role,
};
use crate::services::availability;
use crate::services::pricing::{self, Quote};

/// Deployment choices that shape new bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPolicy {
    pub initial_status: BookingStatus,
}

impl BookingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        let initial_status = if config.booking_auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        Self { initial_status }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            initial_status: BookingStatus::Pending,
        }
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC, or a bare
/// date at UTC midnight.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn parse_date_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = parse_instant(start).ok_or_else(|| invalid_range("startDate"))?;
    let end = parse_instant(end).ok_or_else(|| invalid_range("endDate"))?;
    if start >= end {
        return Err(invalid_range("startDate"));
    }
    Ok((start, end))
}

fn invalid_range(field: &str) -> AppError {
    AppError::validation(field, "Invalid date range")
}

/// Books `request.car_id` for `user_id`, pricing it server-side.
///
/// The availability check and the insert share one IMMEDIATE transaction, so
/// a second writer waits until the first has committed and then sees its row.
pub fn create_booking(
    conn: &mut Connection,
    policy: &BookingPolicy,
    user_id: &str,
    request: &CreateBookingRequest,
) -> Result<Booking, AppError> {
    let (start, end) = parse_date_range(&request.start_date, &request.end_date)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let car = queries::get_car(&tx, request.car_id)?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    if !availability::is_available(&tx, car.id, &start, &end)? {
        return Err(AppError::Unavailable);
    }

    let days = pricing::rental_days(&start, &end);
    let total_price = pricing::total_price(car.daily_rate, days).ok_or_else(price_out_of_range)?;
    let booking = queries::insert_booking(
        &tx,
        &NewBooking {
            user_id: user_id.to_string(),
            car_id: car.id,
            start_date: start,
            end_date: end,
            total_price,
            status: policy.initial_status,
        },
    )?;

    tx.commit()?;

    tracing::info!(
        booking_id = booking.id,
        car_id = car.id,
        user_id,
        days,
        total_price = %booking.total_price,
        status = booking.status.as_str(),
        "booking created"
    );
    Ok(booking)
}

/// Prices a prospective rental without reserving anything.
pub fn quote(conn: &Connection, car_id: i64, start: &str, end: &str) -> Result<Quote, AppError> {
    let (start, end) = parse_date_range(start, end)?;
    let car = queries::get_car(conn, car_id)?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;
    Quote::new(car.id, car.daily_rate, &start, &end).ok_or_else(price_out_of_range)
}

fn price_out_of_range() -> AppError {
    AppError::Validation {
        message: "Rental total is out of range".to_string(),
        field: None,
    }
}

/// Moves a booking to any status; no transition graph is enforced.
pub fn update_booking_status(conn: &Connection, id: i64, status: &str) -> Result<Booking, AppError> {
    let status = BookingStatus::parse(status).ok_or_else(|| {
        AppError::validation(
            "status",
            "Status must be one of: pending, confirmed, completed, cancelled",
        )
    })?;

    if !queries::set_booking_status(conn, id, &status)? {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }

    tracing::info!(booking_id = id, status = status.as_str(), "booking status updated");

    queries::get_booking(conn, id)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Admins see every booking, users their own, anonymous callers nothing.
pub fn list_bookings(
    conn: &Connection,
    actor: Option<&Identity>,
) -> Result<Vec<BookingWithCar>, AppError> {
    let Some(actor) = actor else {
        return Ok(vec![]);
    };

    let owner = match actor.role {
        Role::Admin => None,
        Role::User => Some(actor.subject_id.as_str()),
    };
    Ok(queries::list_bookings_with_cars(conn, owner)?)
}

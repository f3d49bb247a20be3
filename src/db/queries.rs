use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, BookingWithCar, Car, CarStatus, Claims, FuelType, NewBooking, NewCar,
    PaymentStatus, Role, Transmission, User,
};
use crate::services::pricing::round_cents;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const CAR_COLUMNS: &str = "c.id, c.make, c.model, c.year, c.color, c.transmission, c.fuel_type, \
     c.daily_rate, c.image_url, c.status, c.features, c.description, c.created_at";

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.car_id, b.start_date, b.end_date, \
     b.total_price, b.status, b.payment_status, b.created_at";

// Column count of BOOKING_COLUMNS; car columns follow it in joined rows.
const BOOKING_COLUMN_COUNT: usize = 9;

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))?;
    Ok(naive.and_utc())
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("invalid stored decimal: {s}"))
}

// ── Cars ──

pub fn list_cars(conn: &Connection) -> anyhow::Result<Vec<Car>> {
    let mut stmt = conn.prepare(&format!("SELECT {CAR_COLUMNS} FROM cars c ORDER BY c.id ASC"))?;

    let rows = stmt.query_map([], |row| Ok(parse_car_row(row, 0)))?;

    let mut cars = vec![];
    for row in rows {
        cars.push(row??);
    }
    Ok(cars)
}

pub fn get_car(conn: &Connection, id: i64) -> anyhow::Result<Option<Car>> {
    let result = conn.query_row(
        &format!("SELECT {CAR_COLUMNS} FROM cars c WHERE c.id = ?1"),
        params![id],
        |row| Ok(parse_car_row(row, 0)),
    );

    match result {
        Ok(car) => Ok(Some(car?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_car(conn: &Connection, car: &NewCar) -> anyhow::Result<Car> {
    let created_at = Utc::now();
    let features = serde_json::to_string(&car.features)?;

    conn.execute(
        "INSERT INTO cars (make, model, year, color, transmission, fuel_type, daily_rate, image_url, status, features, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            car.make,
            car.model,
            car.year,
            car.color,
            car.transmission.as_str(),
            car.fuel_type.as_str(),
            car.daily_rate.to_string(),
            car.image_url,
            car.status.as_str(),
            features,
            car.description,
            format_timestamp(&created_at),
        ],
    )?;

    Ok(Car {
        id: conn.last_insert_rowid(),
        make: car.make.clone(),
        model: car.model.clone(),
        year: car.year,
        color: car.color.clone(),
        transmission: car.transmission,
        fuel_type: car.fuel_type,
        daily_rate: car.daily_rate,
        image_url: car.image_url.clone(),
        status: car.status,
        features: car.features.clone(),
        description: car.description.clone(),
        created_at,
    })
}

/// Overwrites every mutable column of an existing car. Returns false if the
/// row is gone.
pub fn save_car(conn: &Connection, car: &Car) -> anyhow::Result<bool> {
    let features = serde_json::to_string(&car.features)?;
    let count = conn.execute(
        "UPDATE cars SET make = ?1, model = ?2, year = ?3, color = ?4, transmission = ?5,
           fuel_type = ?6, daily_rate = ?7, image_url = ?8, status = ?9, features = ?10,
           description = ?11
         WHERE id = ?12",
        params![
            car.make,
            car.model,
            car.year,
            car.color,
            car.transmission.as_str(),
            car.fuel_type.as_str(),
            car.daily_rate.to_string(),
            car.image_url,
            car.status.as_str(),
            features,
            car.description,
            car.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_car(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM cars WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_car_row(row: &Row, base: usize) -> anyhow::Result<Car> {
    let transmission: String = row.get(base + 5)?;
    let fuel_type: String = row.get(base + 6)?;
    let daily_rate: String = row.get(base + 7)?;
    let status: String = row.get(base + 9)?;
    let features: String = row.get(base + 10)?;
    let created_at: String = row.get(base + 12)?;

    Ok(Car {
        id: row.get(base)?,
        make: row.get(base + 1)?,
        model: row.get(base + 2)?,
        year: row.get(base + 3)?,
        color: row.get(base + 4)?,
        transmission: Transmission::parse(&transmission)
            .with_context(|| format!("invalid stored transmission: {transmission}"))?,
        fuel_type: FuelType::parse(&fuel_type)
            .with_context(|| format!("invalid stored fuel type: {fuel_type}"))?,
        daily_rate: parse_decimal(&daily_rate)?,
        image_url: row.get(base + 8)?,
        status: CarStatus::parse(&status)
            .with_context(|| format!("invalid stored car status: {status}"))?,
        features: serde_json::from_str(&features).context("invalid stored features")?,
        description: row.get(base + 11)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> anyhow::Result<Booking> {
    let created_at = Utc::now();
    let payment_status = PaymentStatus::Pending;

    conn.execute(
        "INSERT INTO bookings (user_id, car_id, start_date, end_date, total_price, status, payment_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            booking.user_id,
            booking.car_id,
            format_timestamp(&booking.start_date),
            format_timestamp(&booking.end_date),
            booking.total_price.to_string(),
            booking.status.as_str(),
            payment_status.as_str(),
            format_timestamp(&created_at),
        ],
    )?;

    Ok(Booking {
        id: conn.last_insert_rowid(),
        user_id: booking.user_id.clone(),
        car_id: booking.car_id,
        start_date: booking.start_date,
        end_date: booking.end_date,
        total_price: booking.total_price,
        status: booking.status,
        payment_status,
        created_at,
    })
}

/// Bookings for a car that still hold their dates (pending or confirmed).
pub fn get_active_bookings_for_car(conn: &Connection, car_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE b.car_id = ?1 AND b.status IN ('pending', 'confirmed')
         ORDER BY b.id ASC"
    ))?;

    let rows = stmt.query_map(params![car_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn count_bookings_for_car(conn: &Connection, car_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE car_id = ?1",
        params![car_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All bookings joined with their car, optionally restricted to one owner.
pub fn list_bookings_with_cars(
    conn: &Connection,
    owner: Option<&str>,
) -> anyhow::Result<Vec<BookingWithCar>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS}, {CAR_COLUMNS}
         FROM bookings b INNER JOIN cars c ON c.id = b.car_id
         WHERE (?1 IS NULL OR b.user_id = ?1)
         ORDER BY b.id ASC"
    ))?;

    let rows = stmt.query_map(params![owner], |row| {
        Ok(parse_booking_row(row).and_then(|booking| {
            let car = parse_car_row(row, BOOKING_COLUMN_COUNT)?;
            Ok(BookingWithCar { booking, car })
        }))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn set_booking_status(
    conn: &Connection,
    id: i64,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let start_date: String = row.get(3)?;
    let end_date: String = row.get(4)?;
    let total_price: String = row.get(5)?;
    let status: String = row.get(6)?;
    let payment_status: String = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        car_id: row.get(2)?,
        start_date: parse_timestamp(&start_date)?,
        end_date: parse_timestamp(&end_date)?,
        total_price: parse_decimal(&total_price)?,
        status: BookingStatus::parse(&status)
            .with_context(|| format!("invalid stored booking status: {status}"))?,
        payment_status: PaymentStatus::parse(&payment_status)
            .with_context(|| format!("invalid stored payment status: {payment_status}"))?,
        created_at: parse_timestamp(&created_at)?,
    })
}

// ── Dashboard ──

pub struct DashboardStats {
    pub total_revenue: Decimal,
    pub active_bookings: i64,
    pub total_cars: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let mut stmt = conn.prepare("SELECT total_price FROM bookings")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut total_revenue = Decimal::ZERO;
    for row in rows {
        total_revenue = total_revenue
            .checked_add(parse_decimal(&row?)?)
            .context("total revenue overflowed")?;
    }

    let active_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'",
        [],
        |row| row.get(0),
    )?;

    let total_cars: i64 = conn.query_row("SELECT COUNT(*) FROM cars", [], |row| row.get(0))?;

    Ok(DashboardStats {
        total_revenue: round_cents(total_revenue),
        active_bookings,
        total_cars,
    })
}

// ── Users ──

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, profile_image_url, role, created_at, updated_at";

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Inserts or refreshes a user from provider claims in one statement.
///
/// The very first row ever written gets the admin role; the emptiness check
/// lives inside the INSERT so two concurrent first logins cannot both (or
/// neither) become admin. An existing user keeps the stored role unless
/// `role_override` is given.
pub fn upsert_user(
    conn: &Connection,
    claims: &Claims,
    role_override: Option<Role>,
) -> anyhow::Result<User> {
    let now = format_timestamp(&Utc::now());
    let role_override = role_override.map(|r| r.as_str());

    let user = conn.query_row(
        &format!(
            "INSERT INTO users (id, email, first_name, last_name, profile_image_url, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5,
                     CASE WHEN EXISTS (SELECT 1 FROM users) THEN COALESCE(?6, 'user') ELSE 'admin' END,
                     ?7, ?7)
             ON CONFLICT(id) DO UPDATE SET
               email = excluded.email,
               first_name = excluded.first_name,
               last_name = excluded.last_name,
               profile_image_url = excluded.profile_image_url,
               role = COALESCE(?6, users.role),
               updated_at = excluded.updated_at
             RETURNING {USER_COLUMNS}"
        ),
        params![
            claims.subject,
            claims.email,
            claims.first_name,
            claims.last_name,
            claims.profile_image_url,
            role_override,
            now,
        ],
        |row| Ok(parse_user_row(row)),
    )??;

    Ok(user)
}

fn parse_user_row(row: &Row) -> anyhow::Result<User> {
    let role: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image_url: row.get(4)?,
        role: Role::parse(&role).with_context(|| format!("invalid stored role: {role}"))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

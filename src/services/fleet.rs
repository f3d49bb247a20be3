use chrono::{Datelike, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Car, CarFilter, CarPatch, CarPayload, CarStatus, FuelType, NewCar, Transmission};

const MIN_YEAR: i32 = 1900;

pub fn list_cars(conn: &Connection, filter: &CarFilter) -> Result<Vec<Car>, AppError> {
    let cars = queries::list_cars(conn)?;
    Ok(cars.into_iter().filter(|car| filter.matches(car)).collect())
}

pub fn get_car(conn: &Connection, id: i64) -> Result<Car, AppError> {
    queries::get_car(conn, id)?.ok_or_else(car_not_found)
}

pub fn create_car(conn: &Connection, payload: CarPayload) -> Result<Car, AppError> {
    let new_car = validate_new(payload)?;
    let car = queries::insert_car(conn, &new_car)?;
    tracing::info!(car_id = car.id, make = %car.make, model = %car.model, "car created");
    Ok(car)
}

pub fn update_car(conn: &Connection, id: i64, payload: CarPayload) -> Result<Car, AppError> {
    let patch = validate_patch(payload)?;
    let mut car = get_car(conn, id)?;
    patch.apply(&mut car);

    if !queries::save_car(conn, &car)? {
        return Err(car_not_found());
    }
    tracing::info!(car_id = id, "car updated");
    Ok(car)
}

/// Hard delete. A car that any booking still references is kept and the
/// call fails with a conflict.
pub fn delete_car(conn: &Connection, id: i64) -> Result<(), AppError> {
    get_car(conn, id)?;

    let references = queries::count_bookings_for_car(conn, id)?;
    if references > 0 {
        tracing::warn!(car_id = id, references, "refusing to delete booked car");
        return Err(AppError::Conflict(
            "Car has existing bookings and cannot be deleted".to_string(),
        ));
    }

    if !queries::delete_car(conn, id)? {
        return Err(car_not_found());
    }
    tracing::info!(car_id = id, "car deleted");
    Ok(())
}

fn car_not_found() -> AppError {
    AppError::NotFound("Car not found".to_string())
}

pub fn validate_new(payload: CarPayload) -> Result<NewCar, AppError> {
    Ok(NewCar {
        make: required_text("make", payload.make)?,
        model: required_text("model", payload.model)?,
        year: year(required("year", payload.year)?)?,
        color: required_text("color", payload.color)?,
        transmission: transmission(&required("transmission", payload.transmission)?)?,
        fuel_type: fuel_type(&required("fuelType", payload.fuel_type)?)?,
        daily_rate: daily_rate(required("dailyRate", payload.daily_rate)?)?,
        image_url: required_text("imageUrl", payload.image_url)?,
        status: match payload.status {
            Some(s) => car_status(&s)?,
            None => CarStatus::default(),
        },
        features: payload.features.unwrap_or_default(),
        description: payload.description.flatten(),
    })
}

/// Same rules as [`validate_new`], applied only to the fields present.
pub fn validate_patch(payload: CarPayload) -> Result<CarPatch, AppError> {
    Ok(CarPatch {
        make: payload.make.map(|v| text("make", v)).transpose()?,
        model: payload.model.map(|v| text("model", v)).transpose()?,
        year: payload.year.map(year).transpose()?,
        color: payload.color.map(|v| text("color", v)).transpose()?,
        transmission: payload.transmission.as_deref().map(transmission).transpose()?,
        fuel_type: payload.fuel_type.as_deref().map(fuel_type).transpose()?,
        daily_rate: payload.daily_rate.map(daily_rate).transpose()?,
        image_url: payload.image_url.map(|v| text("imageUrl", v)).transpose()?,
        status: payload.status.as_deref().map(car_status).transpose()?,
        features: payload.features,
        description: payload.description,
    })
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::validation(field, format!("{field} is required")))
}

fn required_text(field: &str, value: Option<String>) -> Result<String, AppError> {
    text(field, required(field, value)?)
}

fn text(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn year(value: i32) -> Result<i32, AppError> {
    let max = Utc::now().year() + 1;
    if !(MIN_YEAR..=max).contains(&value) {
        return Err(AppError::validation(
            "year",
            format!("year must be between {MIN_YEAR} and {max}"),
        ));
    }
    Ok(value)
}

fn daily_rate(value: Decimal) -> Result<Decimal, AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::validation("dailyRate", "dailyRate must be positive"));
    }
    if value > max_daily_rate() {
        return Err(AppError::validation(
            "dailyRate",
            format!("dailyRate must not exceed {}", max_daily_rate()),
        ));
    }
    if value.normalize().scale() > 2 {
        return Err(AppError::validation(
            "dailyRate",
            "dailyRate must have at most 2 decimal places",
        ));
    }
    Ok(value)
}

// Fits a DECIMAL(10, 2) column.
fn max_daily_rate() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn transmission(value: &str) -> Result<Transmission, AppError> {
    Transmission::parse(value).ok_or_else(|| one_of("transmission", &Transmission::ALL.map(|v| v.as_str())))
}

fn fuel_type(value: &str) -> Result<FuelType, AppError> {
    FuelType::parse(value).ok_or_else(|| one_of("fuelType", &FuelType::ALL.map(|v| v.as_str())))
}

fn car_status(value: &str) -> Result<CarStatus, AppError> {
    CarStatus::parse(value).ok_or_else(|| one_of("status", &CarStatus::ALL.map(|v| v.as_str())))
}

fn one_of(field: &str, allowed: &[&str]) -> AppError {
    AppError::validation(field, format!("{field} must be one of: {}", allowed.join(", ")))
}

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::queries;
use crate::models::{CarStatus, FuelType, NewCar, Transmission};

/// Inserts the sample fleet when no cars exist. Returns how many were added.
pub fn seed_fleet(conn: &Connection) -> anyhow::Result<usize> {
    if !queries::list_cars(conn)?.is_empty() {
        return Ok(0);
    }

    tracing::info!("seeding database with sample fleet");
    let cars = sample_fleet();
    for car in &cars {
        queries::insert_car(conn, car)?;
    }
    tracing::info!(count = cars.len(), "database seeded");
    Ok(cars.len())
}

pub fn sample_fleet() -> Vec<NewCar> {
    vec![
        sample(
            ("Toyota", "Camry", 2024, "Silver"),
            FuelType::Hybrid,
            Decimal::new(5500, 2),
            "https://images.unsplash.com/photo-1621007947382-bb3c3968e3bb?auto=format&fit=crop&q=80&w=1000",
            &["Bluetooth", "Backup Camera", "Lane Assist"],
            "Reliable and fuel-efficient sedan, perfect for city driving and long trips.",
        ),
        sample(
            ("Tesla", "Model 3", 2023, "White"),
            FuelType::Electric,
            Decimal::new(8500, 2),
            "https://images.unsplash.com/photo-1560958089-b8a1929cea89?auto=format&fit=crop&q=80&w=1000",
            &["Autopilot", "Long Range", "Premium Audio"],
            "Experience the future of driving with this high-performance electric vehicle.",
        ),
        sample(
            ("Ford", "Explorer", 2023, "Blue"),
            FuelType::Petrol,
            Decimal::new(9500, 2),
            "https://images.unsplash.com/photo-1533473359331-0135ef1b58bf?auto=format&fit=crop&q=80&w=1000",
            &["AWD", "7 Seats", "Navigation"],
            "Spacious SUV with plenty of room for family and luggage.",
        ),
        sample(
            ("BMW", "M4", 2024, "Black"),
            FuelType::Petrol,
            Decimal::new(15000, 2),
            "https://images.unsplash.com/photo-1617788138017-80ad40651399?auto=format&fit=crop&q=80&w=1000",
            &["Sport Mode", "Leather Seats", "Sunroof"],
            "Luxury sports coupe delivering exhilarating performance and style.",
        ),
    ]
}

fn sample(
    (make, model, year, color): (&str, &str, i32, &str),
    fuel_type: FuelType,
    daily_rate: Decimal,
    image_url: &str,
    features: &[&str],
    description: &str,
) -> NewCar {
    NewCar {
        make: make.to_string(),
        model: model.to_string(),
        year,
        color: color.to_string(),
        transmission: Transmission::Automatic,
        fuel_type,
        daily_rate,
        image_url: image_url.to_string(),
        status: CarStatus::Available,
        features: features.iter().map(|f| f.to_string()).collect(),
        description: Some(description.to_string()),
    }
}

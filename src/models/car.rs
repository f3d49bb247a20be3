use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub daily_rate: Decimal,
    pub image_url: String,
    pub status: CarStatus,
    pub features: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated car, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub daily_rate: Decimal,
    pub image_url: String,
    pub status: CarStatus,
    pub features: Vec<String>,
    pub description: Option<String>,
}

/// Validated subset of car fields for a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarPatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub daily_rate: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: Option<CarStatus>,
    pub features: Option<Vec<String>>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl CarPatch {
    pub fn apply(self, car: &mut Car) {
        if let Some(v) = self.make {
            car.make = v;
        }
        if let Some(v) = self.model {
            car.model = v;
        }
        if let Some(v) = self.year {
            car.year = v;
        }
        if let Some(v) = self.color {
            car.color = v;
        }
        if let Some(v) = self.transmission {
            car.transmission = v;
        }
        if let Some(v) = self.fuel_type {
            car.fuel_type = v;
        }
        if let Some(v) = self.daily_rate {
            car.daily_rate = v;
        }
        if let Some(v) = self.image_url {
            car.image_url = v;
        }
        if let Some(v) = self.status {
            car.status = v;
        }
        if let Some(v) = self.features {
            car.features = v;
        }
        if let Some(v) = self.description {
            car.description = v;
        }
    }
}

/// Raw car body as sent by clients, shared by create and partial update.
/// Enum-valued fields stay strings here so that a bad value can be reported
/// against its field instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPayload {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub daily_rate: Option<Decimal>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub features: Option<Vec<String>>,
    /// Absent key is `None`, explicit `null` is `Some(None)`.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Catalog filter; both criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            if car.status.as_str() != status {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !car.make.to_lowercase().contains(&needle)
                && !car.model.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    pub const ALL: [Transmission; 2] = [Transmission::Automatic, Transmission::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Automatic => "automatic",
            Transmission::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl FuelType {
    pub const ALL: [FuelType; 4] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Electric,
        FuelType::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Hybrid => "hybrid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Fleet label set by admins. Not derived from bookings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
}

impl CarStatus {
    pub const ALL: [CarStatus; 3] = [CarStatus::Available, CarStatus::Rented, CarStatus::Maintenance];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Rented => "rented",
            CarStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

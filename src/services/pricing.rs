use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Flat service fee shown on quotes. Display only; nothing is charged.
pub fn service_fee() -> Decimal {
    Decimal::new(2500, 2)
}

/// Flat insurance fee shown on quotes. Display only; nothing is charged.
pub fn insurance_fee() -> Decimal {
    Decimal::new(1500, 2)
}

/// Billable days for a rental: partial days round up, never below one.
pub fn rental_days(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    let millis = (*end - *start).num_milliseconds();
    if millis <= 0 {
        return 1;
    }
    ((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).max(1)
}

/// `days * daily_rate`, rounded half away from zero to cents. `None` when
/// the product does not fit a `Decimal`.
pub fn total_price(daily_rate: Decimal, days: i64) -> Option<Decimal> {
    daily_rate.checked_mul(Decimal::from(days)).map(round_cents)
}

pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub car_id: i64,
    pub days: i64,
    pub daily_rate: Decimal,
    pub rental_total: Decimal,
    pub service_fee: Decimal,
    pub insurance_fee: Decimal,
    pub total: Decimal,
}

impl Quote {
    pub fn new(
        car_id: i64,
        daily_rate: Decimal,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Option<Self> {
        let days = rental_days(start, end);
        let rental_total = total_price(daily_rate, days)?;
        let total = rental_total
            .checked_add(service_fee())?
            .checked_add(insurance_fee())?;
        Some(Quote {
            car_id,
            days,
            daily_rate,
            rental_total,
            service_fee: service_fee(),
            insurance_fee: insurance_fee(),
            total: round_cents(total),
        })
    }
}

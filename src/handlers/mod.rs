pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cars;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_permissive = state.config.cors_permissive;

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/cars", get(cars::list_cars).post(cars::create_car))
        .route(
            "/api/cars/:id",
            get(cars::get_car).put(cars::update_car).delete(cars::delete_car),
        )
        .route("/api/cars/:id/quote", get(cars::quote))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/:id/status", patch(bookings::update_status))
        .route("/api/admin/stats", get(admin::get_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Path ids that are not integers cannot name any row.
fn parse_id(raw: &str, entity: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{entity} not found")))
}

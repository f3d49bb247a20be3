use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;
use crate::services::access;
use crate::state::AppState;

// GET /api/admin/stats
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    total_revenue: Decimal,
    active_bookings: i64,
    total_cars: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    access::require_role(actor.as_ref(), Role::Admin)?;

    let stats = {
        let db = state.conn()?;
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatsResponse {
        total_revenue: stats.total_revenue,
        active_bookings: stats.active_bookings,
        total_cars: stats.total_cars,
    }))
}

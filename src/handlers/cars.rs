use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::parse_id;
use crate::errors::AppError;
use crate::models::{Car, CarFilter, CarPayload, Role};
use crate::services::pricing::Quote;
use crate::services::{access, booking, fleet};
use crate::state::AppState;

// GET /api/cars?status=&search=
pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CarFilter>,
) -> Result<Json<Vec<Car>>, AppError> {
    let db = state.conn()?;
    Ok(Json(fleet::list_cars(&db, &filter)?))
}

// GET /api/cars/:id
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Car>, AppError> {
    let id = parse_id(&raw_id, "Car")?;
    let db = state.conn()?;
    Ok(Json(fleet::get_car(&db, id)?))
}

// POST /api/cars
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    access::require_role(actor.as_ref(), Role::Admin)?;
    let Json(payload) = payload?;

    let db = state.conn()?;
    let car = fleet::create_car(&db, payload)?;
    Ok((StatusCode::CREATED, Json(car)))
}

// PUT /api/cars/:id
pub async fn update_car(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<Json<Car>, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    access::require_role(actor.as_ref(), Role::Admin)?;
    let id = parse_id(&raw_id, "Car")?;
    let Json(payload) = payload?;

    let db = state.conn()?;
    Ok(Json(fleet::update_car(&db, id, payload)?))
}

// DELETE /api/cars/:id
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    access::authorize_mutation(actor.as_ref(), &state.config.mutation_policy)?;
    let id = parse_id(&raw_id, "Car")?;

    let db = state.conn()?;
    fleet::delete_car(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/cars/:id/quote?startDate=&endDate=
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>, AppError> {
    let id = parse_id(&raw_id, "Car")?;
    let db = state.conn()?;
    let quote = booking::quote(
        &db,
        id,
        query.start_date.as_deref().unwrap_or_default(),
        query.end_date.as_deref().unwrap_or_default(),
    )?;
    Ok(Json(quote))
}

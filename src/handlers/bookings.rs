use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use super::parse_id;
use crate::errors::AppError;
use crate::models::{Booking, BookingWithCar, CreateBookingRequest, UpdateBookingStatusRequest};
use crate::services::booking::{self, BookingPolicy};
use crate::services::access;
use crate::state::AppState;

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingWithCar>>, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    let db = state.conn()?;
    Ok(Json(booking::list_bookings(&db, actor.as_ref())?))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    let actor = access::require_authenticated(actor.as_ref())?;
    let Json(request) = payload?;

    let policy = BookingPolicy::from_config(&state.config);
    let mut db = state.conn()?;
    let booking = booking::create_booking(&mut db, &policy, &actor.subject_id, &request)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateBookingStatusRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    access::authorize_mutation(actor.as_ref(), &state.config.mutation_policy)?;
    let id = parse_id(&raw_id, "Booking")?;
    let Json(request) = payload?;

    let db = state.conn()?;
    Ok(Json(booking::update_booking_status(&db, id, &request.status)?))
}

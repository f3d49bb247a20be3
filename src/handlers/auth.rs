use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::access;
use crate::state::AppState;

// GET /api/auth/user
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, AppError> {
    let actor = access::resolve_actor(&state, &headers).await?;
    let actor = access::require_authenticated(actor.as_ref())?;

    let db = state.conn()?;
    let user = queries::get_user(&db, &actor.subject_id)?.ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

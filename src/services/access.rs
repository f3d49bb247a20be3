use axum::http::HeaderMap;

use crate::config::MutationPolicy;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Identity, Role};
use crate::state::AppState;

/// Resolves the caller once per request: provider claims are upserted into
/// the user table and the stored role is attached.
pub async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
    let Some(claims) = state.identity.claims(headers).await? else {
        return Ok(None);
    };

    let user = {
        let db = state.conn()?;
        queries::upsert_user(&db, &claims, None)?
    };
    Ok(Some(Identity::from(&user)))
}

pub fn require_authenticated(actor: Option<&Identity>) -> Result<&Identity, AppError> {
    actor.ok_or(AppError::Unauthorized)
}

pub fn require_role(actor: Option<&Identity>, role: Role) -> Result<&Identity, AppError> {
    let actor = require_authenticated(actor)?;
    if actor.role != role {
        tracing::warn!(
            subject = %actor.subject_id,
            required = role.as_str(),
            "forbidden: role check failed"
        );
        return Err(AppError::Forbidden);
    }
    Ok(actor)
}

/// Gate for booking-status changes and car deletion, which deployments may
/// leave open.
pub fn authorize_mutation(actor: Option<&Identity>, policy: &MutationPolicy) -> Result<(), AppError> {
    match policy {
        MutationPolicy::AdminOnly => require_role(actor, Role::Admin).map(|_| ()),
        MutationPolicy::Open => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            subject_id: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(matches!(require_role(None, Role::Admin), Err(AppError::Unauthorized)));
        assert!(matches!(
            require_role(Some(&identity(Role::User)), Role::Admin),
            Err(AppError::Forbidden)
        ));
        let admin = identity(Role::Admin);
        assert_eq!(require_role(Some(&admin), Role::Admin).unwrap(), &admin);
    }

    #[test]
    fn test_authorize_mutation_policies() {
        let user = identity(Role::User);
        assert!(matches!(
            authorize_mutation(Some(&user), &MutationPolicy::AdminOnly),
            Err(AppError::Forbidden)
        ));
        assert!(authorize_mutation(Some(&user), &MutationPolicy::Open).is_ok());
        assert!(authorize_mutation(None, &MutationPolicy::Open).is_ok());
        assert!(matches!(
            authorize_mutation(None, &MutationPolicy::AdminOnly),
            Err(AppError::Unauthorized)
        ));
    }
}

use async_trait::async_trait;
use axum::http::HeaderMap;

use super::IdentityProvider;
use crate::models::Claims;

pub const DEV_USER_ID: &str = "dev-user-1";

/// Treats every request as the same local developer.
pub struct DevIdentityProvider;

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn claims(&self, _headers: &HeaderMap) -> anyhow::Result<Option<Claims>> {
        Ok(Some(Claims {
            subject: DEV_USER_ID.to_string(),
            email: Some("dev@example.com".to_string()),
            first_name: Some("Dev".to_string()),
            last_name: Some("User".to_string()),
            profile_image_url: Some("https://via.placeholder.com/150".to_string()),
        }))
    }
}

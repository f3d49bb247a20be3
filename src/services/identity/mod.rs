pub mod dev;
pub mod proxy;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::config::{AppConfig, AuthMode};
use crate::models::Claims;

/// Source of caller claims for a request. `Ok(None)` means anonymous.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn claims(&self, headers: &HeaderMap) -> anyhow::Result<Option<Claims>>;
}

pub fn from_config(config: &AppConfig) -> Box<dyn IdentityProvider> {
    match config.auth_mode {
        AuthMode::Dev => {
            tracing::warn!("using development identity provider; every request is {}", dev::DEV_USER_ID);
            Box::new(dev::DevIdentityProvider)
        }
        AuthMode::Proxy => {
            if config.identity_secret.is_empty() {
                tracing::warn!("IDENTITY_SECRET is empty; identity headers are not verified");
            }
            tracing::info!("using proxy header identity provider");
            Box::new(proxy::ProxyHeaderProvider::new(config.identity_secret.clone()))
        }
    }
}

use std::env;

/// How the identity of a caller is established.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthMode {
    /// Claims arrive as (optionally signed) headers from a trusted auth proxy.
    Proxy,
    /// Every request is the fixed development user.
    Dev,
}

/// Who may change booking status and delete cars.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationPolicy {
    AdminOnly,
    Open,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub auth_mode: AuthMode,
    pub identity_secret: String,
    pub booking_auto_confirm: bool,
    pub mutation_policy: MutationPolicy,
    pub seed_database: bool,
    pub cors_permissive: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "fleetdesk.db".to_string()),
            auth_mode: match env::var("AUTH_MODE").unwrap_or_default().as_str() {
                "dev" => AuthMode::Dev,
                _ => AuthMode::Proxy,
            },
            identity_secret: env::var("IDENTITY_SECRET").unwrap_or_default(),
            booking_auto_confirm: env_flag("BOOKING_AUTO_CONFIRM", false),
            mutation_policy: match env::var("MUTATION_POLICY").unwrap_or_default().as_str() {
                "open" => MutationPolicy::Open,
                _ => MutationPolicy::AdminOnly,
            },
            seed_database: env_flag("SEED_DATABASE", true),
            cors_permissive: env_flag("CORS_PERMISSIVE", false),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => parse_flag(&v).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

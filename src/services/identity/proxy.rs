use async_trait::async_trait;
use axum::http::HeaderMap;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::IdentityProvider;
use crate::models::Claims;

pub const SUBJECT_HEADER: &str = "x-auth-subject";
pub const EMAIL_HEADER: &str = "x-auth-email";
pub const FIRST_NAME_HEADER: &str = "x-auth-first-name";
pub const LAST_NAME_HEADER: &str = "x-auth-last-name";
pub const PROFILE_IMAGE_HEADER: &str = "x-auth-profile-image";
pub const SIGNATURE_HEADER: &str = "x-auth-signature";

const CLAIM_HEADERS: [&str; 5] = [
    SUBJECT_HEADER,
    EMAIL_HEADER,
    FIRST_NAME_HEADER,
    LAST_NAME_HEADER,
    PROFILE_IMAGE_HEADER,
];

/// Reads claims that an authenticating reverse proxy forwards as headers.
///
/// With a non-empty secret the proxy must also send `x-auth-signature`:
/// base64 HMAC-SHA1 over every present claim header sorted by name, each
/// written as `name\nvalue` and joined with `\n`. Header values cannot hold a
/// newline, so the signed text splits back into exactly one header set.
/// Requests that fail the check are anonymous.
pub struct ProxyHeaderProvider {
    secret: String,
}

impl ProxyHeaderProvider {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl IdentityProvider for ProxyHeaderProvider {
    async fn claims(&self, headers: &HeaderMap) -> anyhow::Result<Option<Claims>> {
        let present: Vec<(&str, &str)> = CLAIM_HEADERS
            .iter()
            .filter_map(|name| {
                header_value(headers, name).map(|value| (*name, value))
            })
            .collect();

        let Some(subject) = header_value(headers, SUBJECT_HEADER) else {
            return Ok(None);
        };

        if !self.secret.is_empty() {
            let signature = header_value(headers, SIGNATURE_HEADER).unwrap_or("");
            if signature.is_empty() {
                tracing::warn!("missing identity signature header");
                return Ok(None);
            }
            if !validate_signature(&self.secret, signature, &present) {
                tracing::warn!(subject, "invalid identity signature");
                return Ok(None);
            }
        }

        Ok(Some(Claims {
            subject: subject.to_string(),
            email: header_value(headers, EMAIL_HEADER).map(str::to_string),
            first_name: header_value(headers, FIRST_NAME_HEADER).map(str::to_string),
            last_name: header_value(headers, LAST_NAME_HEADER).map(str::to_string),
            profile_image_url: header_value(headers, PROFILE_IMAGE_HEADER).map(str::to_string),
        }))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn signing_input(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(key, value)| format!("{key}\n{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Signature a proxy attaches for the given claim headers.
pub fn sign(secret: &str, params: &[(&str, &str)]) -> anyhow::Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid identity secret: {e}"))?;
    mac.update(signing_input(params).as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn validate_signature(secret: &str, signature: &str, params: &[(&str, &str)]) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(signing_input(params).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::state::AppState;

/// A single JWKS key as returned by the identity provider's `/jwks.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

/// Process-wide JWKS cache with a single refresh mutex and a time-based
/// TTL, per the concurrency model's requirement that the cache be
/// process-scoped rather than per-request.
pub struct JwksCache {
    ttl: Duration,
    inner: Mutex<Option<(Instant, HashMap<String, Jwk>)>>,
}

impl JwksCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(None),
        }
    }

    /// Returns the key for `kid`, refreshing the cache first if it is
    /// stale or missing the key. A signature failure caller should call
    /// `force_refresh` once and retry; this function itself only
    /// refreshes on TTL expiry or an outright cache miss.
    pub async fn get(&self, client: &reqwest::Client, jwks_url: &str, kid: &str) -> Result<Jwk, AppError> {
        {
            let guard = self.inner.lock().await;
            if let Some((fetched_at, keys)) = guard.as_ref() {
                if fetched_at.elapsed() < self.ttl {
                    if let Some(key) = keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }
        self.refresh(client, jwks_url).await?;
        let guard = self.inner.lock().await;
        guard
            .as_ref()
            .and_then(|(_, keys)| keys.get(kid).cloned())
            .ok_or_else(|| AppError::Unauthorized("unknown signing key".to_string()))
    }

    pub async fn force_refresh(&self, client: &reqwest::Client, jwks_url: &str) -> Result<(), AppError> {
        self.refresh(client, jwks_url).await
    }

    async fn refresh(&self, client: &reqwest::Client, jwks_url: &str) -> Result<(), AppError> {
        let mut guard = self.inner.lock().await;
        let response = client
            .get(jwks_url)
            .send()
            .await
            .map_err(|err| AppError::ProviderTransient(format!("jwks fetch failed: {err}")))?;
        let document: JwksDocument = response
            .json()
            .await
            .map_err(|err| AppError::ProviderTransient(format!("jwks parse failed: {err}")))?;
        let keys = document
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();
        *guard = Some((Instant::now(), keys));
        Ok(())
    }
}

/// Per-property role, ordered from least to most privileged. Declared
/// with an explicit ordinal so a handler can require "at least manager"
/// without enumerating every higher role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Governance,
    Staff,
    Manager,
    Owner,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    aud: AudienceClaim,
    #[serde(default)]
    azp: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceClaim {
    Single(String),
    Many(Vec<String>),
}

impl AudienceClaim {
    fn contains(&self, expected: &str) -> bool {
        match self {
            AudienceClaim::Single(value) => value == expected,
            AudienceClaim::Many(values) => values.iter().any(|value| value == expected),
        }
    }
}

/// The authenticated principal attached to a request after OIDC bearer
/// verification. Role is resolved per-property by the tenancy layer, not
/// embedded in the token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub subject: String,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: axum::extract::FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        if !app_state.config.is_production() {
            if let Ok(dev_user) = std::env::var("AUTH_DEV_OVERRIDE_USER") {
                return Ok(CurrentUser {
                    subject: dev_user,
                    email: None,
                });
            }
        }

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

        let jwks = app_state
            .jwks_cache
            .as_ref()
            .ok_or_else(|| AppError::ConfigurationMissing("OIDC is not configured".to_string()))?;
        let audience = app_state
            .config
            .tasks_oidc_audience
            .as_ref()
            .ok_or_else(|| AppError::ConfigurationMissing("TASKS_OIDC_AUDIENCE is not set".to_string()))?;

        verify_bearer_token(token, jwks, &app_state.http_client, audience).await
    }
}

async fn verify_bearer_token(
    token: &str,
    jwks: &JwksCache,
    client: &reqwest::Client,
    audience: &str,
) -> Result<CurrentUser, AppError> {
    let header = decode_header(token).map_err(|_| AppError::Unauthorized("malformed token".to_string()))?;
    let kid = header
        .kid
        .ok_or_else(|| AppError::Unauthorized("token missing kid".to_string()))?;

    let jwks_url = format!("{audience}/.well-known/jwks.json");

    let key = match jwks.get(client, &jwks_url, &kid).await {
        Ok(key) => key,
        Err(_) => {
            jwks.force_refresh(client, &jwks_url).await?;
            jwks.get(client, &jwks_url, &kid).await?
        }
    };

    let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
        .map_err(|err| AppError::Unauthorized(format!("invalid signing key: {err}")))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);

    let claims = match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => data.claims,
        Err(_) => {
            jwks.force_refresh(client, &jwks_url).await?;
            let key = jwks.get(client, &jwks_url, &kid).await?;
            let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
                .map_err(|err| AppError::Unauthorized(format!("invalid signing key: {err}")))?;
            decode::<Claims>(token, &decoding_key, &validation)
                .map_err(|err| AppError::Unauthorized(format!("signature verification failed: {err}")))?
                .claims
        }
    };

    if !claims.aud.contains(audience) {
        return Err(AppError::Unauthorized("audience mismatch".to_string()));
    }
    if claims.iss.trim().is_empty() {
        return Err(AppError::Unauthorized("missing issuer".to_string()));
    }

    Ok(CurrentUser {
        subject: claims.sub,
        email: claims.email,
    })
}

/// Verifies an OIDC ID token minted for the task dispatcher's worker
/// calls, optionally checking the signing service account. Fails closed
/// if the audience is unconfigured — matching the handler-side contract
/// in the task-auth middleware.
pub async fn verify_task_oidc(
    token: &str,
    jwks: &JwksCache,
    client: &reqwest::Client,
    audience: &str,
    expected_service_account: Option<&str>,
) -> Result<(), AppError> {
    let user = verify_bearer_token(token, jwks, client, audience).await?;
    if let Some(expected) = expected_service_account {
        if user.subject != expected {
            return Err(AppError::Unauthorized("unexpected task token subject".to_string()));
        }
    }
    Ok(())
}

pub fn role_at_least(actual: Role, required: Role) -> bool {
    actual >= required
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_respects_hierarchy() {
        assert!(role_at_least(Role::Owner, Role::Staff));
        assert!(!role_at_least(Role::Viewer, Role::Manager));
        assert!(role_at_least(Role::Manager, Role::Manager));
    }
}

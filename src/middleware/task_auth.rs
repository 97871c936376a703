use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::verify_task_oidc;
use crate::error::AppError;
use crate::state::AppState;

/// Task-handler authentication boundary used by every `/tasks/*` route.
///
/// Mirrors the dispatcher's own split between api and worker: under the
/// local-development sentinel audience both
/// sides share an internal secret header; otherwise the caller must
/// present an OIDC bearer token whose audience is `TASKS_OIDC_AUDIENCE`
/// and, if configured, whose subject matches
/// `TASKS_OIDC_SERVICE_ACCOUNT`. Misconfiguration is fatal-closed rather
/// than silently permissive.
pub async fn require_task_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authenticate(&state, &request).await {
        Ok(()) => next.run(request).await,
        Err(error) => error.into_response(),
    }
}

async fn authenticate(state: &AppState, request: &Request) -> Result<(), AppError> {
    if state.config.tasks_local_dev() {
        let expected = state
            .config
            .internal_task_secret
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationMissing("INTERNAL_TASK_SECRET is not set".to_string()))?;

        let provided = request
            .headers()
            .get("x-internal-task-secret")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing internal task secret header".to_string()))?;

        if provided != expected {
            return Err(AppError::Unauthorized("internal task secret mismatch".to_string()));
        }
        return Ok(());
    }

    let jwks = state
        .jwks_cache
        .as_ref()
        .ok_or_else(|| AppError::ConfigurationMissing("OIDC is not configured".to_string()))?;
    let audience = state
        .config
        .tasks_oidc_audience
        .as_deref()
        .ok_or_else(|| AppError::ConfigurationMissing("TASKS_OIDC_AUDIENCE is not set".to_string()))?;

    let header_value = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

    verify_task_oidc(
        token,
        jwks,
        &state.http_client,
        audience,
        state.config.tasks_oidc_service_account.as_deref(),
    )
    .await
}

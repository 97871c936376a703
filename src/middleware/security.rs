use axum::extract::{Request, State};
use axum::http::{header::HOST, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Rejects requests whose `Host` header isn't in `TRUSTED_HOSTS`. A
/// missing `Host` header is rejected too — every real client sends one.
pub async fn enforce_trusted_hosts(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(':').next().unwrap_or(value));

    let Some(host) = host else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };

    let trusted = state
        .config
        .trusted_hosts
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(host));

    if !trusted {
        tracing::warn!(host, "rejected request with untrusted Host header");
        return (StatusCode::BAD_REQUEST, "untrusted host").into_response();
    }

    next.run(request).await
}

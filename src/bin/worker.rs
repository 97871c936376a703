use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::Router;
use hotelly_backend::config::AppConfig;
use hotelly_backend::middleware::request_id::inject_request_id;
use hotelly_backend::routes;
use hotelly_backend::state::AppState;
use hotelly_backend::{init_tracing, shutdown_signal};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The worker binary: only the `/tasks/*` surface. The dispatcher's
/// `http` backend posts here with an OIDC bearer token (or, under the
/// local-development sentinel audience, the shared internal secret);
/// [`hotelly_backend::middleware::task_auth::require_task_auth`] enforces
/// that boundary on every route this binary exposes.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let state = AppState::build(config)?;

    if state.jwks_cache.is_none() {
        tracing::warn!(
            "TASKS_OIDC_AUDIENCE is not set — accepting the local-dev shared secret instead of OIDC"
        );
    }

    let app = Router::new()
        .nest(&state.config.api_prefix, routes::worker_router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(axum::middleware::from_fn(inject_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let socket_addr: SocketAddr =
        format!("{}:{}", state.config.host, state.config.worker_port).parse()?;
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        app_name = %state.config.app_name,
        environment = %state.config.environment,
        "worker listening"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

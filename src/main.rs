use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::Router;
use hotelly_backend::config::AppConfig;
use hotelly_backend::middleware::cors::build_cors_layer;
use hotelly_backend::middleware::request_id::inject_request_id;
use hotelly_backend::middleware::security::enforce_trusted_hosts;
use hotelly_backend::state::AppState;
use hotelly_backend::{init_tracing, routes, shutdown_signal};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The api binary: the full HTTP surface, including the inbound webhooks
/// and the dashboard-facing settings/payment/folio routes. Scheduled work
/// dispatched by [`hotelly_backend::services::tasks`] is handled by the
/// separate `hotelly-worker` binary.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let state = AppState::build(config)?;

    if state.jwks_cache.is_none() {
        tracing::warn!(
            "TASKS_OIDC_AUDIENCE is not set — /tasks/* routes accept the local-dev shared secret"
        );
    }

    let mut app = Router::new()
        .nest(&state.config.api_prefix, routes::v1_router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2 MB
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(axum::middleware::from_fn(inject_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            enforce_trusted_hosts,
        ))
        .with_state(state.clone());

    if state.config.rate_limit_enabled_runtime() {
        let governor_config = GovernorConfigBuilder::default()
            .per_second(state.config.rate_limit_per_second)
            .burst_size(state.config.rate_limit_burst_size)
            .finish()
            .expect("valid governor config");
        app = app.layer(GovernorLayer::new(governor_config));
    } else {
        tracing::warn!("Rate limiting middleware disabled");
    }

    let socket_addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        app_name = %state.config.app_name,
        environment = %state.config.environment,
        api_prefix = %state.config.api_prefix,
        "api listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

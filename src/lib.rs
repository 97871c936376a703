#![allow(dead_code)]

pub mod auth;
pub mod config;
pub mod correlation;
pub mod db;
pub mod error;
pub mod hashing;
pub mod middleware;
pub mod models;
pub mod redaction;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;
pub mod tenancy;
pub mod time;
pub mod whatsapp;

use tracing_subscriber::EnvFilter;

/// Shared by both the api and worker binaries so their startup logging
/// is configured identically.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Graceful-shutdown future shared by both binaries: in-flight handlers
/// are not externally cancellable, so both SIGTERM and Ctrl-C only stop
/// new requests from being accepted.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("Shutdown signal received, finishing in-flight requests");
}

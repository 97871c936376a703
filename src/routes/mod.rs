use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;

use crate::middleware::task_auth::require_task_auth;
use crate::state::AppState;

pub mod cancellation_policy;
pub mod child_policies;
pub mod health;
pub mod payments;
pub mod rates;
pub mod reservations;
pub mod tasks;
pub mod webhooks;

/// Core HTTP surface. Everything under `/tasks` additionally requires
/// [`require_task_auth`]; webhook routes authenticate the provider's own
/// signature scheme instead of a bearer token.
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/webhooks/whatsapp/evolution",
            post(webhooks::evolution_webhook),
        )
        .route("/webhooks/whatsapp/meta", post(webhooks::meta_webhook))
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/rates", get(rates::list_rates).put(rates::put_rates))
        .route(
            "/child-policies",
            get(child_policies::get_child_policies).put(child_policies::put_child_policies),
        )
        .route(
            "/cancellation-policy",
            get(cancellation_policy::get_cancellation_policy)
                .put(cancellation_policy::put_cancellation_policy),
        )
        .merge(payments::router())
        .merge(reservations::router())
        .nest("/tasks", task_router())
}

/// Standalone router for the `hotelly-worker` binary: just the
/// `/tasks/*` surface the dispatcher's `http` backend posts to, mounted
/// under `health` for load-balancer probes.
pub fn worker_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .nest("/tasks", task_router())
}

fn task_router() -> Router<AppState> {
    Router::new()
        .route("/holds/expire", post(tasks::expire_hold))
        .route("/stripe/handle-event", post(tasks::handle_stripe_event))
        .route(
            "/whatsapp/send-message",
            post(tasks::send_whatsapp_message),
        )
        .route(
            "/conversations/handle-inbound",
            post(tasks::handle_inbound_conversation),
        )
        .route_layer(from_fn(require_task_auth))
}

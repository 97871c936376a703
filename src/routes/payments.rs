use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::AppResult;
use crate::state::AppState;
use crate::tenancy::PropertyContext;

/// `POST /payments/holds/{hold_id}/checkout` creates (or returns the
/// existing) Stripe Checkout Session for an active hold.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/payments/holds/{hold_id}/checkout",
        axum::routing::post(create_checkout),
    )
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    checkout_url: String,
}

async fn create_checkout(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Path(hold_id): Path<Uuid>,
) -> AppResult<Json<CheckoutResponse>> {
    ctx.require_role(Role::Staff)?;

    let checkout_url = crate::services::payments::create_checkout_session(
        &state.db_pool,
        &state.http_client,
        &state.config,
        ctx.property_id,
        hold_id,
    )
    .await?;

    Ok(Json(CheckoutResponse { checkout_url }))
}

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::error::{AppError, AppResult};
use crate::models::reservation::{
    ExtraPricingMode, FolioPayment, FolioPaymentMethod, FolioSummary, ReservationExtra,
};
use crate::services::{cancellation, extras, folio};
use crate::state::AppState;
use crate::tenancy::PropertyContext;

/// Folio payment recording, folio summaries, extras, and reservation
/// cancellation.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/reservations/{id}/payments",
            axum::routing::post(add_folio_payment),
        )
        .route(
            "/reservations/{id}/folio",
            axum::routing::get(get_folio),
        )
        .route(
            "/reservations/{id}/extras",
            axum::routing::post(add_extra),
        )
        .route(
            "/reservations/{id}/cancel",
            axum::routing::post(cancel_reservation),
        )
}

#[derive(Debug, Deserialize)]
pub struct AddFolioPaymentRequest {
    amount_cents: i64,
    method: FolioPaymentMethod,
}

async fn add_folio_payment(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Path(reservation_id): Path<Uuid>,
    Json(body): Json<AddFolioPaymentRequest>,
) -> AppResult<Json<FolioPayment>> {
    ctx.require_role(Role::Staff)?;

    let payment = folio::record_payment(
        &state.db_pool,
        ctx.property_id,
        reservation_id,
        body.amount_cents,
        body.method,
    )
    .await?;

    Ok(Json(payment))
}

async fn get_folio(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Path(reservation_id): Path<Uuid>,
) -> AppResult<Json<FolioSummary>> {
    ctx.require_role(Role::Viewer)?;

    let summary = folio::get_summary(&state.db_pool, ctx.property_id, reservation_id).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct AddExtraRequest {
    name: String,
    pricing_mode: ExtraPricingMode,
    unit_price_cents: i64,
    quantity: i32,
}

async fn add_extra(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Path(reservation_id): Path<Uuid>,
    Json(body): Json<AddExtraRequest>,
) -> AppResult<Json<ReservationExtra>> {
    ctx.require_role(Role::Staff)?;

    let extra = extras::add_extra(
        &state.db_pool,
        ctx.property_id,
        reservation_id,
        &body.name,
        body.pricing_mode,
        body.unit_price_cents,
        body.quantity,
    )
    .await?;

    Ok(Json(extra))
}

#[derive(Debug, Deserialize)]
pub struct CancelReservationRequest {
    #[serde(default = "default_reason")]
    reason: String,
}

fn default_reason() -> String {
    "guest_requested".to_string()
}

async fn cancel_reservation(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Path(reservation_id): Path<Uuid>,
    Json(body): Json<CancelReservationRequest>,
) -> AppResult<Json<cancellation::CancelOutcome>> {
    ctx.require_role(Role::Staff)?;

    let actor = ctx.user.email.clone().unwrap_or_else(|| ctx.user.subject.clone());
    let outcome = cancellation::cancel_reservation(
        &state.db_pool,
        ctx.property_id,
        reservation_id,
        &body.reason,
        &actor,
    )
    .await
    .map_err(|err| match err {
        AppError::UnprocessableEntity(_) => AppError::Conflict("NotCancellable".to_string()),
        other => other,
    })?;

    Ok(Json(outcome))
}

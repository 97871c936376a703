use axum::extract::State;
use axum::Json;

use crate::auth::Role;
use crate::error::AppResult;
use crate::models::property::CancellationPolicy;
use crate::repository::properties;
use crate::state::AppState;
use crate::tenancy::PropertyContext;

pub async fn get_cancellation_policy(
    State(state): State<AppState>,
    ctx: PropertyContext,
) -> AppResult<Json<CancellationPolicy>> {
    ctx.require_role(Role::Viewer)?;
    let policy = properties::get_cancellation_policy(&state.db_pool, ctx.property_id).await?;
    Ok(Json(policy))
}

pub async fn put_cancellation_policy(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Json(policy): Json<CancellationPolicy>,
) -> AppResult<Json<CancellationPolicy>> {
    ctx.require_role(Role::Staff)?;
    properties::put_cancellation_policy(&state.db_pool, ctx.property_id, &policy).await?;
    Ok(Json(policy))
}

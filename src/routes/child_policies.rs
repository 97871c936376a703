use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::Role;
use crate::error::{AppError, AppResult};
use crate::models::ari::ChildAgeBucket;
use crate::repository::child_buckets;
use crate::state::AppState;
use crate::tenancy::PropertyContext;

pub async fn get_child_policies(
    State(state): State<AppState>,
    ctx: PropertyContext,
) -> AppResult<Json<Vec<ChildAgeBucket>>> {
    ctx.require_role(Role::Viewer)?;
    let buckets = child_buckets::get(&state.db_pool, ctx.property_id).await?;
    Ok(Json(buckets))
}

#[derive(Debug, Deserialize)]
pub struct BucketInput {
    bucket_number: i16,
    min_age: i16,
    max_age: i16,
}

#[derive(Debug, Deserialize)]
pub struct PutChildPoliciesRequest {
    buckets: Vec<BucketInput>,
}

pub async fn put_child_policies(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Json(request): Json<PutChildPoliciesRequest>,
) -> AppResult<Json<Vec<ChildAgeBucket>>> {
    ctx.require_role(Role::Staff)?;

    let buckets: Vec<ChildAgeBucket> = request
        .buckets
        .into_iter()
        .map(|input| ChildAgeBucket {
            property_id: ctx.property_id,
            bucket_number: input.bucket_number,
            min_age: input.min_age,
            max_age: input.max_age,
        })
        .collect();

    ChildAgeBucket::validate_partition(&buckets).map_err(AppError::BadRequest)?;

    child_buckets::put(&state.db_pool, ctx.property_id, &buckets).await?;
    Ok(Json(buckets))
}

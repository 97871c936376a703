use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::{AppError, AppResult};
use crate::models::ari::RateDay;
use crate::repository::rates;
use crate::state::AppState;
use crate::tenancy::PropertyContext;

/// `PUT /rates` never touches more than a year of nights for a single
/// room type in one call.
const MAX_RATE_ROWS: usize = 366;

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
    room_type_id: Option<Uuid>,
}

pub async fn list_rates(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Query(query): Query<RatesQuery>,
) -> AppResult<Json<Vec<RateDay>>> {
    ctx.require_role(Role::Viewer)?;

    if query.start_date >= query.end_date {
        return Err(AppError::BadRequest("start_date must be before end_date".to_string()));
    }

    let rows = rates::get_range(
        &state.db_pool,
        ctx.property_id,
        query.room_type_id,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct RateDayInput {
    room_type_id: Uuid,
    date: NaiveDate,
    price_1pax_cents: Option<i64>,
    price_2pax_cents: Option<i64>,
    price_3pax_cents: Option<i64>,
    price_4pax_cents: Option<i64>,
    child_bucket_1_cents: Option<i64>,
    child_bucket_2_cents: Option<i64>,
    child_bucket_3_cents: Option<i64>,
    min_los: Option<i32>,
    max_los: Option<i32>,
    #[serde(default)]
    closed_checkin: bool,
    #[serde(default)]
    closed_checkout: bool,
    #[serde(default)]
    is_blocked: bool,
}

#[derive(Debug, Deserialize)]
pub struct PutRatesRequest {
    rates: Vec<RateDayInput>,
}

#[derive(Debug, Serialize)]
pub struct PutRatesResponse {
    upserted: usize,
}

pub async fn put_rates(
    State(state): State<AppState>,
    ctx: PropertyContext,
    Json(request): Json<PutRatesRequest>,
) -> AppResult<Json<PutRatesResponse>> {
    ctx.require_role(Role::Staff)?;

    if request.rates.is_empty() {
        return Err(AppError::BadRequest("rates must not be empty".to_string()));
    }
    if request.rates.len() > MAX_RATE_ROWS {
        return Err(AppError::BadRequest(format!(
            "rates must not exceed {MAX_RATE_ROWS} rows per call"
        )));
    }

    for input in &request.rates {
        let rate = RateDay {
            property_id: ctx.property_id,
            room_type_id: input.room_type_id,
            date: input.date,
            price_1pax_cents: input.price_1pax_cents,
            price_2pax_cents: input.price_2pax_cents,
            price_3pax_cents: input.price_3pax_cents,
            price_4pax_cents: input.price_4pax_cents,
            child_bucket_1_cents: input.child_bucket_1_cents,
            child_bucket_2_cents: input.child_bucket_2_cents,
            child_bucket_3_cents: input.child_bucket_3_cents,
            min_los: input.min_los,
            max_los: input.max_los,
            closed_checkin: input.closed_checkin,
            closed_checkout: input.closed_checkout,
            is_blocked: input.is_blocked,
        };
        rates::upsert(&state.db_pool, &rate).await?;
    }

    Ok(Json(PutRatesResponse {
        upserted: request.rates.len(),
    }))
}

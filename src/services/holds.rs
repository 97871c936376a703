use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult, OptionExt};
use crate::models::hold::{CreateHoldResult, Hold, HoldStatus};
use crate::models::outbox::OutboxPayload;
use crate::models::task::TaskPayload;
use crate::repository::{ari, holds as holds_repo};
use crate::services::outbox;
use crate::services::tasks::TaskDispatcher;

/// Default time a hold reserves inventory before it is auto-expired,
/// grounded on `original_source/domain/holds.py::DEFAULT_HOLD_TTL_MINUTES`.
pub const DEFAULT_HOLD_TTL_MINUTES: i64 = 15;

#[allow(clippy::too_many_arguments)]
pub struct CreateHoldInput<'a> {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub checkin: chrono::NaiveDate,
    pub checkout: chrono::NaiveDate,
    pub total_cents: i64,
    pub currency: &'a str,
    pub create_idempotency_key: &'a str,
    pub conversation_id: Option<Uuid>,
    pub adult_count: i16,
    pub children_ages: &'a [i16],
    pub guest_name: Option<&'a str>,
    pub guest_email: Option<&'a str>,
    pub guest_phone: Option<&'a str>,
    pub correlation_id: Option<String>,
}

/// Places a hold on inventory for every night in `[checkin, checkout)`.
///
/// Runs the insert and per-night inventory increments inside one
/// `SERIALIZABLE` transaction, grounded on
/// `original_source/domain/holds.py::create_hold`:
///
/// 1. Idempotent insert on `(property_id, create_idempotency_key)`. A
///    replay short-circuits here with `created = false` and skips steps
///    2-4 entirely — the inventory was already reserved the first time.
/// 2. For each night, in date order, the guarded `try_increment_held`
///    UPDATE is the sole enforcement of zero-overbooking. The first
///    night that fails aborts the whole transaction via `Unavailable`,
///    rolling back any increments already applied this call.
/// 3. One `hold_nights` row per successfully held night.
/// 4. `HOLD_CREATED` is appended to the outbox in the same transaction.
///
/// After commit — on both the fresh and replayed branches — an
/// `expire-hold:{property}:{hold}` task is enqueued for `expires_at`.
/// Task-id dedup makes this safe to call again on every replay without
/// risking a second expiration job.
pub async fn create_hold(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    input: CreateHoldInput<'_>,
) -> AppResult<CreateHoldResult> {
    let mut tx = db::begin_serializable(pool).await?;

    let expires_at = Utc::now() + Duration::minutes(DEFAULT_HOLD_TTL_MINUTES);

    let new_hold = holds_repo::NewHold {
        property_id: input.property_id,
        room_type_id: input.room_type_id,
        checkin: input.checkin,
        checkout: input.checkout,
        expires_at,
        total_cents: input.total_cents,
        currency: input.currency,
        create_idempotency_key: input.create_idempotency_key,
        conversation_id: input.conversation_id,
        adult_count: input.adult_count,
        children_ages: input.children_ages,
        guest_name: input.guest_name,
        guest_email: input.guest_email,
        guest_phone: input.guest_phone,
    };

    let (hold, created) = holds_repo::insert_hold(&mut tx, &new_hold).await?;

    if created {
        let mut current = hold.checkin;
        while current < hold.checkout {
            let incremented =
                ari::try_increment_held(&mut *tx, hold.property_id, input.room_type_id, current).await?;
            if !incremented {
                return Err(AppError::Unavailable(format!(
                    "no inventory available for {current} in room type {room_type_id}",
                    room_type_id = input.room_type_id
                )));
            }
            holds_repo::insert_hold_night(&mut *tx, hold.id, hold.property_id, input.room_type_id, current, 1)
                .await?;
            current += Duration::days(1);
        }

        outbox::emit(
            &mut tx,
            hold.property_id,
            hold.id,
            OutboxPayload::HoldCreated {
                room_type_id: input.room_type_id,
                checkin: hold.checkin,
                checkout: hold.checkout,
                nights: hold.nights(),
                total_cents: hold.total_cents,
                currency: hold.currency.clone(),
            },
            None,
        )
        .await?;
    }

    tx.commit().await?;

    enqueue_expiration(tasks, &hold, input.correlation_id).await?;

    Ok(CreateHoldResult { hold, created })
}

async fn enqueue_expiration(
    tasks: &TaskDispatcher,
    hold: &Hold,
    correlation_id: Option<String>,
) -> AppResult<()> {
    let task_id = format!("expire-hold:{}:{}", hold.property_id, hold.id);
    let payload = TaskPayload::ExpireHold {
        property_id: hold.property_id,
        hold_id: hold.id,
        correlation_id,
    };
    tasks
        .enqueue(task_id, payload, Some(hold.expires_at))
        .await
}

/// Expires a hold and releases its nights back to availability (spec
/// §4.F Hold Expiration, grounded on
/// `original_source/domain/expire_hold.py::expire_hold`).
///
/// Order matters: the hold is locked and checked for "missing" and "not
/// yet expired" *before* the dedup ledger row is inserted, so a task
/// that fires early (clock skew, at-least-once redelivery before
/// `expires_at`) can be retried later without burning its one dedup
/// slot. Only once expiration is actually going to happen does the
/// ledger insert become the point of no return for this `task_id`.
pub async fn expire_hold(pool: &PgPool, task_id: &str, property_id: Uuid, hold_id: Uuid) -> AppResult<()> {
    let mut tx = db::begin(pool).await?;

    let Some(hold) = holds_repo::lock_hold(&mut *tx, hold_id).await? else {
        tx.commit().await?;
        return Ok(());
    };

    if hold.status != HoldStatus::Active {
        tx.commit().await?;
        return Ok(());
    }

    if Utc::now() < hold.expires_at {
        tx.commit().await?;
        return Ok(());
    }

    let is_new = crate::repository::processed_events::insert_if_new(
        &mut *tx,
        property_id,
        "tasks.holds.expire",
        task_id,
    )
    .await?;
    if !is_new {
        tx.commit().await?;
        return Ok(());
    }

    let nights = holds_repo::get_hold_nights(&mut *tx, hold.id).await?;
    for night in &nights {
        let decremented =
            ari::try_decrement_held(&mut *tx, night.property_id, night.room_type_id, night.date, night.qty)
                .await?;
        if !decremented {
            return Err(AppError::InventoryConsistency(format!(
                "inv_held underflow releasing hold {hold_id} night {date}",
                date = night.date
            )));
        }
    }

    holds_repo::set_status(&mut *tx, hold.id, HoldStatus::Expired).await?;

    outbox::emit(
        &mut tx,
        hold.property_id,
        hold.id,
        OutboxPayload::HoldExpired {
            room_type_id: nights.first().map(|n| n.room_type_id),
            checkin: Some(hold.checkin),
            checkout: Some(hold.checkout),
            nights_released: nights.len() as i64,
            total_cents: hold.total_cents,
            currency: hold.currency.clone(),
        },
        None,
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Fetches a hold by id, used by the payment broker and reservation
/// conversion paths that need a read-only view outside a transaction.
pub async fn get_hold(pool: &PgPool, hold_id: Uuid) -> AppResult<Hold> {
    holds_repo::get_hold(pool, hold_id)
        .await?
        .ok_or_not_found("hold")
}

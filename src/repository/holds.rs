use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::db::Tx;
use crate::models::hold::{Hold, HoldNight, HoldStatus};

const HOLD_COLUMNS: &str = "id, property_id, room_type_id, checkin, checkout, expires_at,
         total_cents, currency, status, conversation_id, create_idempotency_key,
         adult_count, children_ages, guest_name, guest_email, guest_phone";

#[allow(clippy::too_many_arguments)]
pub struct NewHold<'a> {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub expires_at: DateTime<Utc>,
    pub total_cents: i64,
    pub currency: &'a str,
    pub create_idempotency_key: &'a str,
    pub conversation_id: Option<Uuid>,
    pub adult_count: i16,
    pub children_ages: &'a [i16],
    pub guest_name: Option<&'a str>,
    pub guest_email: Option<&'a str>,
    pub guest_phone: Option<&'a str>,
}

/// Inserts a hold idempotently on `(property_id, create_idempotency_key)`.
/// Returns the existing row and `created = false` on replay.
pub async fn insert_hold(tx: &mut Tx<'_>, new: &NewHold<'_>) -> Result<(Hold, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, Hold>(&format!(
        "INSERT INTO holds (
            property_id, room_type_id, checkin, checkout, expires_at,
            total_cents, currency, create_idempotency_key,
            conversation_id, adult_count, children_ages,
            guest_name, guest_email, guest_phone
         )
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
         ON CONFLICT (property_id, create_idempotency_key)
         WHERE create_idempotency_key IS NOT NULL
         DO NOTHING
         RETURNING {HOLD_COLUMNS}"
    ))
    .bind(new.property_id)
    .bind(new.room_type_id)
    .bind(new.checkin)
    .bind(new.checkout)
    .bind(new.expires_at)
    .bind(new.total_cents)
    .bind(new.currency)
    .bind(new.create_idempotency_key)
    .bind(new.conversation_id)
    .bind(new.adult_count)
    .bind(new.children_ages)
    .bind(new.guest_name)
    .bind(new.guest_email)
    .bind(new.guest_phone)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(hold) = inserted {
        return Ok((hold, true));
    }

    let existing = sqlx::query_as::<_, Hold>(&format!(
        "SELECT {HOLD_COLUMNS} FROM holds
         WHERE property_id = $1 AND create_idempotency_key = $2"
    ))
    .bind(new.property_id)
    .bind(new.create_idempotency_key)
    .fetch_one(&mut **tx)
    .await?;

    Ok((existing, false))
}

pub async fn get_hold<'c, E>(executor: E, hold_id: Uuid) -> Result<Option<Hold>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Hold>(&format!("SELECT {HOLD_COLUMNS} FROM holds WHERE id = $1"))
        .bind(hold_id)
        .fetch_optional(executor)
        .await
}

/// Locks a hold row for update within the caller's transaction. Used by
/// expiration and conversion, both of which must serialize against each
/// other per hold.
pub async fn lock_hold<'c, E>(executor: E, hold_id: Uuid) -> Result<Option<Hold>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Hold>(&format!("SELECT {HOLD_COLUMNS} FROM holds WHERE id = $1 FOR UPDATE"))
        .bind(hold_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert_hold_night<'c, E>(
    executor: E,
    hold_id: Uuid,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
    qty: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO hold_nights (hold_id, property_id, room_type_id, date, qty)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(hold_id)
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .bind(qty)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_hold_nights<'c, E>(executor: E, hold_id: Uuid) -> Result<Vec<HoldNight>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, HoldNight>(
        "SELECT hold_id, property_id, room_type_id, date, qty
         FROM hold_nights WHERE hold_id = $1 ORDER BY date",
    )
    .bind(hold_id)
    .fetch_all(executor)
    .await
}

pub async fn set_status<'c, E>(executor: E, hold_id: Uuid, status: HoldStatus) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE holds SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(hold_id)
        .execute(executor)
        .await?;
    Ok(())
}

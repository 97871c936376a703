use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::ari::AriDay;

pub async fn get_day<'c, E>(
    executor: E,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
) -> Result<Option<AriDay>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, AriDay>(
        "SELECT property_id, room_type_id, date, inv_total, inv_booked, inv_held,
                currency, base_rate_cents
         FROM ari_days
         WHERE property_id = $1 AND room_type_id = $2 AND date = $3",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .fetch_optional(executor)
    .await
}

pub async fn get_range<'c, E>(
    executor: E,
    property_id: Uuid,
    room_type_id: Uuid,
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Result<Vec<AriDay>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, AriDay>(
        "SELECT property_id, room_type_id, date, inv_total, inv_booked, inv_held,
                currency, base_rate_cents
         FROM ari_days
         WHERE property_id = $1 AND room_type_id = $2 AND date >= $3 AND date < $4
         ORDER BY date",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(start)
    .bind(end_exclusive)
    .fetch_all(executor)
    .await
}

/// `UPDATE ari_days SET inv_held = inv_held + 1 WHERE inv_total >=
/// inv_booked + inv_held + 1`. Returns `true` iff the guarded UPDATE
/// affected a row — the sole enforcement point for zero-overbooking
///.
pub async fn try_increment_held<'c, E>(
    executor: E,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "UPDATE ari_days
            SET inv_held = inv_held + 1, updated_at = now()
          WHERE property_id = $1 AND room_type_id = $2 AND date = $3
            AND inv_total >= inv_booked + inv_held + 1",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// `UPDATE ari_days SET inv_held = inv_held - qty WHERE inv_held >= qty`.
/// A zero-row result is a consistency error — the caller must surface
/// `InventoryConsistency`.
pub async fn try_decrement_held<'c, E>(
    executor: E,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
    qty: i32,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "UPDATE ari_days
            SET inv_held = inv_held - $4, updated_at = now()
          WHERE property_id = $1 AND room_type_id = $2 AND date = $3
            AND inv_held >= $4",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .bind(qty)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Decrements `inv_booked` by one for a single night, used by
/// cancellation. Never guarded by a floor check —
/// a cancellation always releases exactly the inventory its reservation
/// held.
pub async fn decrement_booked<'c, E>(
    executor: E,
    property_id: Uuid,
    room_type_id: Uuid,
    date: NaiveDate,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "UPDATE ari_days SET inv_booked = inv_booked - 1, updated_at = now()
         WHERE property_id = $1 AND room_type_id = $2 AND date = $3",
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(date)
    .execute(executor)
    .await?;
    Ok(())
}

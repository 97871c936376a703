use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::property::CancellationPolicy;
use crate::models::reservation::PendingRefund;

pub async fn insert<'c, E>(
    executor: E,
    property_id: Uuid,
    reservation_id: Uuid,
    amount_cents: i64,
    policy_applied: &CancellationPolicy,
) -> Result<PendingRefund, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, PendingRefund>(
        "INSERT INTO pending_refunds (property_id, reservation_id, amount_cents, policy_applied)
         VALUES ($1, $2, $3, $4)
         RETURNING id, property_id, reservation_id, amount_cents, policy_applied, created_at",
    )
    .bind(property_id)
    .bind(reservation_id)
    .bind(amount_cents)
    .bind(sqlx::types::Json(policy_applied))
    .fetch_one(executor)
    .await
}

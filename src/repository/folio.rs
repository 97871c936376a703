use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::reservation::{FolioPayment, FolioPaymentMethod, FolioPaymentStatus, ReservationExtra};

pub async fn insert_payment<'c, E>(
    executor: E,
    property_id: Uuid,
    reservation_id: Uuid,
    amount_cents: i64,
    method: FolioPaymentMethod,
) -> Result<FolioPayment, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, FolioPayment>(
        "INSERT INTO folio_payments (property_id, reservation_id, amount_cents, method, status)
         VALUES ($1, $2, $3, $4, 'captured')
         RETURNING id, property_id, reservation_id, amount_cents, method, status, created_at",
    )
    .bind(property_id)
    .bind(reservation_id)
    .bind(amount_cents)
    .bind(method)
    .fetch_one(executor)
    .await
}

pub async fn void_payment<'c, E>(executor: E, property_id: Uuid, payment_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "UPDATE folio_payments SET status = $1 WHERE id = $2 AND property_id = $3",
    )
    .bind(FolioPaymentStatus::Voided)
    .bind(payment_id)
    .bind(property_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_payments<'c, E>(executor: E, reservation_id: Uuid) -> Result<Vec<FolioPayment>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, FolioPayment>(
        "SELECT id, property_id, reservation_id, amount_cents, method, status, created_at
         FROM folio_payments WHERE reservation_id = $1 ORDER BY created_at",
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await
}

pub async fn list_extras<'c, E>(executor: E, reservation_id: Uuid) -> Result<Vec<ReservationExtra>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ReservationExtra>(
        "SELECT id, property_id, reservation_id, name, pricing_mode, unit_price_cents, quantity, total_price_cents
         FROM reservation_extras WHERE reservation_id = $1 ORDER BY name",
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_extra<'c, E>(executor: E, extra: &ReservationExtra) -> Result<ReservationExtra, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ReservationExtra>(
        "INSERT INTO reservation_extras
            (property_id, reservation_id, name, pricing_mode, unit_price_cents, quantity, total_price_cents)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, property_id, reservation_id, name, pricing_mode, unit_price_cents, quantity, total_price_cents",
    )
    .bind(extra.property_id)
    .bind(extra.reservation_id)
    .bind(&extra.name)
    .bind(extra.pricing_mode)
    .bind(extra.unit_price_cents)
    .bind(extra.quantity)
    .bind(extra.total_price_cents)
    .fetch_one(executor)
    .await
}

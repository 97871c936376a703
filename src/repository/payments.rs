use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::db::Tx;
use crate::models::payment::{Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str = "id, property_id, hold_id, provider, provider_object_id,
         status, amount_cents, currency";

pub async fn find_by_hold<'c, E>(executor: E, hold_id: Uuid, provider: &str) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE hold_id = $1 AND provider = $2"
    ))
    .bind(hold_id)
    .bind(provider)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_provider_object<'c, E>(
    executor: E,
    property_id: Uuid,
    provider: &str,
    provider_object_id: &str,
) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments
         WHERE property_id = $1 AND provider = $2 AND provider_object_id = $3"
    ))
    .bind(property_id)
    .bind(provider)
    .bind(provider_object_id)
    .fetch_optional(executor)
    .await
}

/// Resolves the property a Stripe object belongs to without knowing it
/// in advance — the Stripe webhook's only identifying fact is the
/// provider's own object id, so `property_id` can't be taken from a
/// header or any other caller-supplied input. Grounded on
/// `original_source/api/routes/webhooks_stripe.py::_resolve_property_id`.
pub async fn find_by_provider_object_any_property<'c, E>(
    executor: E,
    provider: &str,
    provider_object_id: &str,
) -> Result<Option<Payment>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments
         WHERE provider = $1 AND provider_object_id = $2
         LIMIT 1"
    ))
    .bind(provider)
    .bind(provider_object_id)
    .fetch_optional(executor)
    .await
}

#[allow(clippy::too_many_arguments)]
pub struct NewPayment<'a> {
    pub property_id: Uuid,
    pub hold_id: Uuid,
    pub provider: &'a str,
    pub provider_object_id: &'a str,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub currency: &'a str,
}

/// Inserts a payment idempotently on `(property_id, provider,
/// provider_object_id)`, re-reading the existing row on conflict so the
/// checkout-session path never creates a duplicate provider object
///.
pub async fn insert(tx: &mut Tx<'_>, new: &NewPayment<'_>) -> Result<Payment, sqlx::Error> {
    let inserted = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (property_id, hold_id, provider, provider_object_id, status, amount_cents, currency)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         ON CONFLICT (property_id, provider, provider_object_id) DO NOTHING
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(new.property_id)
    .bind(new.hold_id)
    .bind(new.provider)
    .bind(new.provider_object_id)
    .bind(new.status)
    .bind(new.amount_cents)
    .bind(new.currency)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(payment) = inserted {
        return Ok(payment);
    }

    sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments
         WHERE property_id = $1 AND provider = $2 AND provider_object_id = $3"
    ))
    .bind(new.property_id)
    .bind(new.provider)
    .bind(new.provider_object_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn set_status<'c, E>(executor: E, payment_id: Uuid, status: PaymentStatus) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE payments SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(payment_id)
        .execute(executor)
        .await?;
    Ok(())
}

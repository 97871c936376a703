use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::outbox::OutboxPayload;

/// Writes one append-only outbox row in the caller's transaction, the
/// same transaction that produced the state change the event describes.
/// Returns the generated event id.
pub async fn emit_event<'c, E>(
    executor: E,
    property_id: Uuid,
    aggregate_id: Uuid,
    payload: &OutboxPayload,
    correlation_id: Option<Uuid>,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "INSERT INTO outbox_events
            (property_id, event_type, aggregate_type, aggregate_id, payload, correlation_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(property_id)
    .bind(payload.event_type())
    .bind(payload.aggregate_type())
    .bind(aggregate_id)
    .bind(sqlx::types::Json(payload))
    .bind(correlation_id)
    .fetch_one(executor)
    .await
}

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Upserts the encrypted inbound message text on `(property_id,
/// message_id)`. The ciphertext is opaque to this layer — encryption
/// happens in [`crate::services::pii_vault`].
pub async fn upsert(
    pool: &PgPool,
    property_id: Uuid,
    message_id: &str,
    ciphertext_b64: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inbound_message_texts (property_id, message_id, text_enc, expires_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (property_id, message_id) DO UPDATE
         SET text_enc = EXCLUDED.text_enc,
             expires_at = EXCLUDED.expires_at",
    )
    .bind(property_id)
    .bind(message_id)
    .bind(ciphertext_b64)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deletes and returns the ciphertext for `(property_id, message_id)` in
/// one statement, or `None` if absent/expired. A row is consumed at most
/// once: the worker task handler that calls this is the only reader,
/// and a retried delivery after a successful take finds nothing left.
pub async fn take_ciphertext(
    pool: &PgPool,
    property_id: Uuid,
    message_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "DELETE FROM inbound_message_texts
         WHERE property_id = $1 AND message_id = $2 AND expires_at > now()
         RETURNING text_enc",
    )
    .bind(property_id)
    .bind(message_id)
    .fetch_optional(pool)
    .await
}

/// Deletes every inbound message text whose expiry has passed, for rows
/// that were never consumed (e.g. the worker task never ran). Returns
/// the number of rows removed.
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM inbound_message_texts WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

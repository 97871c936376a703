use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Upserts the encrypted contact ref on `(property_id, channel,
/// contact_hash)`. The ciphertext is opaque to this layer — encryption
/// happens in [`crate::services::pii_vault`].
pub async fn upsert(
    pool: &PgPool,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
    ciphertext_b64: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO contact_refs (property_id, channel, contact_hash, remote_jid_enc, expires_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (property_id, channel, contact_hash) DO UPDATE
         SET remote_jid_enc = EXCLUDED.remote_jid_enc,
             expires_at = EXCLUDED.expires_at",
    )
    .bind(property_id)
    .bind(channel)
    .bind(contact_hash)
    .bind(ciphertext_b64)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns the raw ciphertext for a non-expired contact ref, or `None` if
/// absent/expired. Decryption happens in the PII vault service.
pub async fn get_ciphertext(
    pool: &PgPool,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT remote_jid_enc FROM contact_refs
         WHERE property_id = $1 AND channel = $2 AND contact_hash = $3 AND expires_at > now()",
    )
    .bind(property_id)
    .bind(channel)
    .bind(contact_hash)
    .fetch_optional(pool)
    .await
}

/// Deletes every contact ref whose expiry has passed. Returns the number
/// of rows removed.
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contact_refs WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

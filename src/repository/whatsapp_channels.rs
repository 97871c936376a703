use sqlx::PgPool;
use uuid::Uuid;

/// Resolves which property owns a given WhatsApp channel endpoint.
///
/// The Evolution webhook route is handed `property_id` directly via the
/// `X-Property-Id` header, since each Evolution instance is
/// already provisioned per property. Meta's webhook carries no such
/// header — every property's WhatsApp Business number posts to the same
/// Graph API callback URL — so the only identifying fact in the payload
/// is the `phone_number_id` Meta routed the message through. This table
/// is the one place that maps it back to a property.
pub async fn find_property_id(pool: &PgPool, channel: &str, external_id: &str) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT property_id FROM whatsapp_channels WHERE channel = $1 AND external_id = $2",
    )
    .bind(channel)
    .bind(external_id)
    .fetch_optional(pool)
    .await
}

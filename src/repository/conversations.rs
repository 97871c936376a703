use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::conversation::{BookingContext, Conversation, ConversationState, QuoteOption};

/// Locks the conversation row for `(property_id, channel, contact_hash)`
/// if it exists, for the caller to advance within the same transaction.
pub async fn lock_by_contact<'c, E>(
    executor: E,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
) -> Result<Option<Conversation>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Conversation>(
        "SELECT id, property_id, channel, contact_hash, state, context, last_activity_at
         FROM conversations
         WHERE property_id = $1 AND channel = $2 AND contact_hash = $3
         FOR UPDATE",
    )
    .bind(property_id)
    .bind(channel)
    .bind(contact_hash)
    .fetch_optional(executor)
    .await
}

/// Fetches a conversation by id, used by reservation conversion to look
/// up the channel/contact_hash to notify once a hold becomes a
/// reservation.
pub async fn get<'c, E>(executor: E, conversation_id: Uuid) -> Result<Option<Conversation>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Conversation>(
        "SELECT id, property_id, channel, contact_hash, state, context, last_activity_at
         FROM conversations WHERE id = $1",
    )
    .bind(conversation_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_new<'c, E>(
    executor: E,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
    context: &BookingContext,
) -> Result<Conversation, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Conversation>(
        "INSERT INTO conversations (property_id, channel, contact_hash, state, context, last_activity_at)
         VALUES ($1, $2, $3, 'start', $4, now())
         RETURNING id, property_id, channel, contact_hash, state, context, last_activity_at",
    )
    .bind(property_id)
    .bind(channel)
    .bind(contact_hash)
    .bind(sqlx::types::Json(context))
    .fetch_one(executor)
    .await
}

pub async fn update_state_and_context<'c, E>(
    executor: E,
    conversation_id: Uuid,
    state: ConversationState,
    context: &BookingContext,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "UPDATE conversations SET state = $1, context = $2, last_activity_at = now() WHERE id = $3",
    )
    .bind(state)
    .bind(sqlx::types::Json(context))
    .bind(conversation_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn insert_quote_option<'c, E>(
    executor: E,
    option: &QuoteOption,
) -> Result<QuoteOption, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, QuoteOption>(
        "INSERT INTO quote_options
            (property_id, conversation_id, room_type_id, checkin, checkout, total_cents, currency)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, property_id, conversation_id, room_type_id, checkin, checkout, total_cents, currency, created_at",
    )
    .bind(option.property_id)
    .bind(option.conversation_id)
    .bind(option.room_type_id)
    .bind(option.checkin)
    .bind(option.checkout)
    .bind(option.total_cents)
    .bind(&option.currency)
    .fetch_one(executor)
    .await
}

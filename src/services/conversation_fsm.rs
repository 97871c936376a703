use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppResult;
use crate::models::conversation::{BookingContext, Conversation, MissingField};
use crate::models::intent::ParsedIntent;
use crate::models::outbox::{MessageTemplate, OutboxPayload};
use crate::models::task::TaskPayload;
use crate::repository::{conversations as conversations_repo, properties, rooms};
use crate::services::holds::{self, CreateHoldInput};
use crate::services::tasks::TaskDispatcher;
use crate::services::{outbox, parsing, pricing};

/// Outcome of [`handle_inbound_message`], surfaced mainly for tests —
/// callers (task handlers) act on the outbox events this produces, not
/// on the return value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationOutcome {
    Prompted(MissingField),
    QuoteReady,
    Unavailable,
}

/// Advances a contact's conversation by one inbound message.
///
/// Always: loads or creates the conversation, advances its state by
/// exactly one step (idempotent at `ready_to_quote`), merges newly
/// parsed entities into the accumulated context, and persists both.
///
/// Then, based on the *merged context* rather than the raw state label:
/// prompts for the first missing field in fixed order, or — once
/// nothing is missing — runs the pricing pipeline and either reports
/// unavailability or places a hold and confirms the quote.
#[allow(clippy::too_many_arguments)]
pub async fn handle_inbound_message(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
    text: &str,
    reference_date: NaiveDate,
    correlation_id: Option<Uuid>,
) -> AppResult<ConversationOutcome> {
    let aliases = room_type_alias_map(pool, property_id).await?;
    let parsed = parsing::parse_intent(text, &aliases, reference_date);

    let conversation = advance_conversation(pool, property_id, channel, contact_hash, &parsed).await?;

    let Some(missing) = conversation.context.0.first_missing() else {
        return run_pricing_pipeline(pool, tasks, &conversation, correlation_id).await;
    };

    emit_prompt(pool, tasks, &conversation, missing, correlation_id).await?;
    Ok(ConversationOutcome::Prompted(missing))
}

async fn room_type_alias_map(pool: &PgPool, property_id: Uuid) -> AppResult<HashMap<String, Uuid>> {
    let rows = rooms::list_room_type_aliases(pool, property_id).await?;
    Ok(rows.into_iter().collect())
}

async fn advance_conversation(
    pool: &PgPool,
    property_id: Uuid,
    channel: &str,
    contact_hash: &str,
    parsed: &ParsedIntent,
) -> AppResult<Conversation> {
    let mut tx = db::begin(pool).await?;

    let entities = BookingContext {
        checkin: parsed.checkin,
        checkout: parsed.checkout,
        room_type_id: parsed.room_type_id,
        adult_count: parsed.adult_count,
        children_ages: parsed.children_ages.clone(),
    };

    let existing = conversations_repo::lock_by_contact(&mut *tx, property_id, channel, contact_hash).await?;

    let conversation = match existing {
        Some(mut conversation) => {
            let mut context = conversation.context.0.clone();
            context.merge(&entities);
            let new_state = conversation.state.advance();
            conversations_repo::update_state_and_context(&mut *tx, conversation.id, new_state, &context).await?;
            conversation.state = new_state;
            conversation.context = sqlx::types::Json(context);
            conversation
        }
        None => conversations_repo::insert_new(&mut *tx, property_id, channel, contact_hash, &entities).await?,
    };

    tx.commit().await?;
    Ok(conversation)
}

async fn emit_prompt(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    conversation: &Conversation,
    missing: MissingField,
    correlation_id: Option<Uuid>,
) -> AppResult<()> {
    let template = match missing {
        MissingField::Checkin => MessageTemplate::PromptCheckin,
        MissingField::Checkout => MessageTemplate::PromptCheckout,
        MissingField::RoomType => MessageTemplate::PromptRoomType,
        MissingField::AdultCount => MessageTemplate::PromptAdultCount,
        MissingField::ChildrenAges => MessageTemplate::PromptChildrenAges,
    };
    emit_message(pool, tasks, conversation, template, correlation_id).await
}

async fn run_pricing_pipeline(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    conversation: &Conversation,
    correlation_id: Option<Uuid>,
) -> AppResult<ConversationOutcome> {
    let context = &conversation.context.0;
    let (Some(checkin), Some(checkout), Some(room_type_id), Some(adult_count)) =
        (context.checkin, context.checkout, context.room_type_id, context.adult_count)
    else {
        // first_missing() already confirmed these are populated; this
        // branch exists only to satisfy the compiler's exhaustiveness.
        return Ok(ConversationOutcome::Unavailable);
    };
    let children_ages = context.children_ages.clone().unwrap_or_default();

    let property = properties::get(pool, conversation.property_id).await?;

    let quote = pricing::quote_minimum(
        pool,
        conversation.property_id,
        room_type_id,
        checkin,
        checkout,
        adult_count,
        &children_ages,
        &property.currency,
    )
    .await?;

    let Some(quote) = quote else {
        emit_message(pool, tasks, conversation, MessageTemplate::Unavailable, correlation_id).await?;
        return Ok(ConversationOutcome::Unavailable);
    };

    let idempotency_key = format!(
        "conv:{conversation_id}:{checkin}:{checkout}:{room_type_id}",
        conversation_id = conversation.id
    );

    let hold_result = holds::create_hold(
        pool,
        tasks,
        CreateHoldInput {
            property_id: conversation.property_id,
            room_type_id,
            checkin,
            checkout,
            total_cents: quote.total_cents,
            currency: &quote.currency,
            create_idempotency_key: &idempotency_key,
            conversation_id: Some(conversation.id),
            adult_count,
            children_ages: &children_ages,
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            correlation_id: correlation_id.map(|id| id.to_string()),
        },
    )
    .await;

    let hold_result = match hold_result {
        Ok(result) => result,
        Err(crate::error::AppError::Unavailable(_)) => {
            emit_message(pool, tasks, conversation, MessageTemplate::Unavailable, correlation_id).await?;
            return Ok(ConversationOutcome::Unavailable);
        }
        Err(other) => return Err(other),
    };

    let room_type = rooms::get_room_type(pool, conversation.property_id, room_type_id).await?;

    conversations_repo::insert_quote_option(
        pool,
        &crate::models::conversation::QuoteOption {
            id: Uuid::nil(),
            property_id: conversation.property_id,
            conversation_id: conversation.id,
            room_type_id,
            checkin,
            checkout,
            total_cents: quote.total_cents,
            currency: quote.currency.clone(),
            created_at: chrono::Utc::now(),
        },
    )
    .await?;

    emit_message(
        pool,
        tasks,
        conversation,
        MessageTemplate::QuoteReady {
            room_type_name: room_type.name,
            checkin,
            checkout,
            total_cents: quote.total_cents,
            currency: quote.currency,
        },
        correlation_id,
    )
    .await?;

    let _ = hold_result;
    Ok(ConversationOutcome::QuoteReady)
}

/// Appends a `whatsapp.send_message` outbox event and, immediately after
/// commit, enqueues the matching task — the same emit-then-enqueue
/// sibling-step pattern [`holds::create_hold`] uses for expiration, so a
/// downstream relay is never required to drive outbound sends.
async fn emit_message(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    conversation: &Conversation,
    template: MessageTemplate,
    correlation_id: Option<Uuid>,
) -> AppResult<()> {
    let mut tx = db::begin(pool).await?;
    let event_id = outbox::emit(
        &mut tx,
        conversation.property_id,
        conversation.id,
        OutboxPayload::WhatsappSendMessage {
            contact_hash: conversation.contact_hash.clone(),
            channel: conversation.channel.clone(),
            template: template.clone(),
        },
        correlation_id,
    )
    .await?;
    tx.commit().await?;

    let task_id = format!("whatsapp-send:{event_id}");
    tasks
        .enqueue(
            task_id,
            TaskPayload::WhatsappSendMessage {
                property_id: conversation.property_id,
                contact_hash: conversation.contact_hash.clone(),
                channel: conversation.channel.clone(),
                template,
                correlation_id: correlation_id.map(|id| id.to_string()),
            },
            None,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn booking_context_from_parsed_intent_preserves_children_ages() {
        let parsed = ParsedIntent {
            checkin: NaiveDate::from_ymd_opt(2026, 8, 1),
            checkout: NaiveDate::from_ymd_opt(2026, 8, 3),
            room_type_id: None,
            adult_count: Some(2),
            children_ages: Some(vec![5]),
        };
        let entities = BookingContext {
            checkin: parsed.checkin,
            checkout: parsed.checkout,
            room_type_id: parsed.room_type_id,
            adult_count: parsed.adult_count,
            children_ages: parsed.children_ages.clone(),
        };
        assert_eq!(entities.children_ages, Some(vec![5]));
    }
}

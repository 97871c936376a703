use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::hold::HoldStatus;
use crate::models::outbox::{MessageTemplate, OutboxPayload};
use crate::models::reservation::Reservation;
use crate::models::task::TaskPayload;
use crate::repository::{conversations, guests, holds as holds_repo, properties, reservations as reservations_repo};
use crate::services::outbox;
use crate::services::tasks::TaskDispatcher;

#[derive(Debug, Clone)]
pub struct ConvertHoldResult {
    pub reservation: Reservation,
    pub created: bool,
}

/// Converts an active hold into a confirmed reservation, grounded on
/// `original_source/domain/convert_hold.py::convert_hold`.
///
/// 1. Locks the hold; a missing hold is a silent noop (the caller
///    already considers the operation done — e.g. a duplicate Stripe
///    webhook for an already-converted hold).
/// 2. Fails if the hold is not `active` — conversion only ever happens
///    once per hold, enforced first by this status check and then by
///    the `UNIQUE (property_id, hold_id)` constraint `insert_from_hold`
///    relies on for its own idempotency.
/// 3. Resolves the hold's guest fields to a `Guest` profile via
///    `guests::find_or_create` (email, then phone, then a fresh row),
///    inserts the reservation carrying that `guest_id`, and marks the
///    hold `converted`.
/// 4. If the hold came from a conversation, emits a
///    `reservation_confirmed` WhatsApp message — but only when the
///    conversation still has a `contact_hash` to address. A missing
///    hash is logged and skipped rather than failing the whole
///    conversion, since the reservation itself must still succeed.
pub async fn convert_hold(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    property_id: Uuid,
    hold_id: Uuid,
) -> AppResult<Option<ConvertHoldResult>> {
    let mut tx = db::begin(pool).await?;

    let Some(hold) = holds_repo::lock_hold(&mut *tx, hold_id).await? else {
        tx.commit().await?;
        return Ok(None);
    };

    if hold.status != HoldStatus::Active {
        return Err(AppError::UnprocessableEntity(format!(
            "hold is not active (status: {status:?})",
            status = hold.status
        )));
    }

    let guest = guests::find_or_create(
        &mut tx,
        property_id,
        hold.guest_name.as_deref(),
        hold.guest_email.as_deref(),
        hold.guest_phone.as_deref(),
    )
    .await?;
    let guest_id = guest.as_ref().map(|(guest, _)| guest.id);

    let room_type_id = hold.room_type_id;
    let new_reservation = reservations_repo::NewReservation {
        property_id,
        hold_id: hold.id,
        checkin: hold.checkin,
        checkout: hold.checkout,
        total_cents: hold.total_cents,
        currency: &hold.currency,
        room_type_id,
        guest_id,
        guest_name: hold.guest_name.as_deref(),
        adult_count: hold.adult_count,
        children_ages: &hold.children_ages,
    };

    let (reservation, created) = reservations_repo::insert_from_hold(&mut tx, &new_reservation).await?;

    holds_repo::set_status(&mut *tx, hold.id, HoldStatus::Converted).await?;

    let mut pending_notification = None;

    if let Some(conversation_id) = hold.conversation_id {
        let conversation = conversations::get(&mut *tx, conversation_id).await?;
        match conversation {
            Some(conversation) if !conversation.contact_hash.is_empty() => {
                let property = properties::get(pool, property_id).await?;
                let template = MessageTemplate::ReservationConfirmed {
                    guest_name: hold.guest_name.clone(),
                    property_name: property.name,
                    checkin: hold.checkin,
                    checkout: hold.checkout,
                };
                let event_id = outbox::emit(
                    &mut tx,
                    property_id,
                    reservation.id,
                    OutboxPayload::WhatsappSendMessage {
                        contact_hash: conversation.contact_hash.clone(),
                        channel: conversation.channel.clone(),
                        template: template.clone(),
                    },
                    None,
                )
                .await?;
                pending_notification = Some((event_id, conversation.contact_hash, conversation.channel, template));
            }
            _ => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    reservation_id = %reservation.id,
                    "skipping reservation notification: contact_hash missing"
                );
            }
        }
    }

    tx.commit().await?;

    if let Some((event_id, contact_hash, channel, template)) = pending_notification {
        let task_id = format!("whatsapp-send:{event_id}");
        tasks
            .enqueue(
                task_id,
                TaskPayload::WhatsappSendMessage {
                    property_id,
                    contact_hash,
                    channel,
                    template,
                    correlation_id: None,
                },
                None,
            )
            .await?;
    }

    Ok(Some(ConvertHoldResult { reservation, created }))
}

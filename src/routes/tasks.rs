use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::task::{TaskEnvelopeV1, TaskPayload};
use crate::services::{holds, messaging, payments};
use crate::state::AppState;
use crate::stripe::webhook::StripeEvent;

/// Worker-side handlers for the four `/tasks/*` routes.
/// `whatsapp/send-message` and `conversations/handle-inbound` are this
/// crate's own task kinds, dispatched under the same `/tasks` namespace
/// as `holds/expire` and `stripe/handle-event`.
/// Every route here sits behind [`crate::middleware::task_auth::require_task_auth`].
pub async fn expire_hold(State(state): State<AppState>, Json(envelope): Json<TaskEnvelopeV1>) -> AppResult<StatusCode> {
    let TaskPayload::ExpireHold { property_id, hold_id, .. } = envelope.payload else {
        return Err(AppError::BadRequest("unexpected payload for holds.expire".to_string()));
    };
    holds::expire_hold(&state.db_pool, &envelope.task_id, property_id, hold_id).await?;
    Ok(StatusCode::OK)
}

pub async fn handle_stripe_event(
    State(state): State<AppState>,
    Json(envelope): Json<TaskEnvelopeV1>,
) -> AppResult<StatusCode> {
    let TaskPayload::StripeHandleEvent {
        property_id,
        event_id,
        event_type,
        object_id,
        payment_status,
        ..
    } = envelope.payload
    else {
        return Err(AppError::BadRequest("unexpected payload for stripe.handle_event".to_string()));
    };

    let event = StripeEvent {
        event_id,
        event_type,
        object_id,
        payment_status,
    };
    payments::reconcile_event(&state.db_pool, &state.tasks, property_id, &event).await?;
    Ok(StatusCode::OK)
}

pub async fn send_whatsapp_message(
    State(state): State<AppState>,
    Json(envelope): Json<TaskEnvelopeV1>,
) -> AppResult<StatusCode> {
    let TaskPayload::WhatsappSendMessage {
        property_id,
        contact_hash,
        channel,
        template,
        correlation_id,
    } = envelope.payload
    else {
        return Err(AppError::BadRequest("unexpected payload for whatsapp.send_message".to_string()));
    };

    messaging::send_whatsapp_message(
        &state.http_client,
        &state.config,
        &state.pii_vault,
        &state.db_pool,
        property_id,
        &contact_hash,
        &channel,
        &template,
        correlation_id.as_deref(),
    )
    .await?;
    Ok(StatusCode::OK)
}

pub async fn handle_inbound_conversation(
    State(state): State<AppState>,
    Json(envelope): Json<TaskEnvelopeV1>,
) -> AppResult<StatusCode> {
    let TaskPayload::HandleInboundConversation {
        property_id,
        channel,
        contact_hash,
        message_id,
        correlation_id,
    } = envelope.payload
    else {
        return Err(AppError::BadRequest("unexpected payload for conversations.handle_inbound".to_string()));
    };

    let correlation_id = correlation_id.as_deref().and_then(|value| value.parse::<Uuid>().ok());

    messaging::handle_inbound(
        &state.db_pool,
        &state.tasks,
        &state.pii_vault,
        property_id,
        &channel,
        &contact_hash,
        &message_id,
        correlation_id,
    )
    .await?;
    Ok(StatusCode::OK)
}

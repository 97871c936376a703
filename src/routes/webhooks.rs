use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::middleware::request_id::CorrelationId;
use crate::models::task::TaskPayload;
use crate::repository::{payments as payments_repo, processed_events, whatsapp_channels};
use crate::state::AppState;
use crate::stripe::webhook as stripe_webhook;
use crate::whatsapp::{evolution, meta};

/// Inbound webhook endpoints. Each provider's delivery
/// is reduced to a dedupe-ledger insert plus exactly one task enqueue,
/// both inside the same transaction — mirroring
/// `original_source/api/routes/webhooks_whatsapp.py` and
/// `webhooks_stripe.py`, where a failed enqueue rolls the receipt back
/// with it rather than leaving a processed-event row with no task ever
/// dispatched for it. This is deliberately the opposite ordering from
/// the outbox-driven paths elsewhere in this crate (commit, then
/// enqueue): a webhook delivery writes no outbox row of its own, so the
/// `processed_events` row is the only durable record that the event
/// happened at all, and it must not survive a failed enqueue.
pub async fn evolution_webhook(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    let property_id = property_id_header(&headers)?;
    let inbound = evolution::validate_and_extract(&payload).map_err(|err| AppError::BadRequest(err.to_string()))?;

    receive_whatsapp_message(&state, property_id, "evolution", &payload, &inbound.message_id, &correlation.0).await
}

pub async fn meta_webhook(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let app_secret = state
        .config
        .whatsapp_meta_app_secret
        .as_deref()
        .ok_or_else(|| AppError::ConfigurationMissing("WHATSAPP_META_APP_SECRET is not set".to_string()))?;
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing X-Hub-Signature-256 header".to_string()))?;

    if !meta::verify_signature(app_secret, signature, &body) {
        return Err(AppError::BadRequest("invalid signature".to_string()));
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::BadRequest("invalid json body".to_string()))?;
    let inbound = meta::validate_and_extract(&payload).map_err(|err| AppError::BadRequest(err.to_string()))?;

    // Meta posts every property's WhatsApp Business number to the same
    // callback URL, so (unlike Evolution's explicit X-Property-Id
    // header) property_id has to be resolved from the phone_number_id
    // the payload was routed through.
    let phone_number_id =
        meta::get_phone_number_id(&payload).ok_or_else(|| AppError::BadRequest("missing phone_number_id".to_string()))?;
    let property_id = whatsapp_channels::find_property_id(&state.db_pool, "meta", phone_number_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown whatsapp channel".to_string()))?;

    receive_whatsapp_message(&state, property_id, "meta", &payload, &inbound.message_id, &correlation.0).await
}

async fn receive_whatsapp_message(
    state: &AppState,
    property_id: Uuid,
    channel: &str,
    payload: &Value,
    message_id: &str,
    correlation_id: &str,
) -> AppResult<Response> {
    let mut tx = db::begin(&state.db_pool).await?;

    let is_new = processed_events::insert_if_new(&mut *tx, property_id, channel, message_id).await?;
    if !is_new {
        tx.commit().await?;
        return Ok((StatusCode::OK, "duplicate").into_response());
    }

    let normalized = match channel {
        "evolution" => evolution::normalize(payload),
        "meta" => meta::normalize(payload),
        other => unreachable!("receive_whatsapp_message called with unknown channel {other}"),
    }
    .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let contact_hash_secret = state
        .config
        .contact_hash_secret
        .as_deref()
        .ok_or_else(|| AppError::ConfigurationMissing("CONTACT_HASH_SECRET is not set".to_string()))?;
    let contact_hash = crate::hashing::contact_hash(
        contact_hash_secret,
        &property_id.to_string(),
        channel,
        &normalized.remote_jid,
    )?;

    state
        .pii_vault
        .store(&state.db_pool, property_id, channel, &contact_hash, &normalized.remote_jid)
        .await?;

    if let Some(text) = normalized.text.as_deref() {
        state
            .pii_vault
            .store_inbound_text(&state.db_pool, property_id, message_id, text)
            .await?;

        let task_id = format!("whatsapp-inbound:{property_id}:{message_id}");
        state
            .tasks
            .enqueue(
                task_id,
                TaskPayload::HandleInboundConversation {
                    property_id,
                    channel: channel.to_string(),
                    contact_hash,
                    message_id: message_id.to_string(),
                    correlation_id: Some(correlation_id.to_string()),
                },
                None,
            )
            .await?;
    } else {
        tracing::info!(
            property_id = %property_id,
            channel,
            message_id,
            "inbound message has no text body, skipping conversation handling"
        );
    }

    tx.commit().await?;
    Ok((StatusCode::OK, "accepted").into_response())
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let webhook_secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::ConfigurationMissing("STRIPE_WEBHOOK_SECRET is not set".to_string()))?;
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Stripe-Signature header".to_string()))?;

    if !stripe_webhook::verify_signature(&body, signature, webhook_secret) {
        return Err(AppError::BadRequest("invalid signature".to_string()));
    }

    let event = stripe_webhook::parse_event(&body).map_err(|_| AppError::BadRequest("invalid payload".to_string()))?;

    tracing::info!(
        event_id = %event.event_id,
        event_type = %event.event_type,
        "stripe webhook received"
    );

    // We only ever act on events for objects we created ourselves
    // (checkout sessions); anything else can't be attributed to a
    // property and is rejected rather than retried.
    let Some(object_id) = event.object_id.as_deref() else {
        return Err(AppError::BadRequest("event missing object id".to_string()));
    };

    let payment = payments_repo::find_by_provider_object_any_property(&state.db_pool, "stripe", object_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown object".to_string()))?;
    let property_id = payment.property_id;

    let mut tx = db::begin(&state.db_pool).await?;

    let is_new = processed_events::insert_if_new(&mut *tx, property_id, "stripe", &event.event_id).await?;
    if !is_new {
        tx.commit().await?;
        return Ok((StatusCode::OK, "duplicate").into_response());
    }

    let task_id = format!("stripe:{}", event.event_id);
    state
        .tasks
        .enqueue(
            task_id,
            TaskPayload::StripeHandleEvent {
                property_id,
                event_id: event.event_id.clone(),
                event_type: event.event_type.clone(),
                object_id: Some(object_id.to_string()),
                payment_status: event.payment_status.clone(),
                correlation_id: Some(correlation.0.clone()),
            },
            None,
        )
        .await?;

    tx.commit().await?;
    Ok((StatusCode::OK, "accepted").into_response())
}

fn property_id_header(headers: &HeaderMap) -> AppResult<Uuid> {
    headers
        .get("x-property-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing X-Property-Id header".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("X-Property-Id is not a valid uuid".to_string()))
}

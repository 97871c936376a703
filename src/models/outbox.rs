use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Safe, non-PII template parameters for an outbound WhatsApp message.
/// Modelled as a tagged variant per template rather than a free-form
/// `Map<String, Value>`, grounded in
/// `original_source/domain/convert_hold.py`'s `reservation_confirmed`
/// payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum MessageTemplate {
    ReservationConfirmed {
        guest_name: Option<String>,
        property_name: String,
        checkin: NaiveDate,
        checkout: NaiveDate,
    },
    PromptCheckin,
    PromptCheckout,
    PromptRoomType,
    PromptAdultCount,
    PromptChildrenAges,
    QuoteReady {
        room_type_name: String,
        checkin: NaiveDate,
        checkout: NaiveDate,
        total_cents: i64,
        currency: String,
    },
    Unavailable,
}

/// Append-only domain event. Every domain-visible state change writes
/// one of these to the outbox table in the same transaction that
/// produces the state change. The enum is tagged so the
/// outbox writer and dispatcher are exhaustively matched at compile
/// time instead of threading `serde_json::Value` end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum OutboxPayload {
    #[serde(rename = "HOLD_CREATED")]
    HoldCreated {
        room_type_id: Uuid,
        checkin: NaiveDate,
        checkout: NaiveDate,
        nights: i64,
        total_cents: i64,
        currency: String,
    },
    #[serde(rename = "HOLD_EXPIRED")]
    HoldExpired {
        room_type_id: Option<Uuid>,
        checkin: Option<NaiveDate>,
        checkout: Option<NaiveDate>,
        nights_released: i64,
        total_cents: i64,
        currency: String,
    },
    #[serde(rename = "RESERVATION_CANCELLED")]
    ReservationCancelled {
        reservation_id: Uuid,
        refund_amount_cents: i64,
        reason: String,
        cancelled_by: String,
    },
    #[serde(rename = "whatsapp.send_message")]
    WhatsappSendMessage {
        contact_hash: String,
        channel: String,
        #[serde(flatten)]
        template: MessageTemplate,
    },
}

impl OutboxPayload {
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            OutboxPayload::HoldCreated { .. } | OutboxPayload::HoldExpired { .. } => "hold",
            OutboxPayload::ReservationCancelled { .. } => "reservation",
            OutboxPayload::WhatsappSendMessage { .. } => "message",
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            OutboxPayload::HoldCreated { .. } => "HOLD_CREATED",
            OutboxPayload::HoldExpired { .. } => "HOLD_EXPIRED",
            OutboxPayload::ReservationCancelled { .. } => "RESERVATION_CANCELLED",
            OutboxPayload::WhatsappSendMessage { .. } => "whatsapp.send_message",
        }
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload carried by a scheduled task, discriminated on `task_name` as
/// a tagged union rather than a loose JSON map. Every variant is
/// PII-free by construction — only ids, hashes, and enumerated fields
/// ever appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task_name")]
pub enum TaskPayload {
    #[serde(rename = "holds.expire")]
    ExpireHold {
        property_id: Uuid,
        hold_id: Uuid,
        correlation_id: Option<String>,
    },
    #[serde(rename = "stripe.handle_event")]
    StripeHandleEvent {
        property_id: Uuid,
        event_id: String,
        event_type: String,
        object_id: Option<String>,
        payment_status: Option<String>,
        correlation_id: Option<String>,
    },
    #[serde(rename = "whatsapp.send_message")]
    WhatsappSendMessage {
        property_id: Uuid,
        contact_hash: String,
        channel: String,
        template: crate::models::outbox::MessageTemplate,
        correlation_id: Option<String>,
    },
    #[serde(rename = "conversations.handle_inbound")]
    HandleInboundConversation {
        property_id: Uuid,
        channel: String,
        contact_hash: String,
        message_id: String,
        correlation_id: Option<String>,
    },
}

impl TaskPayload {
    pub fn task_name(&self) -> &'static str {
        match self {
            TaskPayload::ExpireHold { .. } => "holds.expire",
            TaskPayload::StripeHandleEvent { .. } => "stripe.handle_event",
            TaskPayload::WhatsappSendMessage { .. } => "whatsapp.send_message",
            TaskPayload::HandleInboundConversation { .. } => "conversations.handle_inbound",
        }
    }
}

/// Versioned envelope exchanged between the dispatcher and the worker
/// over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelopeV1 {
    pub version: TaskEnvelopeVersion,
    pub task_id: String,
    #[serde(flatten)]
    pub payload: TaskPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEnvelopeVersion {
    #[serde(rename = "v1")]
    V1,
}

impl TaskEnvelopeV1 {
    pub fn new(task_id: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            version: TaskEnvelopeVersion::V1,
            task_id: task_id.into(),
            payload,
        }
    }
}

use chrono::{DateTime, Utc};

/// Provider-agnostic, PII-free view of an inbound message. Only metadata
/// ever crosses into a log line, a task payload, or the dedupe ledger —
/// never `remote_jid` or `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: String,
    pub provider: &'static str,
    pub received_at: DateTime<Utc>,
    pub kind: String,
}

/// The full normalised inbound payload, carrying the raw channel address
/// and optional text body. This type MUST be discarded as soon as its
/// three legitimate uses are done: deriving the contact hash, running
/// intent parsing, and storing the address in the PII vault. It is never
/// logged and never serialised into a task payload.
#[derive(Debug, Clone)]
pub struct NormalizedInbound {
    pub message_id: String,
    pub provider: &'static str,
    pub received_at: DateTime<Utc>,
    pub kind: String,
    pub remote_jid: String,
    pub text: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid webhook payload: {0}")]
pub struct InvalidPayload(pub String);

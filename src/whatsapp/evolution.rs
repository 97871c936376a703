use chrono::Utc;
use serde_json::Value;

use super::models::{InboundMessage, InvalidPayload, NormalizedInbound};

/// Validates an Evolution API webhook payload's shape and extracts the
/// non-PII metadata only. Grounded on
/// `original_source/whatsapp/evolution_adapter.py::validate_and_extract`.
pub fn validate_and_extract(payload: &Value) -> Result<InboundMessage, InvalidPayload> {
    let message_id = payload
        .pointer("/data/key/id")
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidPayload("missing or invalid message_id".to_string()))?;

    let kind = payload
        .pointer("/data/messageType")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    Ok(InboundMessage {
        message_id: message_id.to_string(),
        provider: "evolution",
        received_at: Utc::now(),
        kind: kind.to_string(),
    })
}

/// Normalises an Evolution payload including the PII fields. The caller
/// MUST discard `remote_jid`/`text` after deriving the contact hash,
/// running intent parsing, and storing the address in the PII vault.
pub fn normalize(payload: &Value) -> Result<NormalizedInbound, InvalidPayload> {
    let message_id = payload
        .pointer("/data/key/id")
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidPayload("missing or invalid message_id".to_string()))?;

    let remote_jid = payload
        .pointer("/data/key/remoteJid")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| InvalidPayload("missing remoteJid".to_string()))?;

    let message_type = payload
        .pointer("/data/messageType")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let text = match message_type {
        "conversation" => payload.pointer("/data/message/conversation").and_then(Value::as_str),
        "extendedTextMessage" => payload
            .pointer("/data/message/extendedTextMessage/text")
            .and_then(Value::as_str),
        _ => None,
    }
    .map(str::to_string);

    Ok(NormalizedInbound {
        message_id: message_id.to_string(),
        provider: "evolution",
        received_at: Utc::now(),
        kind: message_type.to_string(),
        remote_jid: remote_jid.to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_conversation_text() {
        let payload = json!({
            "data": {
                "key": {"id": "MSG1", "remoteJid": "5511999998888@s.whatsapp.net"},
                "messageType": "conversation",
                "message": {"conversation": "quero reservar"}
            }
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.message_id, "MSG1");
        assert_eq!(normalized.remote_jid, "5511999998888@s.whatsapp.net");
        assert_eq!(normalized.text.as_deref(), Some("quero reservar"));
    }

    #[test]
    fn rejects_payload_missing_message_id() {
        let payload = json!({"data": {"key": {}}});
        assert!(validate_and_extract(&payload).is_err());
    }
}

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use super::models::{InboundMessage, InvalidPayload, NormalizedInbound};

type HmacSha256 = Hmac<Sha256>;

/// Verifies the `X-Hub-Signature-256: sha256=<hex>` header Meta attaches
/// to every webhook delivery against the raw request body. Grounded on
/// `original_source/whatsapp/meta_adapter.py::verify_signature`.
pub fn verify_signature(app_secret: &str, signature_header: &str, raw_body: &[u8]) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex_decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);

    mac.verify_slice(&expected).is_ok()
}

fn hex_decode(value: &str) -> Result<Vec<u8>, ()> {
    if value.len() % 2 != 0 {
        return Err(());
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

/// Extracts the phone number id Meta routes a conversation through, used to
/// pick which property's WhatsApp Business number received the message.
pub fn get_phone_number_id(payload: &Value) -> Option<&str> {
    payload.pointer("/entry/0/changes/0/value/metadata/phone_number_id")?.as_str()
}

fn first_message(payload: &Value) -> Option<&Value> {
    payload.pointer("/entry/0/changes/0/value/messages/0")
}

pub fn validate_and_extract(payload: &Value) -> Result<InboundMessage, InvalidPayload> {
    let message = first_message(payload).ok_or_else(|| InvalidPayload("no inbound message in payload".to_string()))?;

    let message_id = message
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidPayload("missing message id".to_string()))?;
    let kind = message.get("type").and_then(Value::as_str).unwrap_or("unknown");

    Ok(InboundMessage {
        message_id: message_id.to_string(),
        provider: "meta",
        received_at: Utc::now(),
        kind: kind.to_string(),
    })
}

/// Normalises a Meta payload including the PII fields. The sender's phone
/// number is converted to a WhatsApp JID so downstream code (contact hash,
/// PII vault) treats both providers' addresses uniformly.
pub fn normalize(payload: &Value) -> Result<NormalizedInbound, InvalidPayload> {
    let message = first_message(payload).ok_or_else(|| InvalidPayload("no inbound message in payload".to_string()))?;

    let message_id = message
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidPayload("missing message id".to_string()))?;

    let from_phone = message
        .get("from")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| InvalidPayload("missing sender phone number".to_string()))?;
    let remote_jid = format!("{from_phone}@s.whatsapp.net");

    let message_type = message.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let text = match message_type {
        "text" => message.pointer("/text/body").and_then(Value::as_str),
        _ => None,
    }
    .map(str::to_string);

    Ok(NormalizedInbound {
        message_id: message_id.to_string(),
        provider: "meta",
        received_at: Utc::now(),
        kind: message_type.to_string(),
        remote_jid,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verifies_valid_signature() {
        let body = br#"{"hello":"world"}"#;
        let mut mac = HmacSha256::new_from_slice(b"app-secret").unwrap();
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        let hex = digest.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
        let header = format!("sha256={hex}");
        assert!(verify_signature("app-secret", &header, body));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = "sha256=00";
        assert!(!verify_signature("app-secret", header, b"payload"));
    }

    #[test]
    fn normalizes_text_message() {
        let payload = json!({
            "entry": [{"changes": [{"value": {
                "metadata": {"phone_number_id": "PNID1"},
                "messages": [{"id": "wamid.1", "from": "5511999998888", "type": "text", "text": {"body": "oi"}}]
            }}]}]
        });
        let normalized = normalize(&payload).unwrap();
        assert_eq!(normalized.remote_jid, "5511999998888@s.whatsapp.net");
        assert_eq!(normalized.text.as_deref(), Some("oi"));
        assert_eq!(get_phone_number_id(&payload), Some("PNID1"));
    }
}

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TOLERANCE_SECS: i64 = 300;

/// Reduces a verified Stripe webhook delivery to the three fields the
/// broker actually consumes: event id, event type, and the
/// checkout session's `payment_status` when present. The broker never
/// logs or retains anything else from the payload.
#[derive(Debug, Clone)]
pub struct StripeEvent {
    pub event_id: String,
    pub event_type: String,
    pub object_id: Option<String>,
    pub payment_status: Option<String>,
}

/// Verifies the `Stripe-Signature` header (`t=<ts>,v1=<hex>`) against the
/// raw body using HMAC-SHA256, rejecting signatures older than 5 minutes
/// to bound replay. Grounded on
/// `services::payments::verify_stripe_signature`.
pub fn verify_signature(raw_body: &[u8], signature_header: &str, webhook_secret: &str) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v1) = part.strip_prefix("v1=") {
            signature = Some(v1);
        }
    }

    let (Some(ts_str), Some(expected_hex)) = (timestamp, signature) else {
        return false;
    };
    let Ok(ts) = ts_str.parse::<i64>() else {
        return false;
    };

    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > TOLERANCE_SECS {
        tracing::warn!(delta_secs = (now - ts).abs(), "stripe webhook signature too old");
        return false;
    }

    let signed_payload = [ts_str.as_bytes(), b".", raw_body].concat();

    let Ok(mut mac) = HmacSha256::new_from_slice(webhook_secret.as_bytes()) else {
        return false;
    };
    mac.update(&signed_payload);

    let Ok(expected_bytes) = hex_decode(expected_hex) else {
        return false;
    };

    mac.verify_slice(&expected_bytes).is_ok()
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

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: Value,
}

/// Parses an already-signature-verified body into a [`StripeEvent`].
/// Only `checkout.session.completed` deliveries carry a `payment_status`
/// the broker acts on; every other event type is returned with
/// `payment_status: None` and left to the caller to ignore.
pub fn parse_event(raw_body: &[u8]) -> Result<StripeEvent, serde_json::Error> {
    let raw: RawEvent = serde_json::from_slice(raw_body)?;
    let object_id = raw.data.object.get("id").and_then(Value::as_str).map(str::to_string);
    let payment_status = raw
        .data
        .object
        .get("payment_status")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(StripeEvent {
        event_id: raw.id,
        event_type: raw.event_type,
        object_id,
        payment_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_valid_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let mut mac = HmacSha256::new_from_slice(b"whsec_test").unwrap();
        let ts = chrono::Utc::now().timestamp();
        let signed_payload = format!("{ts}.");
        mac.update(signed_payload.as_bytes());
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        let header = format!("t={ts},v1={hex}");
        assert!(verify_signature(body, &header, "whsec_test"));
    }

    #[test]
    fn rejects_stale_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let ts = chrono::Utc::now().timestamp() - 1000;
        let header = format!("t={ts},v1=00");
        assert!(!verify_signature(body, &header, "whsec_test"));
    }

    #[test]
    fn parses_checkout_completed_event() {
        let body = br#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_123", "payment_status": "paid"}}
        }"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.event_id, "evt_123");
        assert_eq!(event.object_id.as_deref(), Some("cs_123"));
        assert_eq!(event.payment_status.as_deref(), Some("paid"));
    }
}

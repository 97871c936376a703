use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Computes the conversation contact hash: a truncated, base64url,
/// padding-free HMAC-SHA256 of `{property_id}|{channel}|{sender_id}`
/// under the process-wide `CONTACT_HASH_SECRET`.
///
/// The result is exactly 32 characters. It is deterministic for the same
/// inputs and secret, and no raw identifier is recoverable from it alone.
pub fn contact_hash(secret: &str, property_id: &str, channel: &str, sender_id: &str) -> Result<String, AppError> {
    let message = format!("{property_id}|{channel}|{sender_id}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(format!("invalid hmac key: {err}")))?;
    mac.update(message.as_bytes());
    let digest = mac.finalize().into_bytes();
    let encoded = URL_SAFE_NO_PAD.encode(digest);
    Ok(encoded.chars().take(32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_hash_is_deterministic_and_32_chars() {
        let a = contact_hash("secret-key-value", "prop-1", "whatsapp", "5511999998888@c.us").unwrap();
        let b = contact_hash("secret-key-value", "prop-1", "whatsapp", "5511999998888@c.us").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!a.contains("5511999998888"));
    }

    #[test]
    fn contact_hash_differs_by_property() {
        let a = contact_hash("secret-key-value", "prop-1", "whatsapp", "x").unwrap();
        let b = contact_hash("secret-key-value", "prop-2", "whatsapp", "x").unwrap();
        assert_ne!(a, b);
    }
}

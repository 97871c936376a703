use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::repository::{contact_refs, inbound_messages};
use crate::time::utc_now;

/// TTL for the scratch inbound-message-text store, short enough that a
/// task the worker never picks up doesn't leave guest text sitting
/// encrypted at rest indefinitely.
const INBOUND_TEXT_TTL_MINUTES: i64 = 60;

/// Encrypts and decrypts the one piece of durable PII this service ever
/// stores at rest: the channel-specific remote address (WhatsApp JID,
/// phone number) needed to send an outbound message. Every other
/// reference to a contact is by [`crate::hashing::contact_hash`].
///
/// Ciphertext is `base64(nonce(12) || AES-256-GCM(plaintext))`, matching
/// `original_source/infra/contact_refs.py`. Rows expire after
/// `contact_ref_ttl_hours` and are only ever decrypted by the outbound
/// send task.
pub struct PiiVault {
    cipher: Aes256Gcm,
    ttl: Duration,
}

impl PiiVault {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let hex_key = config
            .contact_refs_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationMissing("CONTACT_REFS_KEY is not set".to_string()))?;

        let key_bytes = decode_hex_key(hex_key)
            .map_err(|err| AppError::ConfigurationMissing(format!("CONTACT_REFS_KEY invalid: {err}")))?;

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
            ttl: Duration::hours(config.contact_ref_ttl_hours),
        })
    }

    fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Internal("failed to encrypt contact reference".to_string()))?;

        let mut combined = Vec::with_capacity(nonce.len() + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    fn decrypt(&self, encoded: &str) -> AppResult<String> {
        let combined = BASE64
            .decode(encoded)
            .map_err(|_| AppError::Internal("malformed contact reference ciphertext".to_string()))?;
        if combined.len() < 12 {
            return Err(AppError::Internal("truncated contact reference ciphertext".to_string()));
        }
        let (nonce, ciphertext) = combined.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| AppError::Internal("failed to decrypt contact reference".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| AppError::Internal("decrypted contact reference was not valid utf-8".to_string()))
    }

    /// Upserts the encrypted remote address for a contact, resetting its
    /// TTL. Called whenever an inbound message arrives.
    pub async fn store(
        &self,
        pool: &PgPool,
        property_id: Uuid,
        channel: &str,
        contact_hash: &str,
        remote_address: &str,
    ) -> AppResult<()> {
        let ciphertext = self.encrypt(remote_address)?;
        let expires_at = utc_now() + self.ttl;
        contact_refs::upsert(pool, property_id, channel, contact_hash, &ciphertext, expires_at).await?;
        Ok(())
    }

    /// Returns the decrypted remote address, or `None` if the row is
    /// missing or its TTL has lapsed. A lapsed row is never resurrected:
    /// the caller must wait for a fresh inbound message.
    pub async fn fetch(
        &self,
        pool: &PgPool,
        property_id: Uuid,
        channel: &str,
        contact_hash: &str,
    ) -> AppResult<Option<String>> {
        match contact_refs::get_ciphertext(pool, property_id, channel, contact_hash).await? {
            Some(ciphertext) => Ok(Some(self.decrypt(&ciphertext)?)),
            None => Ok(None),
        }
    }

    pub async fn cleanup_expired(&self, pool: &PgPool) -> AppResult<u64> {
        Ok(contact_refs::cleanup_expired(pool).await?)
    }

    /// Stashes an inbound message's raw text under `(property_id,
    /// message_id)` so `TaskPayload::HandleInboundConversation` — which
    /// must stay PII-free — can still be dispatched, with the worker
    /// fetching the text back out itself via [`Self::take_inbound_text`].
    pub async fn store_inbound_text(
        &self,
        pool: &PgPool,
        property_id: Uuid,
        message_id: &str,
        text: &str,
    ) -> AppResult<()> {
        let ciphertext = self.encrypt(text)?;
        let expires_at = utc_now() + Duration::minutes(INBOUND_TEXT_TTL_MINUTES);
        inbound_messages::upsert(pool, property_id, message_id, &ciphertext, expires_at).await?;
        Ok(())
    }

    /// Consumes the stashed text for `(property_id, message_id)`, or
    /// `None` if it was never stored, already consumed, or has expired.
    /// Single-use by construction: the backing row is deleted in the
    /// same statement that reads it.
    pub async fn take_inbound_text(
        &self,
        pool: &PgPool,
        property_id: Uuid,
        message_id: &str,
    ) -> AppResult<Option<String>> {
        match inbound_messages::take_ciphertext(pool, property_id, message_id).await? {
            Some(ciphertext) => Ok(Some(self.decrypt(&ciphertext)?)),
            None => Ok(None),
        }
    }

    pub async fn cleanup_expired_inbound_text(&self, pool: &PgPool) -> AppResult<u64> {
        Ok(inbound_messages::cleanup_expired(pool).await?)
    }
}

fn decode_hex_key(raw: &str) -> Result<[u8; 32], String> {
    if raw.len() != 64 {
        return Err(format!("expected 64 hex characters, got {}", raw.len()));
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in raw.as_bytes().chunks(2).enumerate() {
        let hex_pair = std::str::from_utf8(chunk).map_err(|_| "invalid hex".to_string())?;
        bytes[i] = u8::from_str_radix(hex_pair, 16).map_err(|_| "invalid hex digit".to_string())?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(key: &str) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.contact_refs_key = Some(key.to_string());
        config
    }

    #[test]
    fn round_trips_a_remote_address() {
        let key = "a".repeat(64);
        let vault = PiiVault::new(&test_config(&key)).unwrap();
        let ciphertext = vault.encrypt("595981234567@s.whatsapp.net").unwrap();
        let plaintext = vault.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext, "595981234567@s.whatsapp.net");
    }

    #[test]
    fn rejects_a_short_key() {
        let config = test_config("tooshort");
        assert!(PiiVault::new(&config).is_err());
    }

    #[test]
    fn ciphertext_is_not_deterministic() {
        let key = "b".repeat(64);
        let vault = PiiVault::new(&test_config(&key)).unwrap();
        let a = vault.encrypt("same input").unwrap();
        let b = vault.encrypt("same input").unwrap();
        assert_ne!(a, b, "random nonce must vary ciphertext across calls");
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::AppError;

const MAX_RETRIES: u32 = 1;
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Evolution API credentials for a single property's WhatsApp instance.
#[derive(Debug, Clone)]
pub struct EvolutionCredentials {
    pub base_url: String,
    pub instance: String,
    pub api_key: String,
}

/// Meta Cloud API credentials for a single property's WhatsApp number.
#[derive(Debug, Clone)]
pub struct MetaCredentials {
    pub phone_number_id: String,
    pub access_token: String,
    pub graph_api_version: String,
}

/// Truncated, non-reversible identifier for safe logging. NEVER log the
/// raw recipient address or message text.
fn hash_identifier(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest.iter().take(6).map(|byte| format!("{byte:02x}")).collect()
}

/// Sends a text message through Evolution API, retrying once on a 5xx
/// response or a transport-level error. Grounded on
/// `original_source/whatsapp/outbound.py::send_text_via_evolution`.
pub async fn send_text_via_evolution(
    client: &Client,
    credentials: &EvolutionCredentials,
    to_ref: &str,
    text: &str,
    correlation_id: &str,
) -> Result<(), AppError> {
    let url = format!(
        "{}/message/sendText/{}",
        credentials.base_url.trim_end_matches('/'),
        credentials.instance
    );
    let payload = json!({ "number": to_ref, "text": text });

    tracing::info!(
        correlation_id,
        to_hash = %hash_identifier(to_ref),
        text_len = text.len(),
        "sending outbound whatsapp message via evolution"
    );

    send_with_retry(client, |client| {
        client
            .post(&url)
            .header("apikey", credentials.api_key.clone())
            .json(&payload)
    })
    .await
}

/// Sends a text message through the Meta Cloud API, retrying once on a
/// 5xx response or a transport-level error. Grounded on
/// `original_source/whatsapp/meta_sender.py::send_text_via_meta`.
pub async fn send_text_via_meta(
    client: &Client,
    credentials: &MetaCredentials,
    to_phone: &str,
    text: &str,
    correlation_id: &str,
) -> Result<(), AppError> {
    let url = format!(
        "https://graph.facebook.com/{}/{}/messages",
        credentials.graph_api_version, credentials.phone_number_id
    );
    let payload = json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to_phone,
        "type": "text",
        "text": {"body": text},
    });

    tracing::info!(
        correlation_id,
        to_hash = %hash_identifier(to_phone),
        text_len = text.len(),
        provider = "meta",
        "sending outbound whatsapp message via meta"
    );

    send_with_retry(client, |client| {
        client
            .post(&url)
            .bearer_auth(credentials.access_token.clone())
            .json(&payload)
    })
    .await
}

async fn send_with_retry<F>(client: &Client, build_request: F) -> Result<(), AppError>
where
    F: Fn(&Client) -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let result = build_request(client).send().await;
        match result {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => {
                let status = response.status();
                let retryable = status.is_server_error();
                if attempt < MAX_RETRIES && retryable {
                    tracing::warn!(attempt, %status, "outbound whatsapp send failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                return Err(classify_status(status));
            }
            Err(error) => {
                if attempt < MAX_RETRIES {
                    tracing::warn!(attempt, error = %error, "outbound whatsapp send failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                return Err(AppError::ProviderTransient(error.to_string()));
            }
        }
    }
}

fn classify_status(status: StatusCode) -> AppError {
    if status.is_server_error() {
        AppError::ProviderTransient(format!("whatsapp provider returned {status}"))
    } else {
        AppError::ProviderPermanent(format!("whatsapp provider returned {status}"))
    }
}

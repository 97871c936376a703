use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// The subset of a Stripe Checkout Session the broker acts on. Grounded
/// on `create_stripe_checkout_session`'s request shape, generalised from
/// a tenant/organization description to a property reservation
/// description.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: Option<String>,
}

/// Creates (or, under the same idempotency key, retrieves) a Checkout
/// Session for a hold. `idempotency_key` MUST be deterministic per hold
/// so a retried call never creates a second session.
#[allow(clippy::too_many_arguments)]
pub async fn create_checkout_session(
    client: &Client,
    secret_key: &str,
    idempotency_key: &str,
    amount_cents: i64,
    currency: &str,
    description: &str,
    success_url: &str,
    cancel_url: &str,
    metadata: &[(&str, &str)],
) -> Result<StripeSession, AppError> {
    let currency_lower = currency.to_lowercase();

    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][price_data][currency]".to_string(), currency_lower),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            description.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), success_url.to_string()),
        ("cancel_url".to_string(), cancel_url.to_string()),
    ];
    for (key, value) in metadata {
        form.push((format!("metadata[{key}]"), value.to_string()));
    }

    let response = client
        .post("https://api.stripe.com/v1/checkout/sessions")
        .basic_auth(secret_key, None::<&str>)
        .header("Idempotency-Key", idempotency_key)
        .form(&form)
        .send()
        .await
        .map_err(|err| AppError::ProviderTransient(format!("stripe checkout session request failed: {err}")))?;

    parse_session_response(response).await
}

/// Retrieves an existing Checkout Session by id, used when a Payment row
/// already exists for a hold so the broker returns the same URL instead
/// of creating a second session.
pub async fn retrieve_checkout_session(
    client: &Client,
    secret_key: &str,
    session_id: &str,
) -> Result<StripeSession, AppError> {
    let response = client
        .get(format!("https://api.stripe.com/v1/checkout/sessions/{session_id}"))
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await
        .map_err(|err| AppError::ProviderTransient(format!("stripe checkout session lookup failed: {err}")))?;

    parse_session_response(response).await
}

async fn parse_session_response(response: reqwest::Response) -> Result<StripeSession, AppError> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| AppError::ProviderTransient(format!("failed to parse stripe response: {err}")))?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown stripe error");
        return Err(if status.is_server_error() {
            AppError::ProviderTransient(format!("stripe error ({status}): {message}"))
        } else {
            AppError::ProviderPermanent(format!("stripe error ({status}): {message}"))
        });
    }

    serde_json::from_value(body)
        .map_err(|err| AppError::ProviderTransient(format!("unexpected stripe response shape: {err}")))
}

use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult, OptionExt};
use crate::models::hold::HoldStatus;
use crate::models::payment::PaymentStatus;
use crate::repository::{holds as holds_repo, payments as payments_repo};
use crate::services::tasks::TaskDispatcher;
use crate::services::{reservations, stripe_client};
use crate::stripe::StripeEvent;

const PROVIDER: &str = "stripe";

/// Turns an active hold into a Stripe Checkout Session, one-to-one,
/// keyed by a deterministic idempotency string derived from the hold id.
///
/// A Payment row already existing for this hold under this provider
/// means a session was already created; the existing session's URL is
/// returned rather than creating a second one.
pub async fn create_checkout_session(
    pool: &PgPool,
    http_client: &Client,
    config: &AppConfig,
    property_id: Uuid,
    hold_id: Uuid,
) -> AppResult<String> {
    let secret_key = config
        .stripe_secret_key
        .as_deref()
        .ok_or_else(|| AppError::ConfigurationMissing("STRIPE_SECRET_KEY is not set".to_string()))?;

    let hold = holds_repo::get_hold(pool, hold_id)
        .await?
        .ok_or_else(|| AppError::BusinessConflict {
            code: "hold_not_found".to_string(),
            message: format!("hold {hold_id} not found"),
        })?;

    if hold.status != HoldStatus::Active {
        return Err(AppError::BusinessConflict {
            code: "hold_not_active".to_string(),
            message: format!("hold {hold_id} is not active (status: {status:?})", status = hold.status),
        });
    }

    if let Some(existing) = payments_repo::find_by_hold(pool, hold_id, PROVIDER).await? {
        let session = stripe_client::retrieve_checkout_session(http_client, secret_key, &existing.provider_object_id)
            .await?;
        return session
            .url
            .ok_or_else(|| AppError::Dependency("stripe session has no checkout url".to_string()));
    }

    let idempotency_key = format!("hold:{hold_id}");
    let success_url = format!("{}/checkout/{hold_id}?status=success", config.app_public_url);
    let cancel_url = format!("{}/checkout/{hold_id}?status=cancelled", config.app_public_url);
    let description = format!("Reservation hold {hold_id}");

    let session = stripe_client::create_checkout_session(
        http_client,
        secret_key,
        &idempotency_key,
        hold.total_cents,
        &hold.currency,
        &description,
        &success_url,
        &cancel_url,
        &[("hold_id", &hold_id.to_string()), ("property_id", &property_id.to_string())],
    )
    .await?;

    let mut tx = crate::db::begin(pool).await?;
    let payment = payments_repo::insert(
        &mut tx,
        &payments_repo::NewPayment {
            property_id,
            hold_id,
            provider: PROVIDER,
            provider_object_id: &session.id,
            status: PaymentStatus::Created,
            amount_cents: hold.total_cents,
            currency: &hold.currency,
        },
    )
    .await?;
    tx.commit().await?;

    if payment.provider_object_id != session.id {
        let reused = stripe_client::retrieve_checkout_session(http_client, secret_key, &payment.provider_object_id)
            .await?;
        return reused
            .url
            .ok_or_else(|| AppError::Dependency("stripe session has no checkout url".to_string()));
    }

    session
        .url
        .ok_or_else(|| AppError::Dependency("stripe session has no checkout url".to_string()))
}

/// Reconciles a `checkout.session.completed` webhook delivery against
/// the Payment it describes. Maps the provider's
/// authoritative `payment_status` to our own status taxonomy and, on
/// `paid`, converts the hold into a confirmed reservation.
///
/// Idempotent: if the payment is already in the target status the
/// update (and the downstream conversion) is skipped.
pub async fn reconcile_event(
    pool: &PgPool,
    tasks: &TaskDispatcher,
    property_id: Uuid,
    event: &StripeEvent,
) -> AppResult<()> {
    tracing::info!(
        event_id = %event.event_id,
        event_type = %event.event_type,
        object_id = event.object_id.as_deref().unwrap_or(""),
        "reconciling stripe event"
    );

    let Some(object_id) = event.object_id.as_deref() else {
        tracing::warn!(event_id = %event.event_id, "stripe event has no object id, skipping");
        return Ok(());
    };

    let payment = payments_repo::find_by_provider_object(pool, property_id, PROVIDER, object_id)
        .await?
        .ok_or_not_found("payment")?;

    let target_status = match event.payment_status.as_deref() {
        Some("paid") => PaymentStatus::Succeeded,
        Some("unpaid") => PaymentStatus::Pending,
        _ => PaymentStatus::NeedsManual,
    };

    if payment.status == target_status {
        return Ok(());
    }

    payments_repo::set_status(pool, payment.id, target_status).await?;

    if target_status == PaymentStatus::Succeeded {
        let Some(hold_id) = payment.hold_id else {
            tracing::warn!(payment_id = %payment.id, "succeeded payment has no hold to convert");
            return Ok(());
        };
        reservations::convert_hold(pool, tasks, property_id, hold_id).await?;
    }

    Ok(())
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult, OptionExt};
use crate::models::property::{CancellationPolicy, Property};

pub async fn get(pool: &PgPool, property_id: Uuid) -> AppResult<Property> {
    sqlx::query_as::<_, Property>(
        "SELECT id, name, timezone, currency, confirmation_threshold
         FROM properties WHERE id = $1",
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?
    .ok_or_not_found("property")
}

/// Returns the configured cancellation policy for a property, or the
/// default (`flexible`, 7 days, 100%).
pub async fn get_cancellation_policy(pool: &PgPool, property_id: Uuid) -> AppResult<CancellationPolicy> {
    let row = sqlx::query_as::<_, (String, i32, i32, Option<String>)>(
        "SELECT policy_type, free_until_days_before_checkin, penalty_percent, notes
         FROM property_cancellation_policy WHERE property_id = $1",
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?;

    let Some((policy_type, free_until, penalty_percent, notes)) = row else {
        return Ok(CancellationPolicy::default());
    };

    let policy_type = match policy_type.as_str() {
        "non_refundable" => crate::models::property::CancellationPolicyType::NonRefundable,
        "free" => crate::models::property::CancellationPolicyType::Free,
        "flexible" => crate::models::property::CancellationPolicyType::Flexible,
        other => return Err(AppError::Internal(format!("unknown policy_type: {other}"))),
    };

    Ok(CancellationPolicy {
        policy_type,
        free_until_days_before_checkin: free_until,
        penalty_percent,
        notes,
    })
}

pub async fn put_cancellation_policy(
    pool: &PgPool,
    property_id: Uuid,
    policy: &CancellationPolicy,
) -> AppResult<()> {
    let policy_type = match policy.policy_type {
        crate::models::property::CancellationPolicyType::NonRefundable => "non_refundable",
        crate::models::property::CancellationPolicyType::Free => "free",
        crate::models::property::CancellationPolicyType::Flexible => "flexible",
    };
    sqlx::query(
        "INSERT INTO property_cancellation_policy
            (property_id, policy_type, free_until_days_before_checkin, penalty_percent, notes)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (property_id) DO UPDATE
         SET policy_type = EXCLUDED.policy_type,
             free_until_days_before_checkin = EXCLUDED.free_until_days_before_checkin,
             penalty_percent = EXCLUDED.penalty_percent,
             notes = EXCLUDED.notes",
    )
    .bind(property_id)
    .bind(policy_type)
    .bind(policy.free_until_days_before_checkin)
    .bind(policy.penalty_percent)
    .bind(&policy.notes)
    .execute(pool)
    .await?;
    Ok(())
}

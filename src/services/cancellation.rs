use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::outbox::OutboxPayload;
use crate::models::property::{CancellationPolicy, CancellationPolicyType};
use crate::models::reservation::ReservationStatus;
use crate::repository::{ari, properties, refunds, reservations as reservations_repo};
use crate::services::outbox;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelOutcome {
    AlreadyCancelled,
    Cancelled {
        reservation_id: Uuid,
        refund_amount_cents: i64,
        pending_refund_id: Option<Uuid>,
    },
}

/// Cancels a confirmed reservation, computing any refund owed and
/// queuing it for manual execution, grounded on
/// `original_source/domain/cancellation.py::cancel_reservation`.
///
/// Steps run inside one transaction: lock → idempotency check →
/// status validation → refund calculation against the property's
/// cancellation policy (or the flexible/7-day/100% default) → status
/// update → per-night `inv_booked` release (unguarded — a confirmed
/// reservation always holds exactly the inventory it booked) →
/// pending refund insert → `RESERVATION_CANCELLED` outbox emit.
pub async fn cancel_reservation(
    pool: &PgPool,
    property_id: Uuid,
    reservation_id: Uuid,
    reason: &str,
    cancelled_by: &str,
) -> AppResult<CancelOutcome> {
    let mut tx = db::begin(pool).await?;

    let reservation = reservations_repo::lock(&mut *tx, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

    if reservation.status == ReservationStatus::Cancelled {
        tx.commit().await?;
        return Ok(CancelOutcome::AlreadyCancelled);
    }

    if reservation.status != ReservationStatus::Confirmed {
        return Err(AppError::UnprocessableEntity(format!(
            "reservation has status {status:?}, expected confirmed",
            status = reservation.status
        )));
    }

    let policy = properties::get_cancellation_policy(pool, property_id).await?;
    let refund_amount_cents = calculate_refund(reservation.total_cents, reservation.checkin, &policy);

    reservations_repo::set_status(&mut *tx, reservation_id, ReservationStatus::Cancelled).await?;

    if let Some(room_type_id) = reservation.room_type_id {
        let mut current = reservation.checkin;
        while current < reservation.checkout {
            ari::decrement_booked(&mut *tx, property_id, room_type_id, current).await?;
            current += chrono::Duration::days(1);
        }
    }

    let pending_refund_id = if refund_amount_cents > 0 {
        let refund = refunds::insert(&mut *tx, property_id, reservation_id, refund_amount_cents, &policy).await?;
        Some(refund.id)
    } else {
        None
    };

    outbox::emit(
        &mut tx,
        property_id,
        reservation_id,
        OutboxPayload::ReservationCancelled {
            reservation_id,
            refund_amount_cents,
            reason: reason.to_string(),
            cancelled_by: cancelled_by.to_string(),
        },
        None,
    )
    .await?;

    tx.commit().await?;

    Ok(CancelOutcome::Cancelled {
        reservation_id,
        refund_amount_cents,
        pending_refund_id,
    })
}

fn calculate_refund(total_cents: i64, checkin: chrono::NaiveDate, policy: &CancellationPolicy) -> i64 {
    match policy.policy_type {
        CancellationPolicyType::NonRefundable => 0,
        CancellationPolicyType::Free => total_cents,
        CancellationPolicyType::Flexible => {
            let days_until_checkin = (checkin - Utc::now().date_naive()).num_days();
            if days_until_checkin >= policy.free_until_days_before_checkin as i64 {
                total_cents
            } else {
                total_cents * (100 - policy.penalty_percent as i64) / 100
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flexible_policy(free_until_days: i32, penalty_percent: i32) -> CancellationPolicy {
        CancellationPolicy {
            policy_type: CancellationPolicyType::Flexible,
            free_until_days_before_checkin: free_until_days,
            penalty_percent,
            notes: None,
        }
    }

    #[test]
    fn non_refundable_policy_never_refunds() {
        let policy = CancellationPolicy {
            policy_type: CancellationPolicyType::NonRefundable,
            free_until_days_before_checkin: 7,
            penalty_percent: 100,
            notes: None,
        };
        let checkin = Utc::now().date_naive() + chrono::Duration::days(30);
        assert_eq!(calculate_refund(10_000, checkin, &policy), 0);
    }

    #[test]
    fn free_policy_always_refunds_in_full() {
        let policy = CancellationPolicy {
            policy_type: CancellationPolicyType::Free,
            free_until_days_before_checkin: 0,
            penalty_percent: 100,
            notes: None,
        };
        let checkin = Utc::now().date_naive();
        assert_eq!(calculate_refund(10_000, checkin, &policy), 10_000);
    }

    #[test]
    fn flexible_policy_refunds_in_full_outside_the_penalty_window() {
        let policy = flexible_policy(7, 100);
        let checkin = Utc::now().date_naive() + chrono::Duration::days(10);
        assert_eq!(calculate_refund(10_000, checkin, &policy), 10_000);
    }

    #[test]
    fn flexible_policy_applies_penalty_inside_the_window() {
        let policy = flexible_policy(7, 40);
        let checkin = Utc::now().date_naive() + chrono::Duration::days(3);
        // 60% refunded, floor division
        assert_eq!(calculate_refund(10_001, checkin, &policy), 6_000);
    }
}

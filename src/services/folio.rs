use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::reservation::{FolioPayment, FolioPaymentMethod, FolioPaymentStatus, FolioSummary};
use crate::repository::{folio, reservations};

/// Records a manual folio payment (cash, Pix, card settled out of
/// band) against a reservation, gated on
/// [`ReservationStatus::is_payable`] — only `confirmed`/`in_house`
/// reservations can take a payment.
pub async fn record_payment(
    pool: &PgPool,
    property_id: Uuid,
    reservation_id: Uuid,
    amount_cents: i64,
    method: FolioPaymentMethod,
) -> AppResult<FolioPayment> {
    if amount_cents <= 0 {
        return Err(AppError::BadRequest("amount_cents must be > 0".to_string()));
    }

    let reservation = reservations::get(pool, property_id, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

    if !reservation.status.is_payable() {
        return Err(AppError::Conflict(format!(
            "reservation status {status:?} does not allow payments",
            status = reservation.status
        )));
    }

    folio::insert_payment(pool, property_id, reservation_id, amount_cents, method)
        .await
        .map_err(AppError::from)
}

/// Builds the financial summary for a reservation: accommodation total,
/// extras total, amount paid (captured payments only), and balance due.
pub async fn get_summary(pool: &PgPool, property_id: Uuid, reservation_id: Uuid) -> AppResult<FolioSummary> {
    let reservation = reservations::get(pool, property_id, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

    let payments = folio::list_payments(pool, reservation_id).await?;
    let extras = folio::list_extras(pool, reservation_id).await?;

    let extras_total_cents: i64 = extras.iter().map(|extra| extra.total_price_cents).sum();
    let paid_cents: i64 = payments
        .iter()
        .filter(|payment| payment.status == FolioPaymentStatus::Captured)
        .map(|payment| payment.amount_cents)
        .sum();

    let balance_cents = reservation.total_cents + extras_total_cents - paid_cents;

    Ok(FolioSummary {
        reservation_id,
        total_cents: reservation.total_cents,
        extras_total_cents,
        paid_cents,
        balance_cents,
        payments,
        extras,
    })
}

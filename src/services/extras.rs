use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::reservation::{ExtraPricingMode, ReservationExtra};
use crate::repository::{folio, reservations};

/// Adds a priced extra to a reservation's folio, pricing grounded on
/// `original_source/domain/extras.py::calculate_extra_total`.
///
/// `nights` and `total_guests` are derived from the reservation itself
/// rather than accepted from the caller, so the price can never be
/// computed against a guest count or stay length that doesn't match
/// what was actually booked.
pub async fn add_extra(
    pool: &PgPool,
    property_id: Uuid,
    reservation_id: Uuid,
    name: &str,
    pricing_mode: ExtraPricingMode,
    unit_price_cents: i64,
    quantity: i32,
) -> AppResult<ReservationExtra> {
    let reservation = reservations::get(pool, property_id, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

    let nights = (reservation.checkout - reservation.checkin).num_days();
    let total_guests = reservation.adult_count as i32 + reservation.children_ages.len() as i32;

    let total_price_cents = pricing_mode
        .calculate_total(unit_price_cents, quantity, nights, total_guests)
        .map_err(AppError::BadRequest)?;

    let extra = ReservationExtra {
        id: Uuid::nil(),
        property_id,
        reservation_id,
        name: name.to_string(),
        pricing_mode,
        unit_price_cents,
        quantity,
        total_price_cents,
    };

    folio::insert_extra(pool, &extra).await.map_err(AppError::from)
}

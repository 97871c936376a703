use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::db::Tx;
use crate::models::reservation::{Reservation, ReservationStatus};

const RESERVATION_COLUMNS: &str = "id, property_id, hold_id, status, checkin, checkout,
         total_cents, currency, room_type_id, room_id, guest_id, guest_name,
         adult_count, children_ages, adjusted_checkin, adjusted_checkout,
         created_at, updated_at";

pub struct NewReservation<'a> {
    pub property_id: Uuid,
    pub hold_id: Uuid,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub total_cents: i64,
    pub currency: &'a str,
    pub room_type_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub guest_name: Option<&'a str>,
    pub adult_count: i16,
    pub children_ages: &'a [i16],
}

/// Inserts a reservation from a converted hold, relying on
/// `UNIQUE (property_id, hold_id)` for exactly-once conversion. Returns
/// the existing row on replay.
pub async fn insert_from_hold(
    tx: &mut Tx<'_>,
    new: &NewReservation<'_>,
) -> Result<(Reservation, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, Reservation>(&format!(
        "INSERT INTO reservations (
            property_id, hold_id, status, checkin, checkout, total_cents, currency,
            room_type_id, guest_id, guest_name, adult_count, children_ages
         )
         VALUES ($1,$2,'confirmed',$3,$4,$5,$6,$7,$8,$9,$10,$11)
         ON CONFLICT (property_id, hold_id) DO NOTHING
         RETURNING {RESERVATION_COLUMNS}"
    ))
    .bind(new.property_id)
    .bind(new.hold_id)
    .bind(new.checkin)
    .bind(new.checkout)
    .bind(new.total_cents)
    .bind(new.currency)
    .bind(new.room_type_id)
    .bind(new.guest_id)
    .bind(new.guest_name)
    .bind(new.adult_count)
    .bind(new.children_ages)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(reservation) = inserted {
        return Ok((reservation, true));
    }

    let existing = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations
         WHERE property_id = $1 AND hold_id = $2"
    ))
    .bind(new.property_id)
    .bind(new.hold_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok((existing, false))
}

pub async fn get<'c, E>(executor: E, property_id: Uuid, reservation_id: Uuid) -> Result<Option<Reservation>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 AND property_id = $2"
    ))
    .bind(reservation_id)
    .bind(property_id)
    .fetch_optional(executor)
    .await
}

/// Locks the reservation row for update, used by cancellation and
/// check-in/check-out transitions.
pub async fn lock<'c, E>(executor: E, reservation_id: Uuid) -> Result<Option<Reservation>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"
    ))
    .bind(reservation_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_status<'c, E>(executor: E, reservation_id: Uuid, status: ReservationStatus) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE reservations SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(reservation_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn assign_room<'c, E>(executor: E, reservation_id: Uuid, room_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE reservations SET room_id = $1, updated_at = now() WHERE id = $2")
        .bind(room_id)
        .bind(reservation_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// A reservation's `(id, checkin, checkout)` on one physical room,
/// narrowed to the three operational statuses. The date-overlap test
/// itself is left to [`crate::services::room_conflict::first_conflict`]
/// so that logic is unit-testable without a pool; this query only
/// narrows by room and status, which SQL is the right place to do.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomOccupancyWindow {
    pub id: Uuid,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

/// Every operational (`confirmed`/`in_house`/`checked_out`) reservation
/// currently occupying `room_id`, for the overlap check in
/// `services::room_conflict`.
pub async fn list_operational_windows_for_room<'c, E>(
    executor: E,
    room_id: Uuid,
) -> Result<Vec<RoomOccupancyWindow>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, RoomOccupancyWindow>(
        "SELECT id, checkin, checkout FROM reservations
         WHERE room_id = $1
           AND status IN ('confirmed', 'in_house', 'checked_out')
         ORDER BY checkin",
    )
    .bind(room_id)
    .fetch_all(executor)
    .await
}

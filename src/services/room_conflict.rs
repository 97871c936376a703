use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::reservations::{self, RoomOccupancyWindow};

/// `true` if `[checkin, checkout)` and `[other_checkin, other_checkout)`
/// share at least one night. Strict inequality on both sides means a
/// stay starting the day another one checks out does not conflict.
pub fn overlaps(
    checkin: NaiveDate,
    checkout: NaiveDate,
    other_checkin: NaiveDate,
    other_checkout: NaiveDate,
) -> bool {
    checkin < other_checkout && checkout > other_checkin
}

/// First window in `candidates` that overlaps `[checkin, checkout)`,
/// excluding `exclude_reservation_id` (the reservation being edited, if
/// any). Pure and pool-free so the overlap/touching/self-exclusion
/// rules can be unit tested directly, mirroring the
/// `pricing::validate_pax_request` split of sync validation from the
/// DB fetch that feeds it.
pub fn first_conflict(
    checkin: NaiveDate,
    checkout: NaiveDate,
    exclude_reservation_id: Option<Uuid>,
    candidates: &[RoomOccupancyWindow],
) -> Option<&RoomOccupancyWindow> {
    candidates.iter().find(|candidate| {
        Some(candidate.id) != exclude_reservation_id
            && overlaps(checkin, checkout, candidate.checkin, candidate.checkout)
    })
}

/// Raises `AppError::BusinessConflict { code: "room_conflict", .. }` if
/// `room_id` has an operational reservation overlapping
/// `[checkin, checkout)`, excluding `exclude_reservation_id` (spec
/// §4.H.4, grounded on
/// `original_source/domain/room_conflict.py::assert_no_room_conflict`).
///
/// Called both when assigning a room to a new reservation and when
/// editing an existing reservation's dates — in the latter case the
/// reservation being edited must exclude itself from the overlap check.
/// A unique exclusion constraint on the reservations table is the last
/// line of defense; this check exists to fail with a clear, non-generic
/// error before that constraint would.
pub async fn assert_no_conflict<'c, E>(
    executor: E,
    property_id: Uuid,
    room_id: Uuid,
    checkin: NaiveDate,
    checkout: NaiveDate,
    exclude_reservation_id: Option<Uuid>,
) -> AppResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let candidates = reservations::list_operational_windows_for_room(executor, room_id).await?;

    if let Some(existing) = first_conflict(checkin, checkout, exclude_reservation_id, &candidates) {
        tracing::warn!(
            room_id = %room_id,
            property_id = %property_id,
            requested_checkin = %checkin,
            requested_checkout = %checkout,
            conflicting_reservation_id = %existing.id,
            existing_checkin = %existing.checkin,
            existing_checkout = %existing.checkout,
            "room conflict detected"
        );
        return Err(AppError::BusinessConflict {
            code: "room_conflict".to_string(),
            message: format!(
                "room {room_id} has a conflicting reservation from {} to {}",
                existing.checkin, existing.checkout
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: Uuid, checkin: (i32, u32, u32), checkout: (i32, u32, u32)) -> RoomOccupancyWindow {
        RoomOccupancyWindow {
            id,
            checkin: NaiveDate::from_ymd_opt(checkin.0, checkin.1, checkin.2).unwrap(),
            checkout: NaiveDate::from_ymd_opt(checkout.0, checkout.1, checkout.2).unwrap(),
        }
    }

    #[test]
    fn overlapping_stays_conflict() {
        // R1 2026-03-10..2026-03-13 (spec §8 scenario 5)
        let r1 = window(Uuid::new_v4(), (2026, 3, 10), (2026, 3, 13));
        let checkin = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();
        let checkout = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let found = first_conflict(checkin, checkout, None, std::slice::from_ref(&r1));
        assert_eq!(found.map(|w| w.id), Some(r1.id));
    }

    #[test]
    fn touching_dates_do_not_conflict() {
        let existing = window(Uuid::new_v4(), (2026, 7, 1), (2026, 8, 1));
        let new_checkin = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let new_checkout = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert!(first_conflict(new_checkin, new_checkout, None, std::slice::from_ref(&existing)).is_none());

        // Symmetric case: new stay checks out the day the existing one checks in.
        let new_checkin2 = NaiveDate::from_ymd_opt(2026, 6, 25).unwrap();
        let new_checkout2 = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert!(first_conflict(new_checkin2, new_checkout2, None, std::slice::from_ref(&existing)).is_none());
    }

    #[test]
    fn fully_contained_stay_conflicts() {
        let existing = window(Uuid::new_v4(), (2026, 3, 1), (2026, 3, 31));
        let checkin = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let checkout = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();
        assert!(first_conflict(checkin, checkout, None, std::slice::from_ref(&existing)).is_some());
    }

    #[test]
    fn editing_a_reservations_own_dates_excludes_itself() {
        let id = Uuid::new_v4();
        let existing = window(id, (2026, 3, 10), (2026, 3, 13));
        // Same reservation extending its own stay by a night still
        // overlaps its own prior window, but must not self-conflict.
        let checkin = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let checkout = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert!(first_conflict(checkin, checkout, Some(id), std::slice::from_ref(&existing)).is_none());

        // A different reservation over the same window is still a conflict.
        assert!(first_conflict(checkin, checkout, Some(Uuid::new_v4()), std::slice::from_ref(&existing)).is_some());
    }

    #[test]
    fn first_conflict_picks_the_earliest_candidate() {
        let later = window(Uuid::new_v4(), (2026, 3, 20), (2026, 3, 25));
        let earlier = window(Uuid::new_v4(), (2026, 3, 10), (2026, 3, 15));
        let candidates = [later.clone(), earlier.clone()];
        let checkin = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let checkout = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        // Both overlap; first_conflict returns whichever the caller
        // ordered first (repository orders by checkin), not necessarily
        // the soonest by date — assert it surfaces *a* real conflict.
        let found = first_conflict(checkin, checkout, None, &candidates);
        assert!(found.is_some());
        assert!(found.unwrap().id == later.id || found.unwrap().id == earlier.id);
    }
}

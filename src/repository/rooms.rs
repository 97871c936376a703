use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppResult, OptionExt};
use crate::models::room::{HousekeepingState, Room, RoomType};

pub async fn get_room_type(pool: &PgPool, property_id: Uuid, room_type_id: Uuid) -> AppResult<RoomType> {
    sqlx::query_as::<_, RoomType>(
        "SELECT id, property_id, name, description, max_occupancy, deleted_at
         FROM room_types WHERE id = $1 AND property_id = $2",
    )
    .bind(room_type_id)
    .bind(property_id)
    .fetch_optional(pool)
    .await?
    .ok_or_not_found("room type")
}

pub async fn get_room(pool: &PgPool, property_id: Uuid, room_id: Uuid) -> AppResult<Room> {
    sqlx::query_as::<_, Room>(
        "SELECT id, property_id, room_type_id, name, active, housekeeping_state
         FROM rooms WHERE id = $1 AND property_id = $2",
    )
    .bind(room_id)
    .bind(property_id)
    .fetch_optional(pool)
    .await?
    .ok_or_not_found("room")
}

/// Only `clean` rooms may receive a check-in.
pub fn assert_accepts_checkin(room: &Room) -> AppResult<()> {
    if !room.housekeeping_state.accepts_checkin() {
        return Err(crate::error::AppError::BusinessConflict {
            code: "room_not_clean".to_string(),
            message: format!(
                "room is in housekeeping state {:?}, must be clean to check in",
                room.housekeeping_state
            ),
        });
    }
    Ok(())
}

/// Property-configured conversational aliases (e.g. "casal" → a room
/// type uuid), used by [`crate::services::parsing`] to resolve a
/// free-text room type mention. Unconfigured properties get no matches
/// rather than a hardcoded global id, since room type ids are
/// per-property.
pub async fn list_room_type_aliases(
    pool: &PgPool,
    property_id: Uuid,
) -> Result<Vec<(String, Uuid)>, sqlx::Error> {
    sqlx::query_as::<_, (String, Uuid)>(
        "SELECT alias, room_type_id FROM room_type_aliases WHERE property_id = $1",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await
}

pub async fn set_housekeeping_state(
    pool: &PgPool,
    property_id: Uuid,
    room_id: Uuid,
    state: HousekeepingState,
) -> AppResult<()> {
    sqlx::query("UPDATE rooms SET housekeeping_state = $1 WHERE id = $2 AND property_id = $3")
        .bind(state)
        .bind(room_id)
        .bind(property_id)
        .execute(pool)
        .await?;
    Ok(())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomType {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_occupancy: i16,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RoomType {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "housekeeping_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HousekeepingState {
    Dirty,
    Cleaning,
    Clean,
    Maintenance,
}

impl HousekeepingState {
    /// Only `clean` rooms may receive a check-in.
    pub fn accepts_checkin(self) -> bool {
        matches!(self, HousekeepingState::Clean)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: Uuid,
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub name: String,
    pub active: bool,
    pub housekeeping_state: HousekeepingState,
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Identity-resolved guest profile keyed by `(property, email)` or
/// `(property, phone)` with partial-unique indexes.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Guest {
    pub id: Uuid,
    pub property_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Pending,
    Succeeded,
    Failed,
    NeedsManual,
}

/// One row per checkout session. Unique by `(property_id, provider,
/// provider_object_id)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub property_id: Uuid,
    pub hold_id: Option<Uuid>,
    pub provider: String,
    pub provider_object_id: String,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub currency: String,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "conversation_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Start,
    CollectingDates,
    CollectingRoomType,
    ReadyToQuote,
}

impl ConversationState {
    /// Deterministic forward-only transition. Idempotent at the terminal
    /// state.
    pub fn advance(self) -> ConversationState {
        match self {
            ConversationState::Start => ConversationState::CollectingDates,
            ConversationState::CollectingDates => ConversationState::CollectingRoomType,
            ConversationState::CollectingRoomType => ConversationState::ReadyToQuote,
            ConversationState::ReadyToQuote => ConversationState::ReadyToQuote,
        }
    }
}

/// Accumulated, partial booking intent attached to a conversation. Merged
/// field-by-field as new entities are parsed out of inbound messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingContext {
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
    pub room_type_id: Option<Uuid>,
    pub adult_count: Option<i16>,
    pub children_ages: Option<Vec<i16>>,
}

/// Fixed prompt order used to pick the next missing-field prompt
/// deterministically.
const FIELD_ORDER: [MissingField; 5] = [
    MissingField::Checkin,
    MissingField::Checkout,
    MissingField::RoomType,
    MissingField::AdultCount,
    MissingField::ChildrenAges,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Checkin,
    Checkout,
    RoomType,
    AdultCount,
    ChildrenAges,
}

impl MissingField {
    /// Template key used to select the outbound prompt for this field.
    pub fn prompt_template_key(self) -> &'static str {
        match self {
            MissingField::Checkin => "prompt_checkin",
            MissingField::Checkout => "prompt_checkout",
            MissingField::RoomType => "prompt_room_type",
            MissingField::AdultCount => "prompt_adult_count",
            MissingField::ChildrenAges => "prompt_children_ages",
        }
    }
}

impl BookingContext {
    /// Merges newly parsed entities into the context without discarding
    /// previously known fields.
    pub fn merge(&mut self, other: &BookingContext) {
        if other.checkin.is_some() {
            self.checkin = other.checkin;
        }
        if other.checkout.is_some() {
            self.checkout = other.checkout;
        }
        if other.room_type_id.is_some() {
            self.room_type_id = other.room_type_id;
        }
        if other.adult_count.is_some() {
            self.adult_count = other.adult_count;
        }
        if other.children_ages.is_some() {
            self.children_ages = other.children_ages.clone();
        }
    }

    /// First missing field in the fixed prompt order, if any. `None` means
    /// the context has everything the pricing pipeline needs.
    pub fn first_missing(&self) -> Option<MissingField> {
        FIELD_ORDER.into_iter().find(|field| match field {
            MissingField::Checkin => self.checkin.is_none(),
            MissingField::Checkout => self.checkout.is_none(),
            MissingField::RoomType => self.room_type_id.is_none(),
            MissingField::AdultCount => self.adult_count.is_none(),
            MissingField::ChildrenAges => false,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub property_id: Uuid,
    pub channel: String,
    pub contact_hash: String,
    pub state: ConversationState,
    pub context: sqlx::types::Json<BookingContext>,
    pub last_activity_at: DateTime<Utc>,
}

/// Immutable priced proposal snapshot bound to a conversation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuoteOption {
    pub id: Uuid,
    pub property_id: Uuid,
    pub conversation_id: Uuid,
    pub room_type_id: Uuid,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub total_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

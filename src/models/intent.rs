use chrono::NaiveDate;
use uuid::Uuid;

/// Deterministic extraction result from [`crate::services::parsing`].
/// Ported semantics from `original_source/domain/parsing.py`'s
/// `ParsedIntent`, restated as a typed struct instead of a loose dict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIntent {
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
    pub room_type_id: Option<Uuid>,
    pub adult_count: Option<i16>,
    pub children_ages: Option<Vec<i16>>,
}

use axum::http::HeaderName;
use uuid::Uuid;

/// Inbound/outbound header carrying the correlation id across the
/// webhook → task → worker boundary.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Produces a fresh correlation id, used when an inbound request carries
/// none.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

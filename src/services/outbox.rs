use uuid::Uuid;

use crate::db::Tx;
use crate::models::outbox::OutboxPayload;
use crate::repository::outbox as outbox_repo;

/// Appends one audit-log row to the outbox in the caller's transaction
/// and returns its generated id. This function only ever writes the
/// row — it never enqueues a task itself, since it runs inside a
/// transaction that may still roll back.
///
/// Callers that need the event dispatched (e.g. a WhatsApp send) do so
/// as an explicit sibling step after the transaction commits, deriving
/// the task's dedup id from the event id this function returns. See
/// [`crate::services::holds::create_hold`] and
/// [`crate::services::conversation_fsm`] for the pattern.
pub async fn emit(
    tx: &mut Tx<'_>,
    property_id: Uuid,
    aggregate_id: Uuid,
    payload: OutboxPayload,
    correlation_id: Option<Uuid>,
) -> Result<Uuid, sqlx::Error> {
    outbox_repo::emit_event(&mut **tx, property_id, aggregate_id, &payload, correlation_id).await
}

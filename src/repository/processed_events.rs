use sqlx::{Executor, Postgres};
use uuid::Uuid;

/// Inserts the dedupe-ledger row for `(property_id, source, external_id)`.
/// Returns `true` if the row was newly inserted (the event has not been
/// processed before); `false` if it already existed, in which case the
/// caller MUST treat the event as already processed and perform no
/// further side effects.
///
/// This MUST be the first write in the handling transaction so that any
/// later failure rolls the ledger row back with it.
pub async fn insert_if_new<'c, E>(
    executor: E,
    property_id: Uuid,
    source: &str,
    external_id: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "INSERT INTO processed_events (property_id, source, external_id)
         VALUES ($1, $2, $3)
         ON CONFLICT (property_id, source, external_id) DO NOTHING",
    )
    .bind(property_id)
    .bind(source)
    .bind(external_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    // Covered end-to-end via services::holds / services::tasks tests using
    // the inline dispatcher fake, since this function needs a live pool to
    // exercise the ON CONFLICT path meaningfully.
}

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::AppError;

/// A transaction handle used throughout the repository layer.
pub type Tx<'a> = Transaction<'a, Postgres>;

/// Starts a `SERIALIZABLE` transaction, matching the hold and
/// reservation paths' requirement that concurrent interleavings be
/// caught by the database rather than by application-level locking
/// alone. Guarded UPDATE statements still do the primary enforcement;
/// `SERIALIZABLE` is the belt to their suspenders.
pub async fn begin_serializable(pool: &PgPool) -> Result<Tx<'static>, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Starts a plain `READ COMMITTED` transaction for paths that only take
/// a row lock on a single aggregate (folio payments, settings upserts).
pub async fn begin(pool: &PgPool) -> Result<Tx<'static>, AppError> {
    Ok(pool.begin().await?)
}

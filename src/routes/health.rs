use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    // Wrap in a short timeout so the healthcheck always responds quickly,
    // even if the connection pool's first DB connection hangs (DNS, SSL, TCP).
    let db_ok = match tokio::time::timeout(
        Duration::from_secs(3),
        sqlx::query("SELECT 1").fetch_one(&state.db_pool),
    )
    .await
    {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            tracing::error!(error = %err, "health check db query failed");
            false
        }
        Err(_) => {
            tracing::error!("health check db query timed out (3s)");
            false
        }
    };

    let status = if db_ok { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "now": Utc::now().to_rfc3339(),
        "db": db_ok
    }))
}

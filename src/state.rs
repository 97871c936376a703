use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::auth::JwksCache;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::pii_vault::PiiVault;
use crate::services::tasks::TaskDispatcher;

/// Shared application state, built once at startup and cloned cheaply
/// per request (`PgPool`, `reqwest::Client` and the `Arc`-wrapped caches
/// are all internally reference counted).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: PgPool,
    pub http_client: reqwest::Client,
    pub jwks_cache: Option<Arc<JwksCache>>,
    pub pii_vault: Arc<PiiVault>,
    pub tasks: Arc<TaskDispatcher>,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, AppError> {
        config
            .require_secrets()
            .map_err(AppError::ConfigurationMissing)?;

        let db_pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(&config.database_url)
            .map_err(|err| AppError::ConfigurationMissing(format!("DATABASE_URL invalid: {err}")))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        let jwks_cache = config
            .tasks_oidc_audience
            .as_ref()
            .map(|_| Arc::new(JwksCache::new(Duration::from_secs(600))));

        let pii_vault = Arc::new(PiiVault::new(&config)?);
        let tasks = Arc::new(TaskDispatcher::new(&config, http_client.clone()));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            http_client,
            jwks_cache,
            pii_vault,
            tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn app_state_is_send_and_sync() {
        assert_send_sync::<AppState>();
    }
}

#![allow(dead_code)]

use std::env;

/// Environment-derived application configuration.
///
/// Built once at startup via [`AppConfig::from_env`]. Fields that are
/// required for correct operation in production but have no safe default
/// (PII vault key, contact hash secret) are validated eagerly by
/// [`AppConfig::require_secrets`] rather than silently defaulted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub worker_port: u16,
    pub cors_origins: Vec<String>,
    pub trusted_hosts: Vec<String>,
    pub database_url: String,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,

    /// 32-byte key (any encoding env accepts hex or raw utf8 of len 32)
    /// used for the conversation contact hash (HMAC-SHA256, truncated).
    pub contact_hash_secret: Option<String>,
    /// 32-byte AES-256-GCM key for the PII vault, hex-encoded (64 hex chars).
    pub contact_refs_key: Option<String>,
    pub contact_ref_ttl_hours: i64,

    pub tasks_backend: TasksBackend,
    pub tasks_oidc_audience: Option<String>,
    pub tasks_oidc_service_account: Option<String>,
    pub worker_base_url: Option<String>,
    pub internal_task_secret: Option<String>,
    pub http_timeout_seconds: u64,

    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    /// Base URL the guest is redirected to after a Stripe Checkout
    /// Session completes or is cancelled.
    pub app_public_url: String,

    pub whatsapp_meta_app_secret: Option<String>,
    pub whatsapp_meta_access_token: Option<String>,
    pub whatsapp_meta_phone_number_id: Option<String>,
    pub whatsapp_meta_graph_api_version: String,
    pub whatsapp_evolution_base_url: Option<String>,
    pub whatsapp_evolution_api_key: Option<String>,
    pub whatsapp_evolution_instance: Option<String>,

    /// Cloud Tasks queue coordinates, only consulted when
    /// `tasks_backend == CloudTasks`.
    pub gcp_project_id: Option<String>,
    pub gcp_location: String,
    pub gcp_tasks_queue: String,
}

/// The sentinel audience that switches task auth from OIDC to a shared
/// internal secret header. Mirrors the Python original's
/// `_LOCAL_DEV_AUDIENCE` constant.
pub const LOCAL_DEV_AUDIENCE: &str = "hotelly-tasks-local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasksBackend {
    Inline,
    Http,
    CloudTasks,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Hotelly API"),
            environment: env_or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&env_or("API_PREFIX", "/v1")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8000),
            worker_port: env_parse_or("WORKER_PORT", 8001),
            cors_origins: parse_csv(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            trusted_hosts: parse_csv(&env_or("TRUSTED_HOSTS", "localhost,127.0.0.1")),
            database_url: env_or("DATABASE_URL", "postgres://localhost/hotelly"),
            rate_limit_enabled: env_parse_bool_or("RATE_LIMIT_ENABLED", true),
            rate_limit_per_second: env_parse_or("RATE_LIMIT_PER_SECOND", 20),
            rate_limit_burst_size: env_parse_or("RATE_LIMIT_BURST_SIZE", 40),

            contact_hash_secret: env_opt("CONTACT_HASH_SECRET"),
            contact_refs_key: env_opt("CONTACT_REFS_KEY"),
            contact_ref_ttl_hours: env_parse_or("CONTACT_REF_TTL_HOURS", 24),

            tasks_backend: parse_tasks_backend(&env_or("TASKS_BACKEND", "inline")),
            tasks_oidc_audience: env_opt("TASKS_OIDC_AUDIENCE"),
            tasks_oidc_service_account: env_opt("TASKS_OIDC_SERVICE_ACCOUNT"),
            worker_base_url: env_opt("WORKER_BASE_URL"),
            internal_task_secret: env_opt("INTERNAL_TASK_SECRET"),
            http_timeout_seconds: env_parse_or("HTTP_TIMEOUT_SECONDS", 8),

            stripe_secret_key: env_opt("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: env_opt("STRIPE_WEBHOOK_SECRET"),
            app_public_url: env_or("APP_PUBLIC_URL", "http://localhost:3000"),

            whatsapp_meta_app_secret: env_opt("WHATSAPP_META_APP_SECRET"),
            whatsapp_meta_access_token: env_opt("WHATSAPP_META_ACCESS_TOKEN"),
            whatsapp_meta_phone_number_id: env_opt("WHATSAPP_META_PHONE_NUMBER_ID"),
            whatsapp_meta_graph_api_version: env_or("WHATSAPP_META_GRAPH_API_VERSION", "v21.0"),
            whatsapp_evolution_base_url: env_opt("WHATSAPP_EVOLUTION_BASE_URL"),
            whatsapp_evolution_api_key: env_opt("WHATSAPP_EVOLUTION_API_KEY"),
            whatsapp_evolution_instance: env_opt("WHATSAPP_EVOLUTION_INSTANCE"),

            gcp_project_id: env_opt("GOOGLE_CLOUD_PROJECT").or_else(|| env_opt("GCP_PROJECT_ID")),
            gcp_location: env_or("GCP_LOCATION", "us-central1"),
            gcp_tasks_queue: env_or("GCP_TASKS_QUEUE", "hotelly-default"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    pub fn rate_limit_enabled_runtime(&self) -> bool {
        self.rate_limit_enabled
    }

    /// Whether the task dispatcher/handler pair is running under the
    /// local-development sentinel audience (shared-secret auth instead of
    /// OIDC).
    pub fn tasks_local_dev(&self) -> bool {
        matches!(self.tasks_oidc_audience.as_deref(), Some(LOCAL_DEV_AUDIENCE))
            || self.tasks_oidc_audience.is_none()
    }

    /// Fatal-at-startup configuration check for secrets that have no safe
    /// default. Called once from both the api and worker binaries.
    pub fn require_secrets(&self) -> Result<(), String> {
        if self.contact_hash_secret.is_none() {
            return Err("CONTACT_HASH_SECRET is not set".to_string());
        }
        if self.contact_refs_key.is_none() {
            return Err("CONTACT_REFS_KEY is not set".to_string());
        }
        if self.tasks_backend == TasksBackend::Http
            && !self.tasks_local_dev()
            && self.tasks_oidc_audience.is_none()
        {
            return Err("TASKS_OIDC_AUDIENCE is required for the http task backend".to_string());
        }
        if self.tasks_backend == TasksBackend::CloudTasks {
            if self.gcp_project_id.is_none() {
                return Err("GOOGLE_CLOUD_PROJECT is required for the cloud_tasks backend".to_string());
            }
            if self.worker_base_url.is_none() {
                return Err("WORKER_BASE_URL is required for the cloud_tasks backend".to_string());
            }
            if self.tasks_oidc_service_account.is_none() {
                return Err("TASKS_OIDC_SERVICE_ACCOUNT is required for the cloud_tasks backend".to_string());
            }
        }
        Ok(())
    }
}

fn parse_tasks_backend(raw: &str) -> TasksBackend {
    match raw.trim().to_ascii_lowercase().as_str() {
        "http" => TasksBackend::Http,
        "cloud_tasks" | "cloud-tasks" => TasksBackend::CloudTasks,
        _ => TasksBackend::Inline,
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_parse_bool_or(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase) {
        Some(value) if value == "1" || value == "true" || value == "yes" || value == "on" => true,
        Some(value) if value == "0" || value == "false" || value == "no" || value == "off" => false,
        _ => default,
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_prefix() {
        assert_eq!(normalize_prefix("v1"), "/v1");
        assert_eq!(normalize_prefix("/v1/"), "/v1");
        assert_eq!(normalize_prefix(""), "/v1");
    }

    #[test]
    fn tasks_backend_defaults_to_inline() {
        assert_eq!(parse_tasks_backend("nonsense"), TasksBackend::Inline);
        assert_eq!(parse_tasks_backend("HTTP"), TasksBackend::Http);
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Closed error taxonomy for the booking transaction fabric.
///
/// Variant choice follows two sources: the names the rest of this crate's
/// call sites already expect (`BadRequest`, `NotFound`, `Forbidden`,
/// `Unauthorized`, `Conflict`, `Dependency`, `ServiceUnavailable`,
/// `UnprocessableEntity`, `Internal`, `Gone`) plus the provider/consistency
/// kinds that only the transactional core needs (`Unavailable`,
/// `ProviderTransient`, `ProviderPermanent`, `InventoryConsistency`,
/// `ConfigurationMissing`).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized(String),

    #[error("forbidden")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Idempotent replay: the caller already produced this result. Carries
    /// the response that should be returned verbatim.
    #[error("already processed")]
    AlreadyProcessed,

    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("gone: {0}")]
    Gone(String),

    /// No inventory available for the requested dates.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A room-level or business-rule conflict distinct from idempotent
    /// replay, e.g. `room_conflict`. Carries a machine-readable code.
    #[error("business conflict: {code}")]
    BusinessConflict { code: String, message: String },

    /// The upstream provider failed in a way that should be retried
    /// (network error, 5xx).
    #[error("provider transient error: {0}")]
    ProviderTransient(String),

    /// The upstream provider rejected the request outright (4xx); do not
    /// retry, but the caller-facing response is still a 5xx per the
    /// transactional-core contract (the *caller's* request was fine).
    #[error("provider permanent error: {0}")]
    ProviderPermanent(String),

    /// A guarded UPDATE affected zero rows where invariants guarantee it
    /// should not have. This can only mean the invariant was already
    /// violated; abort and alert rather than silently continuing.
    #[error("inventory consistency violation: {0}")]
    InventoryConsistency(String),

    /// Required configuration (secret, key, URL) is absent. Fatal at
    /// startup; also returned if a handler discovers it lazily.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("dependency error: {0}")]
    Dependency(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AlreadyProcessed => StatusCode::OK,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Unavailable(_) => StatusCode::CONFLICT,
            AppError::BusinessConflict { .. } => StatusCode::CONFLICT,
            AppError::ProviderTransient(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderPermanent(_) => StatusCode::BAD_GATEWAY,
            AppError::InventoryConsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AlreadyProcessed => "already_processed",
            AppError::UnprocessableEntity(_) => "unprocessable_entity",
            AppError::Gone(_) => "gone",
            AppError::Unavailable(_) => "unavailable",
            AppError::BusinessConflict { .. } => "business_conflict",
            AppError::ProviderTransient(_) => "provider_transient",
            AppError::ProviderPermanent(_) => "provider_permanent",
            AppError::InventoryConsistency(_) => "inventory_consistency",
            AppError::ConfigurationMissing(_) => "configuration_missing",
            AppError::Dependency(_) => "dependency_error",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) => "database_error",
        }
    }

    /// Message safe to return to an API caller. Never leaks driver-level
    /// detail for database/internal/provider failures.
    fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "a database error occurred".to_string(),
            AppError::Internal(_) => "an internal error occurred".to_string(),
            AppError::Dependency(_) => "a required dependency is unavailable".to_string(),
            AppError::InventoryConsistency(_) => "an inventory consistency check failed".to_string(),
            AppError::BusinessConflict { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), %status, "request failed");
        } else {
            tracing::warn!(error_code = self.error_code(), %status, "request rejected");
        }

        let code = match &self {
            AppError::BusinessConflict { code, .. } => Some(code.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.error_code().to_string(),
            detail: self.user_message(),
            code,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Analogue of `Option::ok_or_else` specialised to the not-found case,
/// matching the call-site idiom used throughout the repository layer.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, what: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, what: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(what.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_hide_detail_from_caller() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.user_message(), "a database error occurred");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn business_conflict_carries_machine_code() {
        let err = AppError::BusinessConflict {
            code: "room_conflict".to_string(),
            message: "room is already booked for part of this stay".to_string(),
        };
        assert_eq!(err.error_code(), "business_conflict");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}

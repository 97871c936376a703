#![allow(dead_code)]

use axum::extract::FromRequestParts;
use axum::http::header::HeaderName;
use axum::http::request::Parts;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{role_at_least, CurrentUser, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the tenant a request operates against. Every
/// tenant-owned query predicate MUST include `property_id`;
/// this extractor is the single place that resolves it before a
/// handler ever sees it.
pub static PROPERTY_ID_HEADER: HeaderName = HeaderName::from_static("x-property-id");

/// A request's resolved (property, caller, role) triple. Handlers that
/// need a minimum role should call [`PropertyContext::require_role`]
/// rather than comparing `role` directly, so the comparison direction
/// can't be inverted at a call site.
#[derive(Debug, Clone)]
pub struct PropertyContext {
    pub property_id: Uuid,
    pub user: CurrentUser,
    pub role: Role,
}

impl PropertyContext {
    pub fn require_role(&self, required: Role) -> Result<(), AppError> {
        if role_at_least(self.role, required) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {actual:?} does not meet required role {required:?}",
                actual = self.role
            )))
        }
    }
}

impl<S> FromRequestParts<S> for PropertyContext
where
    AppState: axum::extract::FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let property_id = parts
            .headers
            .get(&PROPERTY_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("missing X-Property-Id header".to_string()))?
            .parse::<Uuid>()
            .map_err(|_| AppError::BadRequest("X-Property-Id is not a valid uuid".to_string()))?;

        let role = get_role(&app_state.db_pool, property_id, &user.subject)
            .await?
            .ok_or_else(|| AppError::Forbidden("caller has no role on this property".to_string()))?;

        Ok(PropertyContext {
            property_id,
            user,
            role,
        })
    }
}

/// Looks up the caller's role on a given property. A missing row means
/// the caller has no membership at all on this property, distinct from
/// holding the lowest (`viewer`) role, which is represented by a row.
pub async fn get_role(pool: &PgPool, property_id: Uuid, subject: &str) -> Result<Option<Role>, AppError> {
    let role: Option<Role> = sqlx::query_scalar(
        "SELECT role FROM property_members WHERE property_id = $1 AND subject = $2",
    )
    .bind(property_id)
    .bind(subject)
    .fetch_optional(pool)
    .await?;
    Ok(role)
}

/// Asserts the caller holds at least `required` on `property_id` without
/// a full request extraction — used by task handlers and tests that act
/// on behalf of a property rather than through an HTTP request.
pub async fn assert_role(
    pool: &PgPool,
    property_id: Uuid,
    subject: &str,
    required: Role,
) -> Result<(), AppError> {
    let role = get_role(pool, property_id, subject)
        .await?
        .ok_or_else(|| AppError::Forbidden("caller has no role on this property".to_string()))?;
    if role_at_least(role, required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role {role:?} does not meet required role {required:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_context_require_role_rejects_below_threshold() {
        let ctx = PropertyContext {
            property_id: Uuid::nil(),
            user: CurrentUser {
                subject: "user_1".to_string(),
                email: None,
            },
            role: Role::Viewer,
        };
        assert!(ctx.require_role(Role::Staff).is_err());
        assert!(ctx.require_role(Role::Viewer).is_ok());
    }
}

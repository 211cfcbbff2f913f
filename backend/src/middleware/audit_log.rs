//! Request metadata attached to every audit entry.

use axum::{
    extract::FromRequestParts,
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::models::system_user::SystemUser;
use crate::services::audit::SYSTEM_ACTOR;

/// Who performed an action and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub user_id: String,
    pub user_role: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl AuditContext {
    /// Context for scheduled jobs that run without a caller.
    pub fn system() -> Self {
        Self {
            user_id: SYSTEM_ACTOR.to_string(),
            user_role: SYSTEM_ACTOR.to_string(),
            ip_address: None,
            user_agent: None,
            request_id: None,
        }
    }

    pub fn for_user(user: &SystemUser, headers: &HeaderMap, request_id: Option<String>) -> Self {
        Self {
            user_id: user.email.clone(),
            user_role: user.role.as_str().to_string(),
            ip_address: extract_ip(headers),
            user_agent: extract_user_agent(headers),
            request_id: request_id.or_else(|| extract_request_id(headers)),
        }
    }
}

impl<S> FromRequestParts<S> for AuditContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<SystemUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;
        let request_id = parts.extensions.get::<RequestId>().map(|id| id.0.clone());
        Ok(Self::for_user(user, &parts.headers, request_id))
    }
}

pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-correlation-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

pub fn extract_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extract_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(extract_ip(&headers).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn extract_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(extract_ip(&headers).as_deref(), Some("198.51.100.4"));
        assert_eq!(extract_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn system_context_uses_system_actor() {
        let ctx = AuditContext::system();
        assert_eq!(ctx.user_id, "system");
        assert_eq!(ctx.user_role, "system");
        assert!(ctx.request_id.is_none());
    }
}

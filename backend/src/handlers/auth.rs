use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::{AuditContext, RequestId},
    models::system_user::{LoginRequest, LoginResponse, SystemUser, SystemUserResponse},
    repositories::system_user as system_user_repo,
    services::audit::{AuditEvent, AuditService},
    state::AppState,
    utils::{jwt::create_access_token, password::verify_password},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    request_id: Option<Extension<RequestId>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = system_user_repo::find_by_email(&state.pool, payload.email.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let password_ok = verify_password(&payload.password, &user.password_hash).unwrap_or_else(|err| {
        tracing::warn!(user_id = user.id, error = %err, "Stored password hash could not be parsed");
        false
    });
    if !password_ok {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }

    system_user_repo::touch_last_login(&state.pool, user.id).await?;

    let access_token = create_access_token(
        user.id,
        user.email.clone(),
        user.role.as_str().to_string(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    let context = AuditContext::for_user(&user, &headers, request_id.map(|Extension(id)| id.0));
    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "login",
                "system_user",
                format!("User {} logged in", user.email),
            )
            .entity(user.id.to_string(), Some(user.full_name())),
        )
        .await;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration_hours * 3600,
        user: SystemUserResponse::from(user),
    }))
}

pub async fn current_user(Extension(user): Extension<SystemUser>) -> Json<SystemUserResponse> {
    Json(SystemUserResponse::from(user))
}

/// Tokens are stateless; logging out only leaves a trace in the audit log.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<Json<Value>, AppError> {
    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "logout",
                "system_user",
                format!("User {} logged out", user.email),
            )
            .entity(user.id.to_string(), Some(user.full_name())),
        )
        .await;

    Ok(Json(json!({ "message": "Logged out" })))
}

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{ensure_super_admin, rule_error},
    middleware::AuditContext,
    models::system_user::{
        ChangePasswordRequest, CreateSystemUser, SystemUser, SystemUserResponse, UpdateSystemUser,
    },
    repositories::system_user::{self as system_user_repo, NewSystemUser},
    services::audit::{AuditEvent, AuditService},
    state::AppState,
    utils::password::hash_password,
    validation::rules::validate_password,
};

pub async fn list_system_users(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
) -> Result<Json<Vec<SystemUserResponse>>, AppError> {
    ensure_super_admin(&user)?;
    let users = system_user_repo::list(&state.pool).await?;
    Ok(Json(users.into_iter().map(SystemUserResponse::from).collect()))
}

pub async fn create_system_user(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(payload): Json<CreateSystemUser>,
) -> Result<(StatusCode, Json<SystemUserResponse>), AppError> {
    ensure_super_admin(&user)?;
    payload.validate()?;
    validate_password(&payload.password, state.config.password_min_length)
        .map_err(|err| rule_error("password", err))?;

    if system_user_repo::find_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("A user with this email already exists"));
    }

    let password_hash = hash_password(&payload.password)?;
    let created = system_user_repo::insert(
        &state.pool,
        &NewSystemUser {
            email: payload.email,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            password_hash,
            role: payload.role,
            assigned_city: payload
                .assigned_city
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            is_active: payload.is_active,
            created_by: Some(user.email.clone()),
        },
    )
    .await?;
    let response = SystemUserResponse::from(created);

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "create_system_user",
                "system_user",
                format!("System user created: {} ({})", response.email, response.role.as_str()),
            )
            .entity(response.id.to_string(), Some(response.email.clone()))
            .new_data(&response),
        )
        .await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_system_user(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSystemUser>,
) -> Result<Json<SystemUserResponse>, AppError> {
    ensure_super_admin(&user)?;
    payload.validate()?;

    let before = system_user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("System user not found"))?;

    if let Some(email) = payload.email.as_deref() {
        if let Some(other) = system_user_repo::find_by_email(&state.pool, email).await? {
            if other.id != id {
                return Err(AppError::conflict("A user with this email already exists"));
            }
        }
    }

    let updated = system_user_repo::update(&state.pool, id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("System user not found"))?;
    let before = SystemUserResponse::from(before);
    let after = SystemUserResponse::from(updated);

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "update_system_user",
                "system_user",
                format!("System user updated: {}", after.email),
            )
            .entity(id.to_string(), Some(after.email.clone()))
            .old_data(&before)
            .new_data(&after),
        )
        .await;

    Ok(Json(after))
}

/// Accounts that must never be removed through the API.
fn ensure_deletable(
    requester: &SystemUser,
    target: &SystemUser,
    protected_email: &str,
) -> Result<(), AppError> {
    if target.id == requester.id {
        return Err(AppError::forbidden("You cannot delete your own account"));
    }
    if target.email.eq_ignore_ascii_case(protected_email) {
        return Err(AppError::forbidden("This super admin account is protected"));
    }
    Ok(())
}

pub async fn delete_system_user(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ensure_super_admin(&user)?;

    let target = system_user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("System user not found"))?;
    ensure_deletable(&user, &target, &state.config.protected_super_admin_email)?;

    system_user_repo::delete(&state.pool, id).await?;
    let removed = SystemUserResponse::from(target);

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "delete_system_user",
                "system_user",
                format!("System user deleted: {}", removed.email),
            )
            .entity(id.to_string(), Some(removed.email.clone()))
            .old_data(&removed),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_system_user_password(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(id): Path<i64>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_super_admin(&user)?;
    validate_password(&payload.new_password, state.config.password_min_length)
        .map_err(|err| rule_error("new_password", err))?;

    let target = system_user_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("System user not found"))?;
    let password_hash = hash_password(&payload.new_password)?;
    system_user_repo::update_password(&state.pool, id, &password_hash).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "change_system_user_password",
                "system_user",
                format!("Password changed for {}", target.email),
            )
            .entity(id.to_string(), Some(target.email.clone())),
        )
        .await;

    Ok(Json(json!({ "message": "Password updated" })))
}

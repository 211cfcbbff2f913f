use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::ensure_can_manage,
    middleware::AuditContext,
    models::{
        employee::Employee,
        it_leave::{CreateItLeaveRequest, ItLeave, ItLeaveType, SetItLeaveRequest},
        system_user::SystemUser,
    },
    repositories::{
        begin_transaction, commit_transaction, employee as employee_repo,
        it_leave as it_leave_repo,
    },
    services::{
        audit::{AuditEvent, AuditService},
        employee_state,
    },
    state::AppState,
    utils::time::today_local,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ItLeaveResponse {
    pub leave: ItLeave,
    pub employee: Employee,
}

async fn start_it_leave(
    state: &AppState,
    user: &SystemUser,
    context: &AuditContext,
    glovo_id: &str,
    leave_type: ItLeaveType,
    leave_date: Option<NaiveDate>,
) -> Result<ItLeaveResponse, AppError> {
    let leave_date = leave_date.unwrap_or_else(|| today_local(&state.config.time_zone));

    let mut tx = begin_transaction(&state.pool).await?;
    let mut employee = employee_repo::find_by_id_for_update(&mut *tx, glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let before = employee.clone();

    employee_state::start_it_leave(&mut employee)?;
    let saved = employee_repo::save(&mut *tx, &employee).await?;
    let leave = it_leave_repo::insert(
        &mut *tx,
        &saved.glovo_id,
        &before.snapshot(),
        leave_type,
        leave_date,
        &user.email,
    )
    .await?;
    commit_transaction(tx).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            context,
            AuditEvent::new(
                "set_it_leave",
                "employee",
                format!(
                    "IT leave ({}) from {} for {} ({})",
                    leave_type.as_str(),
                    leave_date,
                    saved.full_name(),
                    saved.glovo_id
                ),
            )
            .entity(saved.glovo_id.clone(), Some(saved.full_name()))
            .old_data(&before)
            .new_data(&saved),
        )
        .await;

    Ok(ItLeaveResponse {
        leave,
        employee: saved,
    })
}

pub async fn set_employee_it_leave(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
    Json(payload): Json<SetItLeaveRequest>,
) -> Result<Json<ItLeaveResponse>, AppError> {
    ensure_can_manage(&user)?;
    start_it_leave(
        &state,
        &user,
        &context,
        &glovo_id,
        payload.leave_type,
        payload.leave_date,
    )
    .await
    .map(Json)
}

pub async fn create_it_leave(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(payload): Json<CreateItLeaveRequest>,
) -> Result<(StatusCode, Json<ItLeaveResponse>), AppError> {
    ensure_can_manage(&user)?;
    payload.validate()?;
    let response = start_it_leave(
        &state,
        &user,
        &context,
        payload.employee_id.trim(),
        payload.leave_type,
        payload.leave_date,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_it_leaves(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
) -> Result<Json<Vec<ItLeave>>, AppError> {
    ensure_can_manage(&user)?;
    let leaves = it_leave_repo::list(&state.pool).await?;
    Ok(Json(leaves))
}

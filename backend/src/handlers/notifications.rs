use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use sqlx::PgConnection;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{ensure_can_manage, ensure_super_admin, non_empty_filter},
    middleware::AuditContext,
    models::{
        company_leave::CompanyLeaveStatus,
        employee::{Employee, EmployeeStatus},
        notification::{
            CreateNotificationRequest, NewNotification, Notification, NotificationQuery,
            NotificationStatus, NotificationType, ProcessNotificationRequest,
            UpdateNotificationStatusRequest,
        },
        system_user::SystemUser,
    },
    repositories::{
        begin_transaction, commit_transaction, company_leave as company_leave_repo,
        employee as employee_repo, notification as notification_repo,
    },
    services::{
        audit::{AuditEvent, AuditService},
        employee_state,
        leave_workflow::{self, EmployeeEffect, WorkflowAction},
    },
    state::AppState,
    utils::time::today_local,
};

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    ensure_can_manage(&user)?;
    let status = non_empty_filter(query.status)
        .map(|s| s.parse::<NotificationStatus>().map_err(AppError::BadRequest))
        .transpose()?;
    let items = notification_repo::list(&state.pool, status).await?;
    Ok(Json(items))
}

pub async fn create_notification(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    ensure_can_manage(&user)?;
    payload.validate()?;

    let notification = notification_repo::insert(
        &state.pool,
        &NewNotification {
            notification_type: payload.notification_type,
            title: payload.title.trim().to_string(),
            message: payload.message.trim().to_string(),
            requested_by: user.email.clone(),
            status: NotificationStatus::Pending,
            metadata: payload.metadata,
        },
    )
    .await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "create_notification",
                "notification",
                format!("Notification created: {}", notification.title),
            )
            .entity(notification.id.to_string(), Some(notification.title.clone()))
            .new_data(&notification),
        )
        .await;

    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn update_notification_status(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNotificationStatusRequest>,
) -> Result<Json<Notification>, AppError> {
    ensure_can_manage(&user)?;

    let before = notification_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))?;
    let updated = notification_repo::update_status(&state.pool, id, payload.status, None)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "update_notification_status",
                "notification",
                format!(
                    "Notification {} status {} -> {}",
                    id,
                    before.status.as_str(),
                    updated.status.as_str()
                ),
            )
            .entity(id.to_string(), Some(updated.title.clone()))
            .old_data(&json!({ "status": before.status }))
            .new_data(&json!({ "status": updated.status })),
        )
        .await;

    Ok(Json(updated))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessNotificationResponse {
    pub notification: Notification,
    pub action: String,
    pub leave_status: Option<CompanyLeaveStatus>,
    /// Employee row after the decision; `None` when it was removed or not found.
    pub employee: Option<Employee>,
}

/// Side effect on the employee that must be reported after commit.
enum EmployeeOutcome {
    Updated { before: Employee, after: Employee },
    Restored { before: Employee, after: Employee, hours: i32 },
    RestoreFailed { employee_id: String, reason: &'static str },
    Removed(Employee),
    Missing(String),
}

/// Applies the workflow effect to the employee inside the caller's transaction.
async fn apply_employee_effect(
    conn: &mut PgConnection,
    effect: EmployeeEffect,
    employee_id: &str,
    fallback_hours: Option<i32>,
) -> Result<EmployeeOutcome, AppError> {
    let Some(mut employee) = employee_repo::find_by_id_for_update(&mut *conn, employee_id).await?
    else {
        return Ok(match effect {
            EmployeeEffect::Restore => EmployeeOutcome::RestoreFailed {
                employee_id: employee_id.to_string(),
                reason: "employee not found",
            },
            _ => EmployeeOutcome::Missing(employee_id.to_string()),
        });
    };
    let before = employee.clone();

    let outcome = match effect {
        EmployeeEffect::MarkApproved | EmployeeEffect::MarkPendingLaboral => {
            employee.status = if effect == EmployeeEffect::MarkApproved {
                EmployeeStatus::CompanyLeaveApproved
            } else {
                EmployeeStatus::PendingLaboral
            };
            let after = employee_repo::save(&mut *conn, &employee).await?;
            EmployeeOutcome::Updated { before, after }
        }
        EmployeeEffect::Restore => {
            let restored = employee_state::restore_hours(&mut employee, fallback_hours);
            let after = employee_repo::save(&mut *conn, &employee).await?;
            match restored {
                Some(hours) => EmployeeOutcome::Restored {
                    before,
                    after,
                    hours,
                },
                None => EmployeeOutcome::RestoreFailed {
                    employee_id: after.glovo_id,
                    reason: "no original hours recorded",
                },
            }
        }
        EmployeeEffect::Remove => {
            employee_repo::delete(&mut *conn, employee_id).await?;
            EmployeeOutcome::Removed(before)
        }
    };
    Ok(outcome)
}

pub async fn process_notification(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(id): Path<i64>,
    Json(payload): Json<ProcessNotificationRequest>,
) -> Result<Json<ProcessNotificationResponse>, AppError> {
    ensure_super_admin(&user)?;

    let action: WorkflowAction = payload.action.parse()?;
    let processing_date: NaiveDate = payload
        .processing_date
        .unwrap_or_else(|| today_local(&state.config.time_zone));

    let mut tx = begin_transaction(&state.pool).await?;
    let notification = notification_repo::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))?;
    let transition = leave_workflow::transition(notification.status, action)?;

    let mut leave_status = None;
    let mut employee_outcome = None;
    let leave_id = match notification.notification_type {
        NotificationType::CompanyLeaveRequest => notification.company_leave_id(),
        _ => None,
    };
    if let Some(leave_id) = leave_id {
        let leave = company_leave_repo::find_by_id(&mut *tx, leave_id)
            .await?
            .ok_or_else(|| AppError::not_found("Company leave not found"))?;
        company_leave_repo::update_status(&mut *tx, leave_id, transition.leave, &user.email).await?;
        leave_status = Some(transition.leave);

        let fallback_hours = notification
            .metadata_original_hours()
            .or_else(|| leave.snapshot_hours());
        employee_outcome = Some(
            apply_employee_effect(
                &mut *tx,
                transition.employee,
                &leave.employee_id,
                fallback_hours,
            )
            .await?,
        );
    }

    let updated = notification_repo::update_status(
        &mut *tx,
        id,
        transition.notification,
        Some(processing_date),
    )
    .await?
    .ok_or_else(|| AppError::not_found("Notification not found"))?;
    commit_transaction(tx).await?;

    tracing::info!(
        notification_id = id,
        action = %action,
        from = notification.status.as_str(),
        to = updated.status.as_str(),
        "Notification processed"
    );

    let audit = AuditService::new(state.pool.clone());
    let main_action = if leave_id.is_some() {
        "process_company_leave_notification"
    } else {
        "process_notification"
    };
    audit
        .log_action(
            &context,
            AuditEvent::new(
                main_action,
                "notification",
                format!(
                    "Notification {} processed with `{}`: {} -> {}",
                    id,
                    action,
                    notification.status.as_str(),
                    updated.status.as_str()
                ),
            )
            .entity(id.to_string(), Some(updated.title.clone()))
            .old_data(&json!({ "status": notification.status }))
            .new_data(&json!({
                "status": updated.status,
                "leave_status": leave_status,
                "processing_date": processing_date,
            })),
        )
        .await;

    let employee = match employee_outcome {
        Some(EmployeeOutcome::Updated { before, after }) => {
            audit
                .log_action(
                    &context,
                    AuditEvent::new(
                        "update_employee",
                        "employee",
                        format!(
                            "Employee {} moved to {} by notification {}",
                            after.glovo_id, after.status, id
                        ),
                    )
                    .entity(after.glovo_id.clone(), Some(after.full_name()))
                    .old_data(&before)
                    .new_data(&after),
                )
                .await;
            Some(after)
        }
        Some(EmployeeOutcome::Restored {
            before,
            after,
            hours,
        }) => {
            audit
                .log_action(
                    &context,
                    AuditEvent::new(
                        "restore_employee_hours_on_reject",
                        "employee",
                        format!(
                            "Hours of {} restored to {} after rejection",
                            after.glovo_id, hours
                        ),
                    )
                    .entity(after.glovo_id.clone(), Some(after.full_name()))
                    .old_data(&before)
                    .new_data(&after),
                )
                .await;
            Some(after)
        }
        Some(EmployeeOutcome::RestoreFailed {
            employee_id,
            reason,
        }) => {
            tracing::warn!(
                notification_id = id,
                employee_id = %employee_id,
                reason,
                "Hours could not be restored"
            );
            audit
                .log_action(
                    &context,
                    AuditEvent::new(
                        "restore_employee_hours_on_reject_failed",
                        "employee",
                        format!(
                            "Hours of {} could not be restored after rejection: {}",
                            employee_id, reason
                        ),
                    )
                    .entity(employee_id.clone(), None)
                    .new_data(&json!({ "notification_id": id, "reason": reason })),
                )
                .await;
            employee_repo::find_by_id(&state.pool, &employee_id).await?
        }
        Some(EmployeeOutcome::Removed(removed)) => {
            audit
                .log_action(
                    &context,
                    AuditEvent::new(
                        "delete_employee_pending_laboral_processed",
                        "employee",
                        format!(
                            "Employee {} ({}) removed after company leave was processed",
                            removed.full_name(),
                            removed.glovo_id
                        ),
                    )
                    .entity(removed.glovo_id.clone(), Some(removed.full_name()))
                    .old_data(&removed),
                )
                .await;
            None
        }
        Some(EmployeeOutcome::Missing(employee_id)) => {
            tracing::warn!(
                notification_id = id,
                employee_id = %employee_id,
                "Employee referenced by leave no longer exists"
            );
            None
        }
        None => None,
    };

    Ok(Json(ProcessNotificationResponse {
        notification: updated,
        action: action.as_str().to_string(),
        leave_status,
        employee,
    }))
}

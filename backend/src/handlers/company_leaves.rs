use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{ensure_can_manage, ensure_super_admin, non_empty_filter},
    middleware::AuditContext,
    models::{
        company_leave::{
            parse_leave_reason, ChangeLeaveReasonRequest, CompanyLeave, CompanyLeaveQuery,
            CompanyLeaveStatus, CompanyLeaveType, CreateCompanyLeaveRequest,
            CreateCompanyLeaveResponse,
        },
        employee::{CreateEmployee, Employee, EmployeeStatus},
        notification::{NewNotification, NotificationStatus, NotificationType},
        paginate,
        system_user::SystemUser,
        PaginatedResponse,
    },
    repositories::{
        begin_transaction, commit_transaction,
        company_leave::{
            self as company_leave_repo, CompanyLeaveFilters, NewCompanyLeave, NewLeaveHistory,
        },
        employee as employee_repo,
        notification as notification_repo,
    },
    services::{
        audit::{AuditEvent, AuditService},
        employee_state,
    },
    state::AppState,
    utils::time::format_display_date,
};

fn clean_comments(raw: Option<String>) -> Option<String> {
    raw.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

/// Notification metadata for a new leave request.
fn request_metadata(
    employee: &Employee,
    leave: &CompanyLeave,
    label: &str,
    comments: Option<&str>,
) -> Value {
    let mut metadata = employee.metadata();
    if let Value::Object(map) = &mut metadata {
        map.insert("employee_id".into(), json!(employee.glovo_id));
        map.insert("company_leave_id".into(), json!(leave.id));
        map.insert("leave_type".into(), json!(leave.leave_type.as_str()));
        map.insert("leave_type_label".into(), json!(label));
        map.insert("leave_date".into(), json!(format_display_date(leave.leave_date)));
        map.insert("comments".into(), json!(comments));
        map.insert("original_hours".into(), json!(employee.original_hours));
    }
    metadata
}

pub async fn create_company_leave(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(payload): Json<CreateCompanyLeaveRequest>,
) -> Result<(StatusCode, Json<CreateCompanyLeaveResponse>), AppError> {
    ensure_can_manage(&user)?;
    payload.validate()?;

    let comments = clean_comments(payload.comments);
    let leave_type =
        parse_leave_reason(&payload.leave_type, comments.as_deref()).map_err(AppError::BadRequest)?;
    let label = leave_type.label(comments.as_deref());

    let mut tx = begin_transaction(&state.pool).await?;
    let mut employee = employee_repo::find_by_id_for_update(&mut *tx, payload.employee_id.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    if employee.status.in_company_leave_flow() {
        return Err(AppError::conflict(format!(
            "Employee already has a company leave in progress (status: {})",
            employee.status
        )));
    }
    let before = employee.clone();

    let leave = company_leave_repo::insert(
        &mut *tx,
        &NewCompanyLeave {
            employee_id: employee.glovo_id.clone(),
            employee_data: before.snapshot(),
            leave_type,
            leave_date: payload.leave_date,
            comments: comments.clone(),
            requested_by: user.email.clone(),
        },
    )
    .await?;

    employee_state::park_hours(&mut employee, EmployeeStatus::CompanyLeavePending);
    let saved = employee_repo::save(&mut *tx, &employee).await?;

    let notification = notification_repo::insert(
        &mut *tx,
        &NewNotification {
            notification_type: NotificationType::CompanyLeaveRequest,
            title: label.clone(),
            message: format!(
                "{} requested for {} ({}) on {}",
                label,
                saved.full_name(),
                saved.glovo_id,
                format_display_date(leave.leave_date)
            ),
            requested_by: user.email.clone(),
            status: NotificationStatus::Pending,
            metadata: Some(request_metadata(&saved, &leave, &label, comments.as_deref())),
        },
    )
    .await?;
    commit_transaction(tx).await?;

    let audit = AuditService::new(state.pool.clone());
    audit
        .log_action(
            &context,
            AuditEvent::new(
                "create_company_leave",
                "company_leave",
                format!("{} for {} ({})", label, saved.full_name(), saved.glovo_id),
            )
            .entity(leave.id.to_string(), Some(saved.full_name()))
            .old_data(&before)
            .new_data(&leave),
        )
        .await;
    audit
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

    Ok((
        StatusCode::CREATED,
        Json(CreateCompanyLeaveResponse {
            leave,
            notification,
        }),
    ))
}

fn list_filters(query: &CompanyLeaveQuery) -> Result<CompanyLeaveFilters, AppError> {
    let status = non_empty_filter(query.status.clone())
        .map(|s| s.parse::<CompanyLeaveStatus>().map_err(AppError::BadRequest))
        .transpose()?;
    let leave_type = non_empty_filter(query.leave_type.clone())
        .map(|t| t.parse::<CompanyLeaveType>().map_err(AppError::BadRequest))
        .transpose()?;
    Ok(CompanyLeaveFilters {
        status,
        leave_type,
        search: query.search.clone(),
    })
}

pub async fn list_company_leaves(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Query(query): Query<CompanyLeaveQuery>,
) -> Result<Json<PaginatedResponse<CompanyLeave>>, AppError> {
    ensure_can_manage(&user)?;

    let filters = list_filters(&query)?;
    let (page, per_page) = paginate(query.page, query.per_page);
    let offset = (page - 1) * per_page;
    let (items, total) = company_leave_repo::list(&state.pool, &filters, per_page, offset).await?;

    Ok(Json(PaginatedResponse::new(items, total, page, per_page)))
}

pub async fn change_leave_reason(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(leave_id): Path<i64>,
    Json(payload): Json<ChangeLeaveReasonRequest>,
) -> Result<Json<CompanyLeave>, AppError> {
    ensure_super_admin(&user)?;

    let comments = clean_comments(payload.comments);
    let new_type =
        parse_leave_reason(&payload.new_reason, comments.as_deref()).map_err(AppError::BadRequest)?;

    let mut tx = begin_transaction(&state.pool).await?;
    let leave = company_leave_repo::find_by_id(&mut *tx, leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Company leave not found"))?;

    let updated =
        company_leave_repo::change_reason(&mut *tx, leave_id, new_type, comments.as_deref()).await?;
    company_leave_repo::insert_history(
        &mut *tx,
        &NewLeaveHistory {
            employee_id: leave.employee_id.clone(),
            leave_type: "company_leave".to_string(),
            previous_reason: leave.leave_type.as_str().to_string(),
            new_reason: new_type.as_str().to_string(),
            comments: comments.clone(),
            changed_by: user.email.clone(),
            changed_by_role: user.role.as_str().to_string(),
        },
    )
    .await?;
    commit_transaction(tx).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "change_company_leave_reason",
                "company_leave",
                format!(
                    "Leave reason of {} changed from {} to {}",
                    leave.employee_id,
                    leave.leave_type.as_str(),
                    new_type.as_str()
                ),
            )
            .entity(leave.id.to_string(), Some(leave.employee_id.clone()))
            .old_data(&leave)
            .new_data(&updated),
        )
        .await;

    Ok(Json(updated))
}

/// Rebuilds an active employee row from an approved leave snapshot.
fn employee_from_snapshot(leave: &CompanyLeave) -> Result<Employee, AppError> {
    let payload: CreateEmployee = serde_json::from_value(leave.employee_data.0.clone())
        .map_err(|err| {
            AppError::InternalServerError(anyhow::anyhow!(
                "Company leave {} has an unreadable employee snapshot: {}",
                leave.id,
                err
            ))
        })?;
    let mut employee = employee_state::build_employee(
        leave.employee_id.clone(),
        CreateEmployee {
            status: None,
            ..payload
        },
        EmployeeStatus::Active,
        Utc::now(),
    );
    employee_state::set_hours(&mut employee, leave.snapshot_hours());
    Ok(employee)
}

pub async fn reactivate_employee(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    ensure_super_admin(&user)?;

    let mut tx = begin_transaction(&state.pool).await?;
    if employee_repo::exists(&mut *tx, &glovo_id).await? {
        return Err(AppError::conflict("Employee is still present; nothing to reactivate"));
    }
    let leave = company_leave_repo::latest_approved_for_employee(&mut *tx, &glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("No approved company leave found for this employee"))?;

    let employee = employee_from_snapshot(&leave)?;
    let created = employee_repo::insert(&mut *tx, &employee).await?;
    company_leave_repo::mark_reactivated(&mut *tx, leave.id, &user.email).await?;
    commit_transaction(tx).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "reactivate_employee_from_company_leave",
                "employee",
                format!(
                    "Employee {} ({}) reactivated from company leave {}",
                    created.full_name(),
                    created.glovo_id,
                    leave.id
                ),
            )
            .entity(created.glovo_id.clone(), Some(created.full_name()))
            .old_data(&leave)
            .new_data(&created),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_reactivated(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
) -> Result<Json<Vec<CompanyLeave>>, AppError> {
    ensure_can_manage(&user)?;
    let leaves = company_leave_repo::list_reactivated(&state.pool).await?;
    Ok(Json(leaves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::employee_state::test_support::sample_employee;
    use chrono::NaiveDate;
    use sqlx::types::Json as SqlJson;

    fn leave_for(employee: &Employee, leave_type: CompanyLeaveType) -> CompanyLeave {
        let now = Utc::now();
        CompanyLeave {
            id: 5,
            employee_id: employee.glovo_id.clone(),
            employee_data: SqlJson(employee.snapshot()),
            leave_type,
            leave_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            comments: None,
            leave_requested_by: "admin@fleet.test".into(),
            leave_requested_at: now,
            approved_by: None,
            approved_at: None,
            status: CompanyLeaveStatus::Approved,
            reactivated_at: None,
            reactivated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn request_metadata_carries_leave_reference_and_hours() {
        let mut employee = sample_employee("G-9", Some(30));
        employee_state::park_hours(&mut employee, EmployeeStatus::CompanyLeavePending);
        let leave = leave_for(&employee, CompanyLeaveType::Dismissal);
        let label = leave.leave_type.label(None);

        let metadata = request_metadata(&employee, &leave, &label, None);
        assert_eq!(metadata["company_leave_id"], 5);
        assert_eq!(metadata["employee_id"], "G-9");
        assert_eq!(metadata["leave_type_label"], "Company leave - Dismissal");
        assert_eq!(metadata["leave_date"], "15/7/2025");
        assert_eq!(metadata["original_hours"], 30);
        assert_eq!(metadata["hours"], 0);
    }

    #[test]
    fn snapshot_rebuild_restores_hours_and_activates() {
        let mut employee = sample_employee("G-9", Some(30));
        employee_state::park_hours(&mut employee, EmployeeStatus::CompanyLeaveApproved);
        let leave = leave_for(&employee, CompanyLeaveType::Voluntary);

        let rebuilt = employee_from_snapshot(&leave).unwrap();
        assert_eq!(rebuilt.glovo_id, "G-9");
        assert_eq!(rebuilt.status, EmployeeStatus::Active);
        assert_eq!(rebuilt.hours, Some(30));
        assert_eq!(rebuilt.cdp, 79);
        assert_eq!(rebuilt.original_hours, None);
        assert_eq!(rebuilt.city.as_deref(), Some("Madrid"));
    }

    #[test]
    fn list_filters_reject_unknown_values() {
        let query = CompanyLeaveQuery {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(matches!(list_filters(&query), Err(AppError::BadRequest(_))));

        let query = CompanyLeaveQuery {
            status: Some("all".into()),
            leave_type: Some("despido".into()),
            ..Default::default()
        };
        let filters = list_filters(&query).unwrap();
        assert_eq!(filters.status, None);
        assert_eq!(filters.leave_type, Some(CompanyLeaveType::Dismissal));
    }
}

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{ensure_can_manage, ensure_super_admin, non_empty_filter, rule_error},
    middleware::AuditContext,
    models::{
        employee::{CreateEmployee, Employee, EmployeeStatus, UpdateEmployee},
        system_user::SystemUser,
    },
    repositories::{
        begin_transaction, commit_transaction, company_leave as company_leave_repo,
        employee::{self as employee_repo, EmployeeFilters},
        it_leave as it_leave_repo,
    },
    services::{
        audit::{AuditEvent, AuditService},
        employee_state::{self, UpdateKind},
    },
    state::AppState,
    utils::{csv::write_csv, time::today_local},
    validation::rules::validate_glovo_id,
};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    /// City code; `N/A` matches employees without one, `all` disables the filter.
    pub city: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageAccessRequest {
    pub page: String,
    pub action: Option<String>,
}

fn parse_status_filter(raw: Option<String>) -> Result<Option<EmployeeStatus>, AppError> {
    non_empty_filter(raw)
        .map(|status| status.parse::<EmployeeStatus>().map_err(AppError::BadRequest))
        .transpose()
}

fn scoped_filters(
    user: &SystemUser,
    query: EmployeeListQuery,
) -> Result<EmployeeFilters, AppError> {
    Ok(EmployeeFilters {
        city_scope: user.city_scope().map(str::to_string),
        city_code: non_empty_filter(query.city),
        status: parse_status_filter(query.status)?,
        search: query.search,
    })
}

/// Accounts scoped to a city cannot see employees of other cities.
fn visible_to(user: &SystemUser, employee: &Employee) -> bool {
    match user.city_scope() {
        None => true,
        Some(scope) => employee
            .city
            .as_deref()
            .is_some_and(|city| city.trim().eq_ignore_ascii_case(scope)),
    }
}

pub async fn list_employees(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let filters = scoped_filters(&user, query)?;
    let employees = employee_repo::list(&state.pool, &filters).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "view_employees",
                "employee",
                format!("Listed {} employees", employees.len()),
            )
            .new_data(&json!({
                "count": employees.len(),
                "city": filters.city_code,
                "status": filters.status,
                "search": filters.search,
            })),
        )
        .await;

    Ok(Json(employees))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Path(glovo_id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let employee = employee_repo::find_by_id(&state.pool, &glovo_id)
        .await?
        .filter(|employee| visible_to(&user, employee))
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    Ok(Json(employee))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(mut payload): Json<CreateEmployee>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    ensure_can_manage(&user)?;
    payload.validate()?;

    let requested_id = payload
        .glovo_id
        .take()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let (glovo_id, status) = match requested_id {
        Some(id) => {
            validate_glovo_id(&id).map_err(|err| rule_error("glovo_id", err))?;
            let status = payload.status.unwrap_or(EmployeeStatus::Active);
            (id, status)
        }
        None if user.is_super_admin() => (
            employee_state::generate_temporary_id(),
            EmployeeStatus::PendingActivation,
        ),
        None => return Err(AppError::bad_request("glovo_id is required")),
    };

    if employee_repo::exists(&state.pool, &glovo_id).await? {
        return Err(AppError::conflict(format!(
            "An employee with glovo_id {} already exists",
            glovo_id
        )));
    }

    let employee = employee_state::build_employee(glovo_id, payload, status, Utc::now());
    let created = employee_repo::insert(&state.pool, &employee).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "create_employee",
                "employee",
                format!("Employee created: {} ({})", created.full_name(), created.glovo_id),
            )
            .entity(created.glovo_id.clone(), Some(created.full_name()))
            .new_data(&created),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
    Json(payload): Json<UpdateEmployee>,
) -> Result<Json<Employee>, AppError> {
    ensure_can_manage(&user)?;
    payload.validate()?;

    let mut tx = begin_transaction(&state.pool).await?;
    let mut employee = employee_repo::find_by_id_for_update(&mut *tx, &glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let before = employee.clone();

    let kind = employee_state::apply_update(&mut employee, payload)?;
    match &kind {
        UpdateKind::ActivatedPending { previous_id } if *previous_id != employee.glovo_id => {
            validate_glovo_id(&employee.glovo_id).map_err(|err| rule_error("glovo_id", err))?;
            if employee_repo::exists(&mut *tx, &employee.glovo_id).await? {
                return Err(AppError::conflict(format!(
                    "An employee with glovo_id {} already exists",
                    employee.glovo_id
                )));
            }
            employee_repo::rename(&mut *tx, previous_id, &employee.glovo_id).await?;
            it_leave_repo::reassign_employee(&mut *tx, previous_id, &employee.glovo_id).await?;
            company_leave_repo::reassign_employee(&mut *tx, previous_id, &employee.glovo_id)
                .await?;
        }
        UpdateKind::ReactivatedFromItLeave => {
            it_leave_repo::end_active_for_employee(&mut *tx, &employee.glovo_id, &user.email)
                .await?;
        }
        _ => {}
    }

    let updated = employee_repo::save(&mut *tx, &employee).await?;
    commit_transaction(tx).await?;

    let description = match &kind {
        UpdateKind::Regular => format!(
            "Employee updated: {} ({})",
            updated.full_name(),
            updated.glovo_id
        ),
        UpdateKind::ReactivatedFromItLeave => format!(
            "Employee back from IT leave: {} ({}), hours restored to {}",
            updated.full_name(),
            updated.glovo_id,
            updated.hours.unwrap_or(0)
        ),
        UpdateKind::ActivatedPending { previous_id } => format!(
            "Pending employee activated: {} ({} -> {})",
            updated.full_name(),
            previous_id,
            updated.glovo_id
        ),
    };
    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(kind.audit_action(), "employee", description)
                .entity(updated.glovo_id.clone(), Some(updated.full_name()))
                .old_data(&before)
                .new_data(&updated),
        )
        .await;

    Ok(Json(updated))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure_super_admin(&user)?;

    let employee = employee_repo::find_by_id(&state.pool, &glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    employee_repo::delete(&state.pool, &glovo_id).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "delete_employee",
                "employee",
                format!("Employee deleted: {} ({})", employee.full_name(), employee.glovo_id),
            )
            .entity(employee.glovo_id.clone(), Some(employee.full_name()))
            .old_data(&employee),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all_employees(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<StatusCode, AppError> {
    ensure_super_admin(&user)?;

    let deleted = employee_repo::delete_all(&state.pool).await?;
    tracing::warn!(deleted, actor = %user.email, "All employees deleted");

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "delete_all_employees",
                "employee",
                format!("All employees deleted ({} rows)", deleted),
            )
            .entity("all", Some("All employees".to_string()))
            .old_data(&json!({ "count": deleted })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

const CSV_HEADERS: [&str; 27] = [
    "glovo_id",
    "glovo_email",
    "first_name",
    "last_name",
    "phone",
    "email",
    "hours",
    "cdp",
    "city",
    "city_code",
    "fleet",
    "national_id",
    "iban",
    "address",
    "vehicle",
    "naf",
    "social_security_start_date",
    "status",
    "original_hours",
    "suspension_kind",
    "penalization_start_date",
    "penalization_end_date",
    "vacation_days_taken",
    "vacation_days_pending",
    "last_order",
    "missed_check_ins",
    "created_at",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(e: &Employee) -> Vec<String> {
    vec![
        e.glovo_id.clone(),
        opt(e.glovo_email.as_deref()),
        e.first_name.clone(),
        opt(e.last_name.as_deref()),
        opt(e.phone.as_deref()),
        opt(e.email.as_deref()),
        opt(e.hours),
        e.cdp.to_string(),
        opt(e.city.as_deref()),
        opt(e.city_code.as_deref()),
        opt(e.fleet.as_deref()),
        opt(e.national_id.as_deref()),
        opt(e.iban.as_deref()),
        opt(e.address.as_deref()),
        opt(e.vehicle.map(|v| v.as_str())),
        opt(e.naf.as_deref()),
        opt(e.social_security_start_date),
        e.status.as_str().to_string(),
        opt(e.original_hours),
        opt(e.suspension_kind.map(|k| k.as_str())),
        opt(e.penalization_start_date),
        opt(e.penalization_end_date),
        e.vacation_days_taken.to_string(),
        e.vacation_days_pending.to_string(),
        opt(e.last_order),
        e.missed_check_ins.to_string(),
        e.created_at.to_rfc3339(),
    ]
}

pub async fn export_employees_csv(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Response, AppError> {
    ensure_can_manage(&user)?;

    let filters = scoped_filters(&user, query)?;
    let employees = employee_repo::list(&state.pool, &filters).await?;
    if employees.is_empty() {
        return Err(AppError::not_found("No employees to export"));
    }

    let rows: Vec<Vec<String>> = employees.iter().map(csv_row).collect();
    let body = write_csv(&CSV_HEADERS, &rows)?;
    let filename = format!(
        "employees_{}.csv",
        today_local(&state.config.time_zone).format("%Y-%m-%d")
    );

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "export_employees_csv",
                "employee",
                format!("Exported {} employees to {}", rows.len(), filename),
            )
            .new_data(&json!({ "count": rows.len(), "filename": filename })),
        )
        .await;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn sync_last_order(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user)?;

    let updated = employee_repo::sync_last_order(&state.pool).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "sync_last_order",
                "employee",
                format!("last_order synchronised for {} employees", updated),
            )
            .new_data(&json!({ "updated": updated })),
        )
        .await;

    Ok(Json(json!({ "updated": updated })))
}

pub async fn log_page_access(
    State(state): State<AppState>,
    context: AuditContext,
    Json(payload): Json<PageAccessRequest>,
) -> Result<Json<Value>, AppError> {
    let page = payload.page.trim();
    if page.is_empty() {
        return Err(AppError::bad_request("page is required"));
    }
    let action = payload
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("view");

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new("page_access", "page", format!("Page {} ({})", page, action))
                .entity(page, None)
                .new_data(&json!({ "page": page, "action": action })),
        )
        .await;

    Ok(Json(json!({ "message": "Page access logged" })))
}

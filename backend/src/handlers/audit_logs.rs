use axum::{
    extract::{Extension, Query, State},
    Json,
};

use crate::{
    error::AppError,
    handlers::common::{ensure_super_admin, non_empty_filter, parse_optional_date},
    models::{
        audit_log::{AuditLog, AuditLogFilters, AuditLogListQuery, AuditLogStats},
        system_user::SystemUser,
    },
    repositories::audit_log as audit_log_repo,
    state::AppState,
    utils::time::today_local,
};

const MAX_AUDIT_LOG_LIMIT: i64 = 10_000;

fn resolve_limit(requested: Option<i64>, default: i64) -> Result<i64, AppError> {
    let limit = requested.unwrap_or(default);
    if !(1..=MAX_AUDIT_LOG_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_AUDIT_LOG_LIMIT
        )));
    }
    Ok(limit)
}

fn build_filters(query: AuditLogListQuery) -> Result<AuditLogFilters, AppError> {
    let start_date = parse_optional_date(query.start_date.as_deref(), "start_date")?;
    let end_date = parse_optional_date(query.end_date.as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::bad_request("start_date must be on or before end_date"));
        }
    }
    Ok(AuditLogFilters {
        action: non_empty_filter(query.action),
        entity_type: non_empty_filter(query.entity_type),
        user_id: non_empty_filter(query.user_id),
        search: non_empty_filter(query.search),
        start_date,
        end_date,
    })
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Query(query): Query<AuditLogListQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    ensure_super_admin(&user)?;
    let limit = resolve_limit(query.limit, state.config.audit_log_default_limit)?;
    let filters = build_filters(query)?;
    let logs = audit_log_repo::list_audit_logs(&state.pool, &filters, limit).await?;
    Ok(Json(logs))
}

pub async fn audit_log_stats(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
) -> Result<Json<AuditLogStats>, AppError> {
    ensure_super_admin(&user)?;
    let today = today_local(&state.config.time_zone);
    let stats = audit_log_repo::stats(&state.pool, today).await?;
    Ok(Json(stats))
}

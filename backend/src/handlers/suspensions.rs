use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    handlers::common::{ensure_can_manage, parse_optional_date, rule_error},
    middleware::AuditContext,
    models::{
        employee::{Employee, SuspensionKind},
        system_user::SystemUser,
    },
    repositories::{begin_transaction, commit_transaction, employee as employee_repo},
    services::{
        audit::{AuditEvent, AuditService},
        suspension::{self, SuspensionOutcome, SuspensionRequest},
        sweep::{self, ExpiredSweepReport, ScheduledSweepReport},
    },
    state::AppState,
    utils::time::today_local,
    validation::rules::validate_lookahead_days,
};

const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

/// Body of the penalize/vacation endpoints. Every field is required.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SuspensionPayload {
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub end_date: Option<String>,
    pub observations: Option<String>,
}

impl SuspensionPayload {
    fn into_request(self) -> Result<SuspensionRequest, AppError> {
        let (Some(start), Some(end), Some(observations)) = (
            parse_optional_date(self.start_date.as_deref(), "start_date")?,
            parse_optional_date(self.end_date.as_deref(), "end_date")?,
            self.observations.filter(|o| !o.trim().is_empty()),
        ) else {
            return Err(AppError::bad_request(
                "start_date, end_date and observations are required",
            ));
        };
        Ok(SuspensionRequest {
            start_date: start,
            end_date: end,
            observations,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuspensionResponse {
    pub outcome: SuspensionOutcome,
    pub employee: Employee,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LiftResponse {
    pub restored_hours: Option<i32>,
    pub refunded_days: f64,
    pub employee: Employee,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpiringQuery {
    /// Look-ahead window in days (1-365, default 7).
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpiringResponse {
    pub days: i64,
    pub employees: Vec<Employee>,
}

fn kind_label(kind: SuspensionKind) -> &'static str {
    match kind {
        SuspensionKind::Penalization => "Penalization",
        SuspensionKind::Vacation => "Vacation",
    }
}

async fn register_suspension(
    state: &AppState,
    context: &AuditContext,
    glovo_id: &str,
    kind: SuspensionKind,
    payload: SuspensionPayload,
) -> Result<SuspensionResponse, AppError> {
    let request = payload.into_request()?;
    let today = today_local(&state.config.time_zone);

    let mut tx = begin_transaction(&state.pool).await?;
    let mut employee = employee_repo::find_by_id_for_update(&mut *tx, glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let before = employee.clone();

    let outcome = suspension::register(&mut employee, kind, &request, today)?;
    let saved = employee_repo::save(&mut *tx, &employee).await?;
    commit_transaction(tx).await?;

    let action = match kind {
        SuspensionKind::Penalization => "penalize_employee",
        SuspensionKind::Vacation => "set_employee_vacation",
    };
    let timing = match outcome {
        SuspensionOutcome::Started => "started",
        SuspensionOutcome::Scheduled => "scheduled",
    };
    AuditService::new(state.pool.clone())
        .log_action(
            context,
            AuditEvent::new(
                action,
                "employee",
                format!(
                    "{} {} for {} ({}) from {} to {}",
                    kind_label(kind),
                    timing,
                    saved.full_name(),
                    saved.glovo_id,
                    request.start_date,
                    request.end_date
                ),
            )
            .entity(saved.glovo_id.clone(), Some(saved.full_name()))
            .old_data(&before)
            .new_data(&saved),
        )
        .await;

    Ok(SuspensionResponse {
        outcome,
        employee: saved,
    })
}

async fn lift_suspension(
    state: &AppState,
    context: &AuditContext,
    glovo_id: &str,
    kind: SuspensionKind,
) -> Result<LiftResponse, AppError> {
    let today = today_local(&state.config.time_zone);

    let mut tx = begin_transaction(&state.pool).await?;
    let mut employee = employee_repo::find_by_id_for_update(&mut *tx, glovo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let before = employee.clone();

    let outcome = suspension::lift(&mut employee, kind, today)?;
    let saved = employee_repo::save(&mut *tx, &employee).await?;
    commit_transaction(tx).await?;

    let action = match kind {
        SuspensionKind::Penalization => "remove_employee_penalization",
        SuspensionKind::Vacation => "remove_employee_vacation",
    };
    AuditService::new(state.pool.clone())
        .log_action(
            context,
            AuditEvent::new(
                action,
                "employee",
                format!(
                    "{} removed from {} ({})",
                    kind_label(kind),
                    saved.full_name(),
                    saved.glovo_id
                ),
            )
            .entity(saved.glovo_id.clone(), Some(saved.full_name()))
            .old_data(&before)
            .new_data(&saved),
        )
        .await;

    Ok(LiftResponse {
        restored_hours: outcome.restored_hours,
        refunded_days: outcome.refunded_days,
        employee: saved,
    })
}

pub async fn penalize(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
    Json(payload): Json<SuspensionPayload>,
) -> Result<Json<SuspensionResponse>, AppError> {
    ensure_can_manage(&user)?;
    register_suspension(&state, &context, &glovo_id, SuspensionKind::Penalization, payload)
        .await
        .map(Json)
}

pub async fn vacation(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
    Json(payload): Json<SuspensionPayload>,
) -> Result<Json<SuspensionResponse>, AppError> {
    ensure_can_manage(&user)?;
    register_suspension(&state, &context, &glovo_id, SuspensionKind::Vacation, payload)
        .await
        .map(Json)
}

pub async fn remove_penalization(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
) -> Result<Json<LiftResponse>, AppError> {
    ensure_can_manage(&user)?;
    lift_suspension(&state, &context, &glovo_id, SuspensionKind::Penalization)
        .await
        .map(Json)
}

pub async fn remove_vacation(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Path(glovo_id): Path<String>,
) -> Result<Json<LiftResponse>, AppError> {
    ensure_can_manage(&user)?;
    lift_suspension(&state, &context, &glovo_id, SuspensionKind::Vacation)
        .await
        .map(Json)
}

pub async fn check_expired(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<Json<ExpiredSweepReport>, AppError> {
    ensure_can_manage(&user)?;
    let audit = AuditService::new(state.pool.clone());
    let today = today_local(&state.config.time_zone);
    let report = sweep::check_expired_suspensions(&state.pool, &audit, &context, today).await?;
    Ok(Json(report))
}

pub async fn check_scheduled(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<Json<ScheduledSweepReport>, AppError> {
    ensure_can_manage(&user)?;
    let audit = AuditService::new(state.pool.clone());
    let today = today_local(&state.config.time_zone);
    let report = sweep::activate_scheduled_suspensions(&state.pool, &audit, &context, today).await?;
    Ok(Json(report))
}

fn lookahead_window(today: NaiveDate, days: Option<i64>) -> Result<(i64, NaiveDate), AppError> {
    let days = days.unwrap_or(DEFAULT_LOOKAHEAD_DAYS);
    validate_lookahead_days(days).map_err(|err| rule_error("days", err))?;
    Ok((days, today + Duration::days(days)))
}

async fn expiring(
    state: &AppState,
    kind: SuspensionKind,
    query: ExpiringQuery,
) -> Result<ExpiringResponse, AppError> {
    let today = today_local(&state.config.time_zone);
    let (days, until) = lookahead_window(today, query.days)?;
    let employees =
        employee_repo::find_expiring_suspensions(&state.pool, kind, today, until).await?;
    Ok(ExpiringResponse { days, employees })
}

pub async fn penalizations_expiring_soon(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<ExpiringResponse>, AppError> {
    ensure_can_manage(&user)?;
    expiring(&state, SuspensionKind::Penalization, query).await.map(Json)
}

pub async fn vacations_expiring_soon(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<ExpiringResponse>, AppError> {
    ensure_can_manage(&user)?;
    expiring(&state, SuspensionKind::Vacation, query).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_every_field() {
        let err = SuspensionPayload {
            start_date: Some("2025-07-01".into()),
            end_date: None,
            observations: Some("late".into()),
        }
        .into_request()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let blank_note = SuspensionPayload {
            start_date: Some("2025-07-01".into()),
            end_date: Some("2025-07-03".into()),
            observations: Some("  ".into()),
        };
        assert!(blank_note.into_request().is_err());

        let request = SuspensionPayload {
            start_date: Some("2025-07-01".into()),
            end_date: Some("2025-07-03".into()),
            observations: Some("late".into()),
        }
        .into_request()
        .unwrap();
        assert_eq!(request.end_date, NaiveDate::from_ymd_opt(2025, 7, 3).unwrap());
    }

    #[test]
    fn lookahead_defaults_to_a_week() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let (days, until) = lookahead_window(today, None).unwrap();
        assert_eq!(days, 7);
        assert_eq!(until, NaiveDate::from_ymd_opt(2025, 7, 8).unwrap());
    }

    #[test]
    fn lookahead_rejects_out_of_range_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(matches!(
            lookahead_window(today, Some(0)),
            Err(AppError::Validation(_))
        ));
        assert!(lookahead_window(today, Some(366)).is_err());
        assert!(lookahead_window(today, Some(365)).is_ok());
    }
}

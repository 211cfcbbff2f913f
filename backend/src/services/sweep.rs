//! Daily maintenance of suspensions: lifting the ones that ended and starting
//! the ones whose start date arrived.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::middleware::audit_log::AuditContext;
use crate::models::employee::SuspensionKind;
use crate::repositories::{begin_transaction, commit_transaction, employee as employee_repo};
use crate::services::audit::{AuditEvent, AuditService};
use crate::services::suspension::{self, ActivationOutcome};
use crate::state::AppState;
use crate::utils::time::{next_daily_run, now_in_timezone, today_local};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestoredEmployee {
    pub glovo_id: String,
    pub name: String,
    pub kind: SuspensionKind,
    pub restored_hours: Option<i32>,
    pub refunded_days: f64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ExpiredSweepReport {
    pub checked: usize,
    pub restored: usize,
    pub restored_employees: Vec<RestoredEmployee>,
    /// Suspensions still running or scheduled after the sweep.
    pub pending_penalizations: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivatedEmployee {
    pub glovo_id: String,
    pub name: String,
    pub kind: SuspensionKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ScheduledSweepReport {
    pub checked: usize,
    pub activated: usize,
    pub activated_employees: Vec<ActivatedEmployee>,
    /// Scheduled suspensions cleared because their window already passed.
    pub discarded: usize,
}

/// Restores every suspension whose end date is before `today`.
pub async fn check_expired_suspensions(
    pool: &PgPool,
    audit: &AuditService,
    context: &AuditContext,
    today: NaiveDate,
) -> Result<ExpiredSweepReport, AppError> {
    let mut tx = begin_transaction(pool).await?;
    let candidates = employee_repo::find_expired_suspensions(&mut *tx, today).await?;

    let mut report = ExpiredSweepReport {
        checked: candidates.len(),
        ..Default::default()
    };
    for mut employee in candidates {
        let Some(outcome) = suspension::expire(&mut employee, today) else {
            continue;
        };
        employee_repo::save(&mut *tx, &employee).await?;
        report.restored_employees.push(RestoredEmployee {
            glovo_id: employee.glovo_id.clone(),
            name: employee.full_name(),
            kind: outcome.kind,
            restored_hours: outcome.restored_hours,
            refunded_days: outcome.refunded_days,
        });
    }
    report.restored = report.restored_employees.len();
    report.pending_penalizations = employee_repo::count_open_suspensions(&mut *tx, today).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        checked = report.checked,
        restored = report.restored,
        pending = report.pending_penalizations,
        "Expired suspensions checked"
    );

    audit
        .log_action(
            context,
            AuditEvent::new(
                "check_expired_penalizations",
                "system",
                format!(
                    "Expired suspensions check: {} checked, {} restored",
                    report.checked, report.restored
                ),
            )
            .entity("penalizations", Some("Suspension sweep".to_string()))
            .old_data(&json!({ "checked": report.checked }))
            .new_data(&json!({
                "restored": report.restored,
                "restored_employees": report.restored_employees,
            })),
        )
        .await;

    Ok(report)
}

/// Starts every scheduled suspension whose start date has arrived.
pub async fn activate_scheduled_suspensions(
    pool: &PgPool,
    audit: &AuditService,
    context: &AuditContext,
    today: NaiveDate,
) -> Result<ScheduledSweepReport, AppError> {
    let mut tx = begin_transaction(pool).await?;
    let candidates = employee_repo::find_due_scheduled_suspensions(&mut *tx, today).await?;

    let mut report = ScheduledSweepReport {
        checked: candidates.len(),
        ..Default::default()
    };
    for mut employee in candidates {
        let kind = employee.suspension_kind;
        let start_date = employee.penalization_start_date;
        let end_date = employee.penalization_end_date;
        match suspension::activate_scheduled(&mut employee, today) {
            ActivationOutcome::Activated => {
                employee_repo::save(&mut *tx, &employee).await?;
                if let Some(kind) = kind {
                    report.activated_employees.push(ActivatedEmployee {
                        glovo_id: employee.glovo_id.clone(),
                        name: employee.full_name(),
                        kind,
                        start_date,
                        end_date,
                    });
                }
            }
            ActivationOutcome::Discarded => {
                employee_repo::save(&mut *tx, &employee).await?;
                report.discarded += 1;
            }
            ActivationOutcome::NotDue => {}
        }
    }
    report.activated = report.activated_employees.len();
    commit_transaction(tx).await?;

    tracing::info!(
        checked = report.checked,
        activated = report.activated,
        discarded = report.discarded,
        "Scheduled suspensions checked"
    );

    audit
        .log_action(
            context,
            AuditEvent::new(
                "check_scheduled_penalizations",
                "system",
                format!(
                    "Scheduled suspensions check: {} checked, {} activated",
                    report.checked, report.activated
                ),
            )
            .entity("penalizations", Some("Suspension sweep".to_string()))
            .old_data(&json!({ "checked": report.checked }))
            .new_data(&json!({
                "activated": report.activated,
                "activated_employees": report.activated_employees,
                "discarded": report.discarded,
            })),
        )
        .await;

    Ok(report)
}

/// One full pass, attributed to the `system` actor.
pub async fn run_daily_sweep(
    state: &AppState,
) -> Result<(ExpiredSweepReport, ScheduledSweepReport), AppError> {
    let audit = AuditService::new(state.pool.clone());
    let context = AuditContext::system();
    let today = today_local(&state.config.time_zone);

    let expired = check_expired_suspensions(&state.pool, &audit, &context, today).await?;
    let scheduled = activate_scheduled_suspensions(&state.pool, &audit, &context, today).await?;
    Ok((expired, scheduled))
}

/// Runs the sweep now and then every day at the configured hour.
pub fn spawn_daily_sweep(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = run_daily_sweep(&state).await {
                tracing::error!(error = %err, "Suspension sweep failed");
            }

            let now = now_in_timezone(&state.config.time_zone);
            let next = next_daily_run(now, state.config.sweep_hour);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next_run = %next, "Next suspension sweep scheduled");
            tokio::time::sleep(wait).await;
        }
    })
}

//! Penalization and vacation lifecycle.
//!
//! A suspension parks the employee's hours between two dates. When the start
//! date is in the future only the dates are stored and the daily sweep starts
//! it later.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::employee::{Employee, EmployeeStatus, SuspensionKind};
use crate::services::employee_state::{park_hours, restore_hours};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuspensionError {
    #[error("start_date must be on or before end_date")]
    InvalidRange,
    #[error("Employee already has a {0} registered")]
    AlreadySuspended(&'static str),
    #[error("Employee must be active to start a {kind} (current status: {status})")]
    NotActive {
        kind: &'static str,
        status: EmployeeStatus,
    },
    #[error("Employee has no {0} to remove")]
    NotSuspended(&'static str),
}

impl From<SuspensionError> for AppError {
    fn from(err: SuspensionError) -> Self {
        match err {
            SuspensionError::InvalidRange => AppError::BadRequest(err.to_string()),
            _ => AppError::Conflict(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuspensionRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuspensionOutcome {
    Started,
    Scheduled,
}

/// Inclusive number of days between two dates, 0 when `end < start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> f64 {
    if end < start {
        0.0
    } else {
        ((end - start).num_days() + 1) as f64
    }
}

/// Registers a penalization or vacation on an active employee.
pub fn register(
    employee: &mut Employee,
    kind: SuspensionKind,
    request: &SuspensionRequest,
    today: NaiveDate,
) -> Result<SuspensionOutcome, SuspensionError> {
    if request.start_date > request.end_date {
        return Err(SuspensionError::InvalidRange);
    }
    if let Some(existing) = employee.suspension_kind {
        return Err(SuspensionError::AlreadySuspended(existing.as_str()));
    }
    if employee.status != EmployeeStatus::Active {
        return Err(SuspensionError::NotActive {
            kind: kind.as_str(),
            status: employee.status,
        });
    }

    employee.suspension_kind = Some(kind);
    employee.penalization_start_date = Some(request.start_date);
    employee.penalization_end_date = Some(request.end_date);
    let note = request.observations.trim();
    employee.suspension_note = (!note.is_empty()).then(|| note.to_string());

    if kind == SuspensionKind::Vacation {
        let days = inclusive_days(request.start_date, request.end_date);
        employee.vacation_days_pending = (employee.vacation_days_pending - days).max(0.0);
        employee.vacation_days_taken += days;
    }

    if request.start_date <= today {
        park_hours(employee, kind.running_status());
        Ok(SuspensionOutcome::Started)
    } else {
        Ok(SuspensionOutcome::Scheduled)
    }
}

/// Whether the suspension is currently running (hours parked by it).
pub fn is_running(employee: &Employee) -> bool {
    match employee.suspension_kind {
        Some(kind) => employee.status == kind.running_status(),
        None => false,
    }
}

/// Summary of a lifted suspension.
#[derive(Debug, Clone, PartialEq)]
pub struct LiftOutcome {
    pub kind: SuspensionKind,
    pub was_running: bool,
    pub restored_hours: Option<i32>,
    pub refunded_days: f64,
}

/// Ends the suspension of `kind` and gives the hours back.
///
/// Unused vacation days from `max(today, start)` to the end date are refunded,
/// so an expired vacation refunds nothing.
pub fn lift(
    employee: &mut Employee,
    kind: SuspensionKind,
    today: NaiveDate,
) -> Result<LiftOutcome, SuspensionError> {
    if employee.suspension_kind != Some(kind) {
        return Err(SuspensionError::NotSuspended(kind.as_str()));
    }
    Ok(clear(employee, kind, today))
}

fn clear(employee: &mut Employee, kind: SuspensionKind, today: NaiveDate) -> LiftOutcome {
    let was_running = is_running(employee);

    let mut refunded_days = 0.0;
    if kind == SuspensionKind::Vacation {
        if let (Some(start), Some(end)) =
            (employee.penalization_start_date, employee.penalization_end_date)
        {
            refunded_days = inclusive_days(start.max(today), end);
            employee.vacation_days_pending += refunded_days;
            employee.vacation_days_taken = (employee.vacation_days_taken - refunded_days).max(0.0);
        }
    }

    let restored_hours = if was_running {
        restore_hours(employee, None)
    } else {
        None
    };

    employee.suspension_kind = None;
    employee.penalization_start_date = None;
    employee.penalization_end_date = None;
    employee.suspension_note = None;

    LiftOutcome {
        kind,
        was_running,
        restored_hours,
        refunded_days,
    }
}

/// Lifts whatever suspension ended before `today`. Returns `None` when nothing expired.
pub fn expire(employee: &mut Employee, today: NaiveDate) -> Option<LiftOutcome> {
    let kind = employee.suspension_kind?;
    let end = employee.penalization_end_date?;
    if end >= today {
        return None;
    }
    Some(clear(employee, kind, today))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated,
    /// The window passed before the suspension could start.
    Discarded,
    NotDue,
}

/// Starts a scheduled suspension whose start date has arrived.
pub fn activate_scheduled(employee: &mut Employee, today: NaiveDate) -> ActivationOutcome {
    let (Some(kind), Some(start), Some(end)) = (
        employee.suspension_kind,
        employee.penalization_start_date,
        employee.penalization_end_date,
    ) else {
        return ActivationOutcome::NotDue;
    };
    if employee.status != EmployeeStatus::Active || start > today {
        return ActivationOutcome::NotDue;
    }
    if end < today {
        clear(employee, kind, today);
        return ActivationOutcome::Discarded;
    }
    park_hours(employee, kind.running_status());
    ActivationOutcome::Activated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::employee_state::test_support::sample_employee;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn request(start: u32, end: u32) -> SuspensionRequest {
        SuspensionRequest {
            start_date: date(start),
            end_date: date(end),
            observations: "late deliveries".into(),
        }
    }

    #[test]
    fn penalization_starting_today_parks_hours() {
        let mut employee = sample_employee("G-1", Some(30));
        let outcome = register(
            &mut employee,
            SuspensionKind::Penalization,
            &request(10, 12),
            date(10),
        )
        .unwrap();
        assert_eq!(outcome, SuspensionOutcome::Started);
        assert_eq!(employee.status, EmployeeStatus::Penalized);
        assert_eq!(employee.hours, Some(0));
        assert_eq!(employee.cdp, 0);
        assert_eq!(employee.original_hours, Some(30));
        assert_eq!(employee.suspension_note.as_deref(), Some("late deliveries"));
    }

    #[test]
    fn future_penalization_is_only_scheduled() {
        let mut employee = sample_employee("G-1", Some(30));
        let outcome = register(
            &mut employee,
            SuspensionKind::Penalization,
            &request(15, 20),
            date(10),
        )
        .unwrap();
        assert_eq!(outcome, SuspensionOutcome::Scheduled);
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.hours, Some(30));
        assert_eq!(employee.suspension_kind, Some(SuspensionKind::Penalization));
        assert!(!is_running(&employee));
    }

    #[test]
    fn register_rejects_bad_range_and_double_booking() {
        let mut employee = sample_employee("G-1", Some(30));
        assert_eq!(
            register(&mut employee, SuspensionKind::Vacation, &request(12, 10), date(1)),
            Err(SuspensionError::InvalidRange)
        );
        register(&mut employee, SuspensionKind::Vacation, &request(20, 22), date(1)).unwrap();
        assert_eq!(
            register(&mut employee, SuspensionKind::Penalization, &request(2, 3), date(1)),
            Err(SuspensionError::AlreadySuspended("vacation"))
        );
    }

    #[test]
    fn register_requires_active_status() {
        let mut employee = sample_employee("G-1", Some(30));
        employee.status = EmployeeStatus::ItLeave;
        let err = register(&mut employee, SuspensionKind::Penalization, &request(1, 2), date(1))
            .unwrap_err();
        assert!(matches!(err, SuspensionError::NotActive { .. }));
    }

    #[test]
    fn vacation_moves_days_from_pending_to_taken() {
        let mut employee = sample_employee("G-1", Some(30));
        employee.vacation_days_pending = 3.0;
        register(&mut employee, SuspensionKind::Vacation, &request(1, 5), date(1)).unwrap();
        assert_eq!(employee.vacation_days_taken, 5.0);
        assert_eq!(employee.vacation_days_pending, 0.0);
        assert_eq!(employee.status, EmployeeStatus::Vacation);
    }

    #[test]
    fn removing_running_vacation_refunds_remaining_days() {
        let mut employee = sample_employee("G-1", Some(38));
        employee.vacation_days_pending = 10.0;
        register(&mut employee, SuspensionKind::Vacation, &request(1, 10), date(1)).unwrap();
        assert_eq!(employee.vacation_days_pending, 0.0);

        let outcome = lift(&mut employee, SuspensionKind::Vacation, date(6)).unwrap();
        assert!(outcome.was_running);
        assert_eq!(outcome.refunded_days, 5.0);
        assert_eq!(outcome.restored_hours, Some(38));
        assert_eq!(employee.vacation_days_pending, 5.0);
        assert_eq!(employee.vacation_days_taken, 5.0);
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.cdp, 100);
        assert_eq!(employee.suspension_kind, None);
    }

    #[test]
    fn lift_rejects_other_kind() {
        let mut employee = sample_employee("G-1", Some(20));
        register(&mut employee, SuspensionKind::Penalization, &request(1, 3), date(1)).unwrap();
        assert_eq!(
            lift(&mut employee, SuspensionKind::Vacation, date(2)),
            Err(SuspensionError::NotSuspended("vacation"))
        );
    }

    #[test]
    fn expire_restores_only_after_end_date() {
        let mut employee = sample_employee("G-1", Some(20));
        register(&mut employee, SuspensionKind::Penalization, &request(1, 3), date(1)).unwrap();
        assert_eq!(expire(&mut employee, date(3)), None);

        let outcome = expire(&mut employee, date(4)).expect("expired");
        assert_eq!(outcome.restored_hours, Some(20));
        assert_eq!(outcome.refunded_days, 0.0);
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.penalization_end_date, None);
    }

    #[test]
    fn expired_vacation_refunds_nothing() {
        let mut employee = sample_employee("G-1", Some(20));
        register(&mut employee, SuspensionKind::Vacation, &request(1, 3), date(1)).unwrap();
        let outcome = expire(&mut employee, date(10)).expect("expired");
        assert_eq!(outcome.refunded_days, 0.0);
        assert_eq!(employee.vacation_days_taken, 3.0);
    }

    #[test]
    fn scheduled_suspension_activates_when_due() {
        let mut employee = sample_employee("G-1", Some(20));
        register(&mut employee, SuspensionKind::Penalization, &request(5, 8), date(1)).unwrap();
        assert_eq!(activate_scheduled(&mut employee, date(4)), ActivationOutcome::NotDue);
        assert_eq!(activate_scheduled(&mut employee, date(5)), ActivationOutcome::Activated);
        assert_eq!(employee.status, EmployeeStatus::Penalized);
        assert_eq!(activate_scheduled(&mut employee, date(6)), ActivationOutcome::NotDue);
    }

    #[test]
    fn scheduled_suspension_past_its_window_is_discarded() {
        let mut employee = sample_employee("G-1", Some(20));
        register(&mut employee, SuspensionKind::Penalization, &request(5, 8), date(1)).unwrap();
        assert_eq!(activate_scheduled(&mut employee, date(9)), ActivationOutcome::Discarded);
        assert_eq!(employee.suspension_kind, None);
        assert_eq!(employee.hours, Some(20));
    }
}

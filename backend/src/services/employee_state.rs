//! In-memory transitions of an [`Employee`] row.
//!
//! Handlers load the row (locked inside a transaction), apply one of these
//! functions and write the result back with `repositories::employee::save`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::employee::{
    capitalize_city, compute_cdp, is_temporary_id, CreateEmployee, Employee, EmployeeStatus,
    UpdateEmployee, TEMP_ID_PREFIX,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmployeeStateError {
    #[error("Employee status {0} does not allow an IT leave")]
    ItLeaveNotAllowed(EmployeeStatus),
    #[error("Employee is not on IT leave")]
    NotOnItLeave,
    #[error("A real glovo_id is required to activate a pending employee")]
    ActivationRequiresId,
    #[error("Status {from} cannot be changed to {to} through an update")]
    StatusManagedByWorkflow {
        from: EmployeeStatus,
        to: EmployeeStatus,
    },
}

impl From<EmployeeStateError> for AppError {
    fn from(err: EmployeeStateError) -> Self {
        match err {
            EmployeeStateError::ActivationRequiresId => AppError::BadRequest(err.to_string()),
            _ => AppError::Conflict(err.to_string()),
        }
    }
}

/// `TEMP_` followed by eight hex characters.
pub fn generate_temporary_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}{}", TEMP_ID_PREFIX, &raw[..8])
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_city(value: Option<String>) -> Option<String> {
    clean(value).map(|city| capitalize_city(&city))
}

/// Builds a new row from a create payload.
pub fn build_employee(
    glovo_id: String,
    payload: CreateEmployee,
    status: EmployeeStatus,
    now: DateTime<Utc>,
) -> Employee {
    Employee {
        glovo_id,
        glovo_email: clean(payload.glovo_email),
        shift_1: clean(payload.shift_1),
        shift_2: clean(payload.shift_2),
        first_name: payload.first_name.trim().to_string(),
        last_name: clean(payload.last_name),
        phone: clean(payload.phone),
        email: clean(payload.email),
        hours: payload.hours,
        cdp: compute_cdp(payload.hours),
        complementaries: clean(payload.complementaries),
        city: clean_city(payload.city),
        city_code: clean(payload.city_code),
        fleet: clean(payload.fleet),
        national_id: clean(payload.national_id),
        iban: clean(payload.iban),
        address: clean(payload.address),
        vehicle: payload.vehicle,
        naf: clean(payload.naf),
        social_security_start_date: payload.social_security_start_date,
        leave_status_note: clean(payload.leave_status_note),
        social_security_status: clean(payload.social_security_status),
        schedule_informed: payload.schedule_informed,
        divilo_account: clean(payload.divilo_account),
        next_slot_assignment: payload.next_slot_assignment,
        traffic_manager: clean(payload.traffic_manager),
        traffic_manager_comments: clean(payload.traffic_manager_comments),
        incidents: clean(payload.incidents),
        incident_date: payload.incident_date,
        missed_check_ins: payload.missed_check_ins.unwrap_or(0),
        crossing: clean(payload.crossing),
        platform_glovo: clean(payload.platform_glovo),
        platform_uber_eats: clean(payload.platform_uber_eats),
        status,
        suspension_kind: None,
        penalization_start_date: None,
        penalization_end_date: None,
        suspension_note: None,
        original_hours: None,
        last_order: None,
        vacation_days_taken: payload.vacation_days_taken.unwrap_or(0.0),
        vacation_days_pending: payload.vacation_days_pending.unwrap_or(0.0),
        created_at: now,
        updated_at: now,
    }
}

/// Which special transition an update performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Regular,
    ReactivatedFromItLeave,
    /// The pending employee got its real id; carries the previous temporary id.
    ActivatedPending { previous_id: String },
}

impl UpdateKind {
    pub fn audit_action(&self) -> &'static str {
        match self {
            UpdateKind::Regular => "update_employee",
            UpdateKind::ReactivatedFromItLeave => "reactivate_employee_from_it_leave",
            UpdateKind::ActivatedPending { .. } => "activate_pending_employee",
        }
    }
}

/// Applies a partial update and resolves the status transition it implies.
pub fn apply_update(
    employee: &mut Employee,
    patch: UpdateEmployee,
) -> Result<UpdateKind, EmployeeStateError> {
    let previous_status = employee.status;
    let previous_id = employee.glovo_id.clone();
    let requested_status = patch.status;

    let mut kind = UpdateKind::Regular;
    match (previous_status, requested_status) {
        (EmployeeStatus::ItLeave, Some(EmployeeStatus::Active)) => {
            kind = UpdateKind::ReactivatedFromItLeave;
        }
        (EmployeeStatus::PendingActivation, Some(EmployeeStatus::Active)) => {
            let new_id = clean(patch.glovo_id.clone())
                .filter(|id| !is_temporary_id(id))
                .or_else(|| Some(previous_id.clone()).filter(|id| !is_temporary_id(id)));
            match new_id {
                Some(id) => {
                    employee.glovo_id = id;
                    kind = UpdateKind::ActivatedPending { previous_id };
                }
                None => return Err(EmployeeStateError::ActivationRequiresId),
            }
        }
        (from, Some(to)) if from != to && (from.parks_hours() || to.parks_hours()) => {
            return Err(EmployeeStateError::StatusManagedByWorkflow { from, to });
        }
        _ => {}
    }

    macro_rules! set_text {
        ($($field:ident),* $(,)?) => {
            $(if let Some(value) = patch.$field {
                employee.$field = clean(Some(value));
            })*
        };
    }
    set_text!(
        glovo_email,
        shift_1,
        shift_2,
        last_name,
        phone,
        email,
        complementaries,
        city_code,
        fleet,
        national_id,
        iban,
        address,
        naf,
        leave_status_note,
        social_security_status,
        divilo_account,
        traffic_manager,
        traffic_manager_comments,
        incidents,
        crossing,
        platform_glovo,
        platform_uber_eats,
    );

    if let Some(first_name) = clean(patch.first_name) {
        employee.first_name = first_name;
    }
    if let Some(city) = patch.city {
        employee.city = clean_city(Some(city));
    }
    if patch.vehicle.is_some() {
        employee.vehicle = patch.vehicle;
    }
    if patch.social_security_start_date.is_some() {
        employee.social_security_start_date = patch.social_security_start_date;
    }
    if let Some(informed) = patch.schedule_informed {
        employee.schedule_informed = informed;
    }
    if patch.next_slot_assignment.is_some() {
        employee.next_slot_assignment = patch.next_slot_assignment;
    }
    if patch.incident_date.is_some() {
        employee.incident_date = patch.incident_date;
    }
    if let Some(missed) = patch.missed_check_ins {
        employee.missed_check_ins = missed;
    }
    if let Some(taken) = patch.vacation_days_taken {
        employee.vacation_days_taken = taken;
    }
    if let Some(pending) = patch.vacation_days_pending {
        employee.vacation_days_pending = pending;
    }

    match kind {
        UpdateKind::ReactivatedFromItLeave => {
            restore_hours(employee, patch.hours);
        }
        _ => {
            if let Some(hours) = patch.hours {
                if employee.original_hours.is_some() {
                    // hours are parked; the new value applies on restore
                    employee.original_hours = Some(hours);
                } else {
                    set_hours(employee, Some(hours));
                }
            }
            if let Some(status) = requested_status {
                employee.status = status;
            }
        }
    }

    Ok(kind)
}

pub fn set_hours(employee: &mut Employee, hours: Option<i32>) {
    employee.hours = hours;
    employee.cdp = compute_cdp(hours);
}

/// Parks the working hours and moves the employee to `status`.
///
/// An already parked value is kept so stacked leaves restore the real contract.
pub fn park_hours(employee: &mut Employee, status: EmployeeStatus) {
    if employee.original_hours.is_none() {
        employee.original_hours = Some(employee.hours.unwrap_or(0));
    }
    employee.hours = Some(0);
    employee.cdp = 0;
    employee.status = status;
}

/// Writes the parked hours back and makes the employee active.
///
/// `fallback` is used when nothing was parked. Returns the hours restored,
/// or `None` when no source had a value and the employee was left with 0.
pub fn restore_hours(employee: &mut Employee, fallback: Option<i32>) -> Option<i32> {
    let restored = employee.original_hours.take().or(fallback);
    set_hours(employee, Some(restored.unwrap_or(0)));
    employee.status = EmployeeStatus::Active;
    restored
}

/// Starts a medical leave for the employee.
pub fn start_it_leave(employee: &mut Employee) -> Result<(), EmployeeStateError> {
    match employee.status {
        EmployeeStatus::Active | EmployeeStatus::Penalized | EmployeeStatus::Vacation => {
            park_hours(employee, EmployeeStatus::ItLeave);
            Ok(())
        }
        other => Err(EmployeeStateError::ItLeaveNotAllowed(other)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample_employee(id: &str, hours: Option<i32>) -> Employee {
        let payload = CreateEmployee {
            first_name: "Ana".into(),
            last_name: Some("Lopez".into()),
            hours,
            city: Some("madrid".into()),
            ..Default::default()
        };
        build_employee(id.to_string(), payload, EmployeeStatus::Active, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sample_employee;
    use super::*;

    #[test]
    fn temporary_ids_have_prefix_and_eight_hex_chars() {
        let id = generate_temporary_id();
        assert!(id.starts_with("TEMP_"));
        assert_eq!(id.len(), 13);
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn build_employee_normalizes_fields() {
        let payload = CreateEmployee {
            first_name: "  Ana ".into(),
            phone: Some("   ".into()),
            city: Some("bARCELONA".into()),
            hours: Some(19),
            ..Default::default()
        };
        let employee = build_employee("G-1".into(), payload, EmployeeStatus::Active, Utc::now());
        assert_eq!(employee.first_name, "Ana");
        assert_eq!(employee.phone, None);
        assert_eq!(employee.city.as_deref(), Some("Barcelona"));
        assert_eq!(employee.cdp, 50);
    }

    #[test]
    fn park_and_restore_round_trip_hours() {
        let mut employee = sample_employee("G-1", Some(30));
        park_hours(&mut employee, EmployeeStatus::CompanyLeavePending);
        assert_eq!(employee.hours, Some(0));
        assert_eq!(employee.original_hours, Some(30));
        assert_eq!(employee.cdp, 0);

        park_hours(&mut employee, EmployeeStatus::PendingLaboral);
        assert_eq!(employee.original_hours, Some(30));

        assert_eq!(restore_hours(&mut employee, None), Some(30));
        assert_eq!(employee.hours, Some(30));
        assert_eq!(employee.cdp, 79);
        assert_eq!(employee.original_hours, None);
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn restore_without_source_leaves_zero_hours() {
        let mut employee = sample_employee("G-1", None);
        employee.status = EmployeeStatus::CompanyLeavePending;
        assert_eq!(restore_hours(&mut employee, None), None);
        assert_eq!(employee.hours, Some(0));
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn it_leave_is_rejected_during_company_leave() {
        let mut employee = sample_employee("G-1", Some(20));
        employee.status = EmployeeStatus::CompanyLeavePending;
        assert_eq!(
            start_it_leave(&mut employee),
            Err(EmployeeStateError::ItLeaveNotAllowed(
                EmployeeStatus::CompanyLeavePending
            ))
        );
    }

    #[test]
    fn it_leave_keeps_hours_parked_by_penalization() {
        let mut employee = sample_employee("G-1", Some(20));
        park_hours(&mut employee, EmployeeStatus::Penalized);
        start_it_leave(&mut employee).expect("allowed from penalized");
        assert_eq!(employee.status, EmployeeStatus::ItLeave);
        assert_eq!(employee.original_hours, Some(20));
    }

    #[test]
    fn update_it_leave_to_active_restores_hours() {
        let mut employee = sample_employee("G-1", Some(25));
        start_it_leave(&mut employee).unwrap();
        let kind = apply_update(
            &mut employee,
            UpdateEmployee {
                status: Some(EmployeeStatus::Active),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(kind, UpdateKind::ReactivatedFromItLeave);
        assert_eq!(kind.audit_action(), "reactivate_employee_from_it_leave");
        assert_eq!(employee.hours, Some(25));
        assert_eq!(employee.original_hours, None);
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn activating_pending_employee_requires_real_id() {
        let mut employee = sample_employee("TEMP_abcd1234", Some(10));
        employee.status = EmployeeStatus::PendingActivation;
        let err = apply_update(
            &mut employee,
            UpdateEmployee {
                status: Some(EmployeeStatus::Active),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, EmployeeStateError::ActivationRequiresId);

        let kind = apply_update(
            &mut employee,
            UpdateEmployee {
                status: Some(EmployeeStatus::Active),
                glovo_id: Some("G-900".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            kind,
            UpdateKind::ActivatedPending {
                previous_id: "TEMP_abcd1234".into()
            }
        );
        assert_eq!(employee.glovo_id, "G-900");
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn regular_update_recomputes_cdp_and_city() {
        let mut employee = sample_employee("G-1", Some(10));
        let kind = apply_update(
            &mut employee,
            UpdateEmployee {
                hours: Some(38),
                city: Some("VALENCIA".into()),
                phone: Some("".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(kind, UpdateKind::Regular);
        assert_eq!(employee.cdp, 100);
        assert_eq!(employee.city.as_deref(), Some("Valencia"));
        assert_eq!(employee.phone, None);
    }

    #[test]
    fn hours_edit_while_parked_updates_original_hours() {
        let mut employee = sample_employee("G-1", Some(10));
        park_hours(&mut employee, EmployeeStatus::Penalized);
        apply_update(
            &mut employee,
            UpdateEmployee {
                hours: Some(20),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(employee.hours, Some(0));
        assert_eq!(employee.original_hours, Some(20));
    }

    #[test]
    fn parked_status_cannot_be_overwritten_by_update() {
        for parked in [
            EmployeeStatus::Penalized,
            EmployeeStatus::Vacation,
            EmployeeStatus::CompanyLeavePending,
            EmployeeStatus::CompanyLeaveApproved,
            EmployeeStatus::PendingLaboral,
        ] {
            let mut employee = sample_employee("G-1", Some(30));
            park_hours(&mut employee, parked);
            let before = employee.clone();

            let err = apply_update(
                &mut employee,
                UpdateEmployee {
                    status: Some(EmployeeStatus::Active),
                    hours: Some(12),
                    ..Default::default()
                },
            )
            .unwrap_err();
            assert_eq!(
                err,
                EmployeeStateError::StatusManagedByWorkflow {
                    from: parked,
                    to: EmployeeStatus::Active
                }
            );
            assert!(matches!(AppError::from(err), AppError::Conflict(_)));
            assert_eq!(employee.status, before.status);
            assert_eq!(employee.hours, Some(0));
            assert_eq!(employee.original_hours, Some(30));
        }
    }

    #[test]
    fn active_employee_cannot_be_parked_by_update() {
        let mut employee = sample_employee("G-1", Some(30));
        let err = apply_update(
            &mut employee,
            UpdateEmployee {
                status: Some(EmployeeStatus::Penalized),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, EmployeeStateError::StatusManagedByWorkflow { .. }));
        assert_eq!(employee.hours, Some(30));
        assert_eq!(employee.original_hours, None);
    }

    #[test]
    fn unchanged_parked_status_allows_other_edits() {
        let mut employee = sample_employee("G-1", Some(30));
        park_hours(&mut employee, EmployeeStatus::Vacation);
        let kind = apply_update(
            &mut employee,
            UpdateEmployee {
                status: Some(EmployeeStatus::Vacation),
                phone: Some("600111222".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(kind, UpdateKind::Regular);
        assert_eq!(employee.phone.as_deref(), Some("600111222"));
        assert_eq!(employee.original_hours, Some(30));
    }
}

//! Employee records and the payloads used to create and edit them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use validator::Validate;

/// Weekly hours that correspond to a 100% contract.
pub const FULL_TIME_WEEKLY_HOURS: f64 = 38.0;

/// Prefix used for employees created before the platform assigned an id.
pub const TEMP_ID_PREFIX: &str = "TEMP_";

/// Column list shared by every `SELECT` over `employees`.
pub const EMPLOYEE_COLUMNS: &str = "glovo_id, glovo_email, shift_1, shift_2, first_name, \
     last_name, phone, email, hours, cdp, complementaries, city, city_code, fleet, national_id, \
     iban, address, vehicle, naf, social_security_start_date, leave_status_note, \
     social_security_status, schedule_informed, divilo_account, next_slot_assignment, \
     traffic_manager, traffic_manager_comments, incidents, incident_date, missed_check_ins, \
     crossing, platform_glovo, platform_uber_eats, status, suspension_kind, \
     penalization_start_date, penalization_end_date, suspension_note, original_hours, last_order, \
     vacation_days_taken, vacation_days_pending, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub glovo_id: String,
    pub glovo_email: Option<String>,
    pub shift_1: Option<String>,
    pub shift_2: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub hours: Option<i32>,
    pub cdp: i32,
    pub complementaries: Option<String>,
    pub city: Option<String>,
    pub city_code: Option<String>,
    pub fleet: Option<String>,
    pub national_id: Option<String>,
    pub iban: Option<String>,
    pub address: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub naf: Option<String>,
    pub social_security_start_date: Option<NaiveDate>,
    pub leave_status_note: Option<String>,
    pub social_security_status: Option<String>,
    pub schedule_informed: bool,
    pub divilo_account: Option<String>,
    pub next_slot_assignment: Option<NaiveDate>,
    pub traffic_manager: Option<String>,
    pub traffic_manager_comments: Option<String>,
    pub incidents: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub missed_check_ins: i32,
    pub crossing: Option<String>,
    pub platform_glovo: Option<String>,
    pub platform_uber_eats: Option<String>,
    pub status: EmployeeStatus,
    pub suspension_kind: Option<SuspensionKind>,
    pub penalization_start_date: Option<NaiveDate>,
    pub penalization_end_date: Option<NaiveDate>,
    pub suspension_note: Option<String>,
    pub original_hours: Option<i32>,
    pub last_order: Option<NaiveDate>,
    pub vacation_days_taken: f64,
    pub vacation_days_pending: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    pub fn has_temporary_id(&self) -> bool {
        is_temporary_id(&self.glovo_id)
    }

    /// JSON copy of the row, used for leave snapshots and audit payloads.
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Compact metadata embedded into notifications.
    pub fn metadata(&self) -> Value {
        serde_json::json!({
            "glovo_id": self.glovo_id,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "full_name": self.full_name(),
            "phone": self.phone,
            "email": self.email,
            "city": self.city,
            "city_code": self.city_code,
            "fleet": self.fleet,
            "national_id": self.national_id,
            "hours": self.hours,
            "original_hours": self.original_hours,
            "status": self.status,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    PendingActivation,
    ItLeave,
    CompanyLeavePending,
    CompanyLeaveApproved,
    PendingLaboral,
    Penalized,
    Vacation,
}

impl EmployeeStatus {
    pub const ALL: [EmployeeStatus; 8] = [
        EmployeeStatus::Active,
        EmployeeStatus::PendingActivation,
        EmployeeStatus::ItLeave,
        EmployeeStatus::CompanyLeavePending,
        EmployeeStatus::CompanyLeaveApproved,
        EmployeeStatus::PendingLaboral,
        EmployeeStatus::Penalized,
        EmployeeStatus::Vacation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::PendingActivation => "pending_activation",
            EmployeeStatus::ItLeave => "it_leave",
            EmployeeStatus::CompanyLeavePending => "company_leave_pending",
            EmployeeStatus::CompanyLeaveApproved => "company_leave_approved",
            EmployeeStatus::PendingLaboral => "pending_laboral",
            EmployeeStatus::Penalized => "penalized",
            EmployeeStatus::Vacation => "vacation",
        }
    }

    /// True while an open company-leave flow owns the employee.
    pub fn in_company_leave_flow(&self) -> bool {
        matches!(
            self,
            EmployeeStatus::CompanyLeavePending
                | EmployeeStatus::CompanyLeaveApproved
                | EmployeeStatus::PendingLaboral
        )
    }

    /// Statuses whose hours are parked in `original_hours`.
    pub fn parks_hours(&self) -> bool {
        !matches!(
            self,
            EmployeeStatus::Active | EmployeeStatus::PendingActivation
        )
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        EmployeeStatus::Active
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" | "activo" => Ok(EmployeeStatus::Active),
            "pending_activation" | "pendiente_activacion" => Ok(EmployeeStatus::PendingActivation),
            "it_leave" => Ok(EmployeeStatus::ItLeave),
            "company_leave_pending" => Ok(EmployeeStatus::CompanyLeavePending),
            "company_leave_approved" => Ok(EmployeeStatus::CompanyLeaveApproved),
            "pending_laboral" | "pendiente_laboral" => Ok(EmployeeStatus::PendingLaboral),
            "penalized" | "penalizado" => Ok(EmployeeStatus::Penalized),
            "vacation" | "vacaciones" => Ok(EmployeeStatus::Vacation),
            other => Err(format!("unknown employee status `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Vehicle {
    Bicycle,
    Scooter,
    Motorbike,
    Other,
}

impl Vehicle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Bicycle => "bicycle",
            Vehicle::Scooter => "scooter",
            Vehicle::Motorbike => "motorbike",
            Vehicle::Other => "other",
        }
    }
}

impl FromStr for Vehicle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bicycle" | "bicicleta" | "bike" => Ok(Vehicle::Bicycle),
            "scooter" | "patinete" => Ok(Vehicle::Scooter),
            "motorbike" | "moto" => Ok(Vehicle::Motorbike),
            "other" | "otro" => Ok(Vehicle::Other),
            other => Err(format!("unknown vehicle `{}`", other)),
        }
    }
}

/// Reason an employee's hours are parked between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuspensionKind {
    Penalization,
    Vacation,
}

impl SuspensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuspensionKind::Penalization => "penalization",
            SuspensionKind::Vacation => "vacation",
        }
    }

    /// Status the employee carries while the suspension is running.
    pub fn running_status(&self) -> EmployeeStatus {
        match self {
            SuspensionKind::Penalization => EmployeeStatus::Penalized,
            SuspensionKind::Vacation => EmployeeStatus::Vacation,
        }
    }
}

pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Contracted dedication percentage for the given weekly hours.
pub fn compute_cdp(hours: Option<i32>) -> i32 {
    match hours {
        Some(h) if h > 0 => (f64::from(h) / FULL_TIME_WEEKLY_HOURS * 100.0).round() as i32,
        _ => 0,
    }
}

/// `"mADRID"` becomes `"Madrid"`.
pub fn capitalize_city(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployee {
    pub glovo_id: Option<String>,
    #[validate(email)]
    pub glovo_email: Option<String>,
    pub shift_1: Option<String>,
    pub shift_2: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 0, max = 80))]
    pub hours: Option<i32>,
    pub complementaries: Option<String>,
    pub city: Option<String>,
    pub city_code: Option<String>,
    pub fleet: Option<String>,
    pub national_id: Option<String>,
    pub iban: Option<String>,
    pub address: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub naf: Option<String>,
    pub social_security_start_date: Option<NaiveDate>,
    pub leave_status_note: Option<String>,
    pub social_security_status: Option<String>,
    #[serde(default)]
    pub schedule_informed: bool,
    pub divilo_account: Option<String>,
    pub next_slot_assignment: Option<NaiveDate>,
    pub traffic_manager: Option<String>,
    pub traffic_manager_comments: Option<String>,
    pub incidents: Option<String>,
    pub incident_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub missed_check_ins: Option<i32>,
    pub crossing: Option<String>,
    pub platform_glovo: Option<String>,
    pub platform_uber_eats: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub vacation_days_taken: Option<f64>,
    pub vacation_days_pending: Option<f64>,
}

/// Partial update: `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    pub glovo_id: Option<String>,
    #[validate(email)]
    pub glovo_email: Option<String>,
    pub shift_1: Option<String>,
    pub shift_2: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 0, max = 80))]
    pub hours: Option<i32>,
    pub complementaries: Option<String>,
    pub city: Option<String>,
    pub city_code: Option<String>,
    pub fleet: Option<String>,
    pub national_id: Option<String>,
    pub iban: Option<String>,
    pub address: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub naf: Option<String>,
    pub social_security_start_date: Option<NaiveDate>,
    pub leave_status_note: Option<String>,
    pub social_security_status: Option<String>,
    pub schedule_informed: Option<bool>,
    pub divilo_account: Option<String>,
    pub next_slot_assignment: Option<NaiveDate>,
    pub traffic_manager: Option<String>,
    pub traffic_manager_comments: Option<String>,
    pub incidents: Option<String>,
    pub incident_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub missed_check_ins: Option<i32>,
    pub crossing: Option<String>,
    pub platform_glovo: Option<String>,
    pub platform_uber_eats: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub vacation_days_taken: Option<f64>,
    pub vacation_days_pending: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdp_is_percentage_of_full_time_week() {
        assert_eq!(compute_cdp(Some(38)), 100);
        assert_eq!(compute_cdp(Some(20)), 53);
        assert_eq!(compute_cdp(Some(0)), 0);
        assert_eq!(compute_cdp(None), 0);
    }

    #[test]
    fn capitalize_city_normalizes_casing() {
        assert_eq!(capitalize_city("mADRID"), "Madrid");
        assert_eq!(capitalize_city("  barcelona "), "Barcelona");
        assert_eq!(capitalize_city("ávila"), "Ávila");
        assert_eq!(capitalize_city(""), "");
    }

    #[test]
    fn status_parses_legacy_spanish_values() {
        assert_eq!(
            "pendiente_laboral".parse::<EmployeeStatus>(),
            Ok(EmployeeStatus::PendingLaboral)
        );
        assert_eq!(
            "penalizado".parse::<EmployeeStatus>(),
            Ok(EmployeeStatus::Penalized)
        );
        assert!("retired".parse::<EmployeeStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let value = serde_json::to_value(EmployeeStatus::CompanyLeavePending).expect("serialize");
        assert_eq!(value, serde_json::json!("company_leave_pending"));
        for status in EmployeeStatus::ALL {
            assert_eq!(status.as_str().parse::<EmployeeStatus>(), Ok(status));
        }
    }

    #[test]
    fn vehicle_accepts_spanish_labels() {
        assert_eq!("Moto".parse::<Vehicle>(), Ok(Vehicle::Motorbike));
        assert_eq!("Patinete".parse::<Vehicle>(), Ok(Vehicle::Scooter));
    }

    #[test]
    fn temporary_ids_are_detected() {
        assert!(is_temporary_id("TEMP_ab12cd34"));
        assert!(!is_temporary_id("G-1001"));
    }
}

//! Normalization of spreadsheet rows posted to the bulk-import endpoint.
//!
//! Rows arrive as loose JSON objects. Keys may be the snake_case column names
//! or the legacy spreadsheet headers (`idGlovo`, `nombre`, `horas`, ...).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::models::employee::{CreateEmployee, Employee, EmployeeStatus, Vehicle};
use crate::services::employee_state::{build_employee, park_hours};

pub type RawRow = Map<String, Value>;

/// Looks a field up under its canonical name, then under each legacy alias.
fn field<'a>(row: &'a RawRow, name: &str, aliases: &[&str]) -> Option<&'a Value> {
    std::iter::once(name)
        .chain(aliases.iter().copied())
        .find_map(|key| row.get(key))
        .filter(|value| !value.is_null())
}

pub fn normalize_string(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Rounds numeric input to an integer; anything non-numeric becomes `None`.
pub fn normalize_integer(value: Option<&Value>) -> Option<i32> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| number.round() as i32)
}

fn normalize_float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

pub fn normalize_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "si" | "sí"
        ),
        _ => false,
    }
}

/// Spreadsheet day zero (serial 1 is 1900-01-01 with the leap-year bug).
fn spreadsheet_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    spreadsheet_epoch()?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, RFC3339 and spreadsheet serial numbers.
pub fn normalize_date(value: Option<&Value>) -> Option<NaiveDate> {
    match value? {
        Value::Number(n) => from_serial(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc).date_naive())
                })
                .or_else(|| s.parse::<f64>().ok().and_then(from_serial))
        }
        _ => None,
    }
}

/// Result of normalizing a batch: the rows that passed and `Row N: ...` messages.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub employees: Vec<Employee>,
    pub errors: Vec<String>,
}

/// Spreadsheet row number for a zero-based index (row 1 is the header).
pub fn row_number(index: usize) -> usize {
    index + 2
}

pub fn normalize_rows(rows: &[RawRow], now: DateTime<Utc>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row, now) {
            Ok(employee) => batch.employees.push(employee),
            Err(messages) => batch.errors.extend(
                messages
                    .into_iter()
                    .map(|m| format!("Row {}: {}", row_number(index), m)),
            ),
        }
    }
    batch
}

fn normalize_row(row: &RawRow, now: DateTime<Utc>) -> Result<Employee, Vec<String>> {
    let text = |name: &str, aliases: &[&str]| normalize_string(field(row, name, aliases));
    let date = |name: &str, aliases: &[&str]| normalize_date(field(row, name, aliases));
    let mut errors = Vec::new();

    let glovo_id = text("glovo_id", &["idGlovo", "id_glovo"]);
    if glovo_id.is_none() {
        errors.push("glovo_id is required".to_string());
    }
    let first_name = text("first_name", &["nombre", "firstName"]);
    if first_name.is_none() {
        errors.push("first_name is required".to_string());
    }

    let status = match text("status", &["estado"]) {
        None => EmployeeStatus::Active,
        Some(raw) => match raw.parse::<EmployeeStatus>() {
            Ok(status) => status,
            Err(message) => {
                errors.push(message);
                EmployeeStatus::Active
            }
        },
    };
    let vehicle = match text("vehicle", &["vehiculo"]) {
        None => None,
        Some(raw) => match raw.parse::<Vehicle>() {
            Ok(vehicle) => Some(vehicle),
            Err(message) => {
                errors.push(message);
                None
            }
        },
    };

    let (Some(glovo_id), Some(first_name), true) = (glovo_id, first_name, errors.is_empty()) else {
        return Err(errors);
    };

    let payload = CreateEmployee {
        glovo_id: Some(glovo_id.clone()),
        glovo_email: text("glovo_email", &["emailGlovo"]),
        shift_1: text("shift_1", &["turno1"]),
        shift_2: text("shift_2", &["turno2"]),
        first_name,
        last_name: text("last_name", &["apellido", "lastName"]),
        phone: text("phone", &["telefono"]),
        email: text("email", &[]),
        hours: normalize_integer(field(row, "hours", &["horas"])),
        complementaries: text("complementaries", &[]),
        city: text("city", &["ciudad"]),
        city_code: text("city_code", &["cityCode"]),
        fleet: text("fleet", &["flota"]),
        national_id: text("national_id", &["dniNie", "dni_nie"]),
        iban: text("iban", &[]),
        address: text("address", &["direccion"]),
        vehicle,
        naf: text("naf", &[]),
        social_security_start_date: date("social_security_start_date", &["fechaAltaSegSoc"]),
        leave_status_note: text("leave_status_note", &["statusBaja"]),
        social_security_status: text("social_security_status", &["estadoSs"]),
        schedule_informed: normalize_bool(field(row, "schedule_informed", &["informadoHorario"])),
        divilo_account: text("divilo_account", &["cuentaDivilo"]),
        next_slot_assignment: date("next_slot_assignment", &["proximaAsignacionSlots"]),
        traffic_manager: text("traffic_manager", &["jefeTrafico"]),
        traffic_manager_comments: text("traffic_manager_comments", &["comentsJefeDeTrafico"]),
        incidents: text("incidents", &["incidencias"]),
        incident_date: date("incident_date", &["fechaIncidencia"]),
        missed_check_ins: normalize_integer(field(
            row,
            "missed_check_ins",
            &["faltasNoCheckInEnDias"],
        )),
        crossing: text("crossing", &["cruce"]),
        platform_glovo: text("platform_glovo", &["glovo"]),
        platform_uber_eats: text("platform_uber_eats", &["uber_eats", "uberEats"]),
        status: Some(status),
        vacation_days_taken: normalize_float(field(
            row,
            "vacation_days_taken",
            &["vacacionesDisfrutadas", "vacaciones_disfrutadas"],
        )),
        vacation_days_pending: normalize_float(field(
            row,
            "vacation_days_pending",
            &["vacacionesPendientes", "vacaciones_pendientes"],
        )),
    };

    let mut employee = build_employee(glovo_id, payload, status, now);
    if status.parks_hours() {
        park_hours(&mut employee, status);
    }
    Ok(employee)
}

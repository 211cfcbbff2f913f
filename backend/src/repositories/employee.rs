//! SQL access for the `employees` table.
//!
//! Reads used by the dashboard and lookups go through [`EmployeeRepositoryTrait`]
//! so they can be mocked. Writes are free functions over any [`PgExecutor`] so
//! the same statement runs against the pool or inside a transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{query_builder::Separated, FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::employee::{Employee, EmployeeStatus, SuspensionKind, EMPLOYEE_COLUMNS};

/// Pseudo city code meaning "no city code recorded".
pub const CITY_CODE_NONE: &str = "N/A";

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilters {
    /// Restricts rows to one city (case-insensitive) for scoped accounts.
    pub city_scope: Option<String>,
    pub city_code: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepositoryTrait: Send + Sync {
    async fn count_by_status(
        &self,
        db: &PgPool,
        city_scope: Option<String>,
    ) -> Result<Vec<StatusCount>, AppError>;

    async fn count_by_city(
        &self,
        db: &PgPool,
        city_scope: Option<String>,
    ) -> Result<Vec<CityCount>, AppError>;

    async fn distinct_cities(&self, db: &PgPool) -> Result<Vec<String>, AppError>;

    async fn distinct_fleets(&self, db: &PgPool) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmployeeRepositoryTrait for EmployeeRepository {
    async fn count_by_status(
        &self,
        db: &PgPool,
        city_scope: Option<String>,
    ) -> Result<Vec<StatusCount>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT status, COUNT(*) AS count FROM employees");
        if let Some(city) = city_scope {
            builder.push(" WHERE LOWER(city) = LOWER(").push_bind(city).push(")");
        }
        builder.push(" GROUP BY status");
        let rows = builder.build_query_as::<StatusCount>().fetch_all(db).await?;
        Ok(rows)
    }

    async fn count_by_city(
        &self,
        db: &PgPool,
        city_scope: Option<String>,
    ) -> Result<Vec<CityCount>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT city, COUNT(*) AS count FROM employees \
             WHERE city IS NOT NULL AND TRIM(city) <> ''",
        );
        if let Some(city) = city_scope {
            builder.push(" AND LOWER(city) = LOWER(").push_bind(city).push(")");
        }
        builder.push(" GROUP BY city ORDER BY city");
        let rows = builder.build_query_as::<CityCount>().fetch_all(db).await?;
        Ok(rows)
    }

    async fn distinct_cities(&self, db: &PgPool) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT city FROM employees \
             WHERE city IS NOT NULL AND TRIM(city) <> '' ORDER BY city",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    async fn distinct_fleets(&self, db: &PgPool) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT fleet FROM employees \
             WHERE fleet IS NOT NULL AND TRIM(fleet) <> '' ORDER BY fleet",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

pub async fn find_by_id<'e, E>(db: E, glovo_id: &str) -> Result<Option<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM employees WHERE glovo_id = $1", EMPLOYEE_COLUMNS);
    sqlx::query_as::<_, Employee>(&query)
        .bind(glovo_id)
        .fetch_optional(db)
        .await
}

/// Locks the row until the surrounding transaction ends.
pub async fn find_by_id_for_update<'e, E>(
    db: E,
    glovo_id: &str,
) -> Result<Option<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM employees WHERE glovo_id = $1 FOR UPDATE",
        EMPLOYEE_COLUMNS
    );
    sqlx::query_as::<_, Employee>(&query)
        .bind(glovo_id)
        .fetch_optional(db)
        .await
}

pub async fn exists<'e, E>(db: E, glovo_id: &str) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE glovo_id = $1)")
        .bind(glovo_id)
        .fetch_one(db)
        .await
}

pub async fn list<'e, E>(db: E, filters: &EmployeeFilters) -> Result<Vec<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));
    let mut has_clause = false;
    apply_filters(&mut builder, &mut has_clause, filters);
    builder.push(" ORDER BY created_at DESC, glovo_id");
    builder.build_query_as::<Employee>().fetch_all(db).await
}

fn apply_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &EmployeeFilters,
) {
    if let Some(city) = filters.city_scope.as_ref() {
        push_clause(builder, has_clause);
        builder
            .push("LOWER(city) = LOWER(")
            .push_bind(city.clone())
            .push(")");
    }
    match filters.city_code.as_deref().map(str::trim) {
        None | Some("") => {}
        Some(code) if code.eq_ignore_ascii_case("all") => {}
        Some(CITY_CODE_NONE) => {
            push_clause(builder, has_clause);
            builder.push("(city_code IS NULL OR TRIM(city_code) = '')");
        }
        Some(code) => {
            push_clause(builder, has_clause);
            builder.push("city_code = ").push_bind(code.to_string());
        }
    }
    if let Some(status) = filters.status {
        push_clause(builder, has_clause);
        builder.push("status = ").push_bind(status.as_str());
    }
    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search.to_lowercase());
        push_clause(builder, has_clause);
        builder.push("(");
        let columns = [
            "first_name",
            "last_name",
            "phone",
            "email",
            "glovo_id",
            "national_id",
        ];
        for (idx, column) in columns.iter().enumerate() {
            if idx > 0 {
                builder.push(" OR ");
            }
            builder
                .push("LOWER(COALESCE(")
                .push(*column)
                .push(", '')) LIKE ")
                .push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

const INSERT_COLUMNS: &str = "glovo_id, glovo_email, shift_1, shift_2, first_name, \
     last_name, phone, email, hours, cdp, complementaries, city, city_code, fleet, national_id, \
     iban, address, vehicle, naf, social_security_start_date, leave_status_note, \
     social_security_status, schedule_informed, divilo_account, next_slot_assignment, \
     traffic_manager, traffic_manager_comments, incidents, incident_date, missed_check_ins, \
     crossing, platform_glovo, platform_uber_eats, status, suspension_kind, \
     penalization_start_date, penalization_end_date, suspension_note, original_hours, last_order, \
     vacation_days_taken, vacation_days_pending, created_at, updated_at";

/// Columns refreshed by a bulk upsert when the id already exists.
///
/// `hours`, `cdp` and `status` are handled by [`UPSERT_PARKED_GUARD`].
const UPSERT_COLUMNS: [&str; 30] = [
    "glovo_email",
    "shift_1",
    "shift_2",
    "first_name",
    "last_name",
    "phone",
    "email",
    "complementaries",
    "city",
    "city_code",
    "fleet",
    "national_id",
    "iban",
    "address",
    "vehicle",
    "naf",
    "social_security_start_date",
    "leave_status_note",
    "social_security_status",
    "schedule_informed",
    "divilo_account",
    "next_slot_assignment",
    "traffic_manager",
    "traffic_manager_comments",
    "incidents",
    "incident_date",
    "missed_check_ins",
    "crossing",
    "platform_glovo",
    "platform_uber_eats",
];

/// An existing row with parked hours keeps its status and zero hours; the
/// imported contract hours replace the parked value instead.
const UPSERT_PARKED_GUARD: &str = "\
     hours = CASE WHEN employees.original_hours IS NOT NULL \
         THEN employees.hours ELSE EXCLUDED.hours END, \
     cdp = CASE WHEN employees.original_hours IS NOT NULL \
         THEN employees.cdp ELSE EXCLUDED.cdp END, \
     status = CASE WHEN employees.original_hours IS NOT NULL \
         THEN employees.status ELSE EXCLUDED.status END, \
     original_hours = CASE WHEN employees.original_hours IS NOT NULL \
         THEN COALESCE(EXCLUDED.original_hours, EXCLUDED.hours, employees.original_hours) \
         ELSE EXCLUDED.original_hours END";

fn bind_employee_values(mut row: Separated<'_, '_, Postgres, &'static str>, e: &Employee) {
    row.push_bind(e.glovo_id.clone())
        .push_bind(e.glovo_email.clone())
        .push_bind(e.shift_1.clone())
        .push_bind(e.shift_2.clone())
        .push_bind(e.first_name.clone())
        .push_bind(e.last_name.clone())
        .push_bind(e.phone.clone())
        .push_bind(e.email.clone())
        .push_bind(e.hours)
        .push_bind(e.cdp)
        .push_bind(e.complementaries.clone())
        .push_bind(e.city.clone())
        .push_bind(e.city_code.clone())
        .push_bind(e.fleet.clone())
        .push_bind(e.national_id.clone())
        .push_bind(e.iban.clone())
        .push_bind(e.address.clone())
        .push_bind(e.vehicle.map(|v| v.as_str()))
        .push_bind(e.naf.clone())
        .push_bind(e.social_security_start_date)
        .push_bind(e.leave_status_note.clone())
        .push_bind(e.social_security_status.clone())
        .push_bind(e.schedule_informed)
        .push_bind(e.divilo_account.clone())
        .push_bind(e.next_slot_assignment)
        .push_bind(e.traffic_manager.clone())
        .push_bind(e.traffic_manager_comments.clone())
        .push_bind(e.incidents.clone())
        .push_bind(e.incident_date)
        .push_bind(e.missed_check_ins)
        .push_bind(e.crossing.clone())
        .push_bind(e.platform_glovo.clone())
        .push_bind(e.platform_uber_eats.clone())
        .push_bind(e.status.as_str())
        .push_bind(e.suspension_kind.map(|k| k.as_str()))
        .push_bind(e.penalization_start_date)
        .push_bind(e.penalization_end_date)
        .push_bind(e.suspension_note.clone())
        .push_bind(e.original_hours)
        .push_bind(e.last_order)
        .push_bind(e.vacation_days_taken)
        .push_bind(e.vacation_days_pending)
        .push_bind(e.created_at)
        .push_bind(e.updated_at);
}

pub async fn insert<'e, E>(db: E, employee: &Employee) -> Result<Employee, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO employees ({}) ", INSERT_COLUMNS));
    builder.push_values(std::iter::once(employee), |row, e| {
        bind_employee_values(row, e)
    });
    builder.push(" RETURNING ").push(EMPLOYEE_COLUMNS);
    builder.build_query_as::<Employee>().fetch_one(db).await
}

/// Inserts or refreshes the row keyed by `glovo_id`, keeping `created_at`.
pub async fn upsert<'e, E>(db: E, employee: &Employee) -> Result<Employee, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO employees ({}) ", INSERT_COLUMNS));
    builder.push_values(std::iter::once(employee), |row, e| {
        bind_employee_values(row, e)
    });
    builder.push(" ON CONFLICT (glovo_id) DO UPDATE SET ");
    for (idx, column) in UPSERT_COLUMNS.iter().enumerate() {
        if idx > 0 {
            builder.push(", ");
        }
        builder
            .push(*column)
            .push(" = EXCLUDED.")
            .push(*column);
    }
    builder.push(", ").push(UPSERT_PARKED_GUARD);
    builder.push(", updated_at = NOW() RETURNING ").push(EMPLOYEE_COLUMNS);
    builder.build_query_as::<Employee>().fetch_one(db).await
}

/// Writes every mutable column of `employee` back to its row.
pub async fn save<'e, E>(db: E, employee: &Employee) -> Result<Employee, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let e = employee;
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE employees SET ");
    {
        let mut set = builder.separated(", ");
        set.push("glovo_email = ").push_bind_unseparated(e.glovo_email.clone());
        set.push("shift_1 = ").push_bind_unseparated(e.shift_1.clone());
        set.push("shift_2 = ").push_bind_unseparated(e.shift_2.clone());
        set.push("first_name = ").push_bind_unseparated(e.first_name.clone());
        set.push("last_name = ").push_bind_unseparated(e.last_name.clone());
        set.push("phone = ").push_bind_unseparated(e.phone.clone());
        set.push("email = ").push_bind_unseparated(e.email.clone());
        set.push("hours = ").push_bind_unseparated(e.hours);
        set.push("cdp = ").push_bind_unseparated(e.cdp);
        set.push("complementaries = ").push_bind_unseparated(e.complementaries.clone());
        set.push("city = ").push_bind_unseparated(e.city.clone());
        set.push("city_code = ").push_bind_unseparated(e.city_code.clone());
        set.push("fleet = ").push_bind_unseparated(e.fleet.clone());
        set.push("national_id = ").push_bind_unseparated(e.national_id.clone());
        set.push("iban = ").push_bind_unseparated(e.iban.clone());
        set.push("address = ").push_bind_unseparated(e.address.clone());
        set.push("vehicle = ").push_bind_unseparated(e.vehicle.map(|v| v.as_str()));
        set.push("naf = ").push_bind_unseparated(e.naf.clone());
        set.push("social_security_start_date = ")
            .push_bind_unseparated(e.social_security_start_date);
        set.push("leave_status_note = ").push_bind_unseparated(e.leave_status_note.clone());
        set.push("social_security_status = ")
            .push_bind_unseparated(e.social_security_status.clone());
        set.push("schedule_informed = ").push_bind_unseparated(e.schedule_informed);
        set.push("divilo_account = ").push_bind_unseparated(e.divilo_account.clone());
        set.push("next_slot_assignment = ").push_bind_unseparated(e.next_slot_assignment);
        set.push("traffic_manager = ").push_bind_unseparated(e.traffic_manager.clone());
        set.push("traffic_manager_comments = ")
            .push_bind_unseparated(e.traffic_manager_comments.clone());
        set.push("incidents = ").push_bind_unseparated(e.incidents.clone());
        set.push("incident_date = ").push_bind_unseparated(e.incident_date);
        set.push("missed_check_ins = ").push_bind_unseparated(e.missed_check_ins);
        set.push("crossing = ").push_bind_unseparated(e.crossing.clone());
        set.push("platform_glovo = ").push_bind_unseparated(e.platform_glovo.clone());
        set.push("platform_uber_eats = ").push_bind_unseparated(e.platform_uber_eats.clone());
        set.push("status = ").push_bind_unseparated(e.status.as_str());
        set.push("suspension_kind = ").push_bind_unseparated(e.suspension_kind.map(|k| k.as_str()));
        set.push("penalization_start_date = ").push_bind_unseparated(e.penalization_start_date);
        set.push("penalization_end_date = ").push_bind_unseparated(e.penalization_end_date);
        set.push("suspension_note = ").push_bind_unseparated(e.suspension_note.clone());
        set.push("original_hours = ").push_bind_unseparated(e.original_hours);
        set.push("last_order = ").push_bind_unseparated(e.last_order);
        set.push("vacation_days_taken = ").push_bind_unseparated(e.vacation_days_taken);
        set.push("vacation_days_pending = ").push_bind_unseparated(e.vacation_days_pending);
        set.push("updated_at = NOW()");
    }
    builder
        .push(" WHERE glovo_id = ")
        .push_bind(e.glovo_id.clone())
        .push(" RETURNING ")
        .push(EMPLOYEE_COLUMNS);
    builder.build_query_as::<Employee>().fetch_one(db).await
}

/// Changes the primary key of a pending employee.
pub async fn rename<'e, E>(db: E, old_id: &str, new_id: &str) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE employees SET glovo_id = $2, updated_at = NOW() WHERE glovo_id = $1")
            .bind(old_id)
            .bind(new_id)
            .execute(db)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete<'e, E>(db: E, glovo_id: &str) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM employees WHERE glovo_id = $1")
        .bind(glovo_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_all<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM employees").execute(db).await?;
    Ok(result.rows_affected())
}

/// Employees with a suspension (running or scheduled) whose end date is before `today`.
pub async fn find_expired_suspensions<'e, E>(
    db: E,
    today: NaiveDate,
) -> Result<Vec<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM employees \
         WHERE suspension_kind IS NOT NULL AND penalization_end_date < $1 \
         ORDER BY penalization_end_date, glovo_id",
        EMPLOYEE_COLUMNS
    );
    sqlx::query_as::<_, Employee>(&query)
        .bind(today)
        .fetch_all(db)
        .await
}

/// Count of suspensions that are still running or waiting to start.
pub async fn count_open_suspensions<'e, E>(db: E, today: NaiveDate) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employees \
         WHERE suspension_kind IS NOT NULL AND penalization_end_date >= $1",
    )
    .bind(today)
    .fetch_one(db)
    .await
}

/// Scheduled suspensions (status still `active`) whose start date has arrived.
pub async fn find_due_scheduled_suspensions<'e, E>(
    db: E,
    today: NaiveDate,
) -> Result<Vec<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM employees \
         WHERE suspension_kind IS NOT NULL AND status = 'active' \
         AND penalization_start_date <= $1 \
         ORDER BY penalization_start_date, glovo_id",
        EMPLOYEE_COLUMNS
    );
    sqlx::query_as::<_, Employee>(&query)
        .bind(today)
        .fetch_all(db)
        .await
}

pub async fn find_expiring_suspensions<'e, E>(
    db: E,
    kind: SuspensionKind,
    today: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<Employee>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM employees \
         WHERE suspension_kind = $1 AND status = $2 \
         AND penalization_end_date BETWEEN $3 AND $4 \
         ORDER BY penalization_end_date, glovo_id",
        EMPLOYEE_COLUMNS
    );
    sqlx::query_as::<_, Employee>(&query)
        .bind(kind.as_str())
        .bind(kind.running_status().as_str())
        .bind(today)
        .bind(until)
        .fetch_all(db)
        .await
}

/// Copies `last_order` from the courier export; returns the number of rows changed.
pub async fn sync_last_order<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE employees e SET last_order = c.last_order, updated_at = NOW() \
         FROM couriers_export c \
         WHERE c.courier_id = e.glovo_id AND c.last_order IS DISTINCT FROM e.last_order",
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

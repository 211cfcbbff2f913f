//! SQL access for company leaves and their reason-change history.

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{types::Json, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::company_leave::{
    CompanyLeave, CompanyLeaveStatus, CompanyLeaveType, EmployeeLeaveHistory,
};

const COMPANY_LEAVE_COLUMNS: &str = "id, employee_id, employee_data, leave_type, leave_date, \
     comments, leave_requested_by, leave_requested_at, approved_by, approved_at, status, \
     reactivated_at, reactivated_by, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct CompanyLeaveFilters {
    pub status: Option<CompanyLeaveStatus>,
    pub leave_type: Option<CompanyLeaveType>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompanyLeave {
    pub employee_id: String,
    pub employee_data: Value,
    pub leave_type: CompanyLeaveType,
    pub leave_date: NaiveDate,
    pub comments: Option<String>,
    pub requested_by: String,
}

#[derive(Debug, Clone)]
pub struct NewLeaveHistory {
    pub employee_id: String,
    pub leave_type: String,
    pub previous_reason: String,
    pub new_reason: String,
    pub comments: Option<String>,
    pub changed_by: String,
    pub changed_by_role: String,
}

pub async fn insert<'e, E>(db: E, leave: &NewCompanyLeave) -> Result<CompanyLeave, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO company_leaves \
         (employee_id, employee_data, leave_type, leave_date, comments, leave_requested_by, \
         status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'pending') RETURNING {}",
        COMPANY_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, CompanyLeave>(&query)
        .bind(&leave.employee_id)
        .bind(Json(&leave.employee_data))
        .bind(leave.leave_type.as_str())
        .bind(leave.leave_date)
        .bind(&leave.comments)
        .bind(&leave.requested_by)
        .fetch_one(db)
        .await
}

pub async fn find_by_id<'e, E>(db: E, id: i64) -> Result<Option<CompanyLeave>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM company_leaves WHERE id = $1",
        COMPANY_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, CompanyLeave>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list(
    pool: &PgPool,
    filters: &CompanyLeaveFilters,
    per_page: i64,
    offset: i64,
) -> Result<(Vec<CompanyLeave>, i64), sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM company_leaves",
        COMPANY_LEAVE_COLUMNS
    ));
    let mut has_clause = false;
    apply_filters(&mut builder, &mut has_clause, filters);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind(offset);
    let items = builder
        .build_query_as::<CompanyLeave>()
        .fetch_all(pool)
        .await?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM company_leaves");
    let mut count_has_clause = false;
    apply_filters(&mut count_builder, &mut count_has_clause, filters);
    let total = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

fn apply_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &CompanyLeaveFilters,
) {
    if let Some(status) = filters.status {
        push_clause(builder, has_clause);
        builder.push("status = ").push_bind(status.as_str());
    }
    if let Some(leave_type) = filters.leave_type {
        push_clause(builder, has_clause);
        builder.push("leave_type = ").push_bind(leave_type.as_str());
    }
    if let Some(search) = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search.to_lowercase());
        push_clause(builder, has_clause);
        builder.push("(LOWER(employee_id) LIKE ").push_bind(pattern.clone());
        for key in ["first_name", "last_name", "email", "national_id", "glovo_id"] {
            builder
                .push(" OR LOWER(COALESCE(employee_data->>'")
                .push(key)
                .push("', '')) LIKE ")
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

/// Sets the decision columns; `approved_by` is only written for approvals.
pub async fn update_status<'e, E>(
    db: E,
    id: i64,
    status: CompanyLeaveStatus,
    decided_by: &str,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE company_leaves SET status = $2, \
         approved_by = CASE WHEN $2 = 'approved' THEN $3 ELSE approved_by END, \
         approved_at = CASE WHEN $2 = 'approved' THEN NOW() ELSE approved_at END, \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(decided_by)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn change_reason<'e, E>(
    db: E,
    id: i64,
    leave_type: CompanyLeaveType,
    comments: Option<&str>,
) -> Result<CompanyLeave, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "UPDATE company_leaves SET leave_type = $2, comments = $3, updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        COMPANY_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, CompanyLeave>(&query)
        .bind(id)
        .bind(leave_type.as_str())
        .bind(comments)
        .fetch_one(db)
        .await
}

/// Latest approved leave of an employee that has not been reactivated yet.
pub async fn latest_approved_for_employee<'e, E>(
    db: E,
    employee_id: &str,
) -> Result<Option<CompanyLeave>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM company_leaves \
         WHERE employee_id = $1 AND status = 'approved' AND reactivated_at IS NULL \
         ORDER BY COALESCE(approved_at, updated_at) DESC, id DESC LIMIT 1 FOR UPDATE",
        COMPANY_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, CompanyLeave>(&query)
        .bind(employee_id)
        .fetch_optional(db)
        .await
}

pub async fn mark_reactivated<'e, E>(db: E, id: i64, by: &str) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE company_leaves SET reactivated_at = NOW(), reactivated_by = $2, \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(by)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_reactivated<'e, E>(db: E) -> Result<Vec<CompanyLeave>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM company_leaves WHERE reactivated_at IS NOT NULL \
         ORDER BY reactivated_at DESC, id DESC",
        COMPANY_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, CompanyLeave>(&query).fetch_all(db).await
}

/// Moves company leave and leave history rows to the employee's new id.
///
/// Returns the number of rows moved across both tables.
pub async fn reassign_employee<'e, E>(
    db: E,
    old_id: &str,
    new_id: &str,
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "WITH leaves AS ( \
             UPDATE company_leaves SET employee_id = $2, updated_at = NOW() \
             WHERE employee_id = $1 RETURNING 1 \
         ), history AS ( \
             UPDATE employee_leave_history SET employee_id = $2 \
             WHERE employee_id = $1 RETURNING 1 \
         ) \
         SELECT (SELECT COUNT(*) FROM leaves) + (SELECT COUNT(*) FROM history)",
    )
    .bind(old_id)
    .bind(new_id)
    .fetch_one(db)
    .await
}

pub async fn insert_history<'e, E>(
    db: E,
    entry: &NewLeaveHistory,
) -> Result<EmployeeLeaveHistory, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, EmployeeLeaveHistory>(
        "INSERT INTO employee_leave_history \
         (employee_id, leave_type, previous_reason, new_reason, comments, changed_by, \
         changed_by_role) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, employee_id, leave_type, previous_reason, new_reason, comments, \
         changed_by, changed_by_role, created_at",
    )
    .bind(&entry.employee_id)
    .bind(&entry.leave_type)
    .bind(&entry.previous_reason)
    .bind(&entry.new_reason)
    .bind(&entry.comments)
    .bind(&entry.changed_by)
    .bind(&entry.changed_by_role)
    .fetch_one(db)
    .await
}

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{types::Json, PgExecutor};

use crate::models::it_leave::{ItLeave, ItLeaveType};

const IT_LEAVE_COLUMNS: &str = "id, employee_id, employee_data, leave_type, leave_date, \
     requested_by, requested_at, ended_at, ended_by, status, created_at";

pub async fn insert<'e, E>(
    db: E,
    employee_id: &str,
    employee_data: &Value,
    leave_type: ItLeaveType,
    leave_date: NaiveDate,
    requested_by: &str,
) -> Result<ItLeave, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO it_leaves \
         (employee_id, employee_data, leave_type, leave_date, requested_by, status) \
         VALUES ($1, $2, $3, $4, $5, 'active') RETURNING {}",
        IT_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, ItLeave>(&query)
        .bind(employee_id)
        .bind(Json(employee_data))
        .bind(leave_type.as_str())
        .bind(leave_date)
        .bind(requested_by)
        .fetch_one(db)
        .await
}

pub async fn list<'e, E>(db: E) -> Result<Vec<ItLeave>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM it_leaves ORDER BY created_at DESC, id DESC",
        IT_LEAVE_COLUMNS
    );
    sqlx::query_as::<_, ItLeave>(&query).fetch_all(db).await
}

/// Closes every open IT leave of the employee.
pub async fn end_active_for_employee<'e, E>(
    db: E,
    employee_id: &str,
    ended_by: &str,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE it_leaves SET status = 'ended', ended_at = NOW(), ended_by = $2 \
         WHERE employee_id = $1 AND status = 'active'",
    )
    .bind(employee_id)
    .bind(ended_by)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Moves IT leave rows to the employee's new id.
pub async fn reassign_employee<'e, E>(
    db: E,
    old_id: &str,
    new_id: &str,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE it_leaves SET employee_id = $2 WHERE employee_id = $1")
        .bind(old_id)
        .bind(new_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

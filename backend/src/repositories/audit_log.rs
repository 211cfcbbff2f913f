use chrono::{Duration, NaiveDate};
use serde_json::Value;
use sqlx::{types::Json, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::audit_log::{AuditLog, AuditLogFilters, AuditLogStats, LabelCount};

const AUDIT_LOG_COLUMNS: &str = "id, user_id, user_role, action, entity_type, entity_id, \
     entity_name, description, old_data, new_data, ip_address, user_agent, request_id, created_at";

/// Row to append to `audit_logs`.
#[derive(Debug, Clone, Default)]
pub struct NewAuditLog {
    pub user_id: String,
    pub user_role: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub description: String,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

pub async fn insert_audit_log<'e, E>(db: E, log: &NewAuditLog) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO audit_logs \
         (user_id, user_role, action, entity_type, entity_id, entity_name, description, \
         old_data, new_data, ip_address, user_agent, request_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(&log.user_id)
    .bind(&log.user_role)
    .bind(&log.action)
    .bind(&log.entity_type)
    .bind(&log.entity_id)
    .bind(&log.entity_name)
    .bind(&log.description)
    .bind(log.old_data.as_ref().map(Json))
    .bind(log.new_data.as_ref().map(Json))
    .bind(&log.ip_address)
    .bind(&log.user_agent)
    .bind(&log.request_id)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn list_audit_logs(
    pool: &PgPool,
    filters: &AuditLogFilters,
    limit: i64,
) -> Result<Vec<AuditLog>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM audit_logs", AUDIT_LOG_COLUMNS));
    let mut has_clause = false;
    apply_audit_log_filters(&mut builder, &mut has_clause, filters);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit);
    builder.build_query_as::<AuditLog>().fetch_all(pool).await
}

fn apply_audit_log_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &AuditLogFilters,
) {
    if let Some(action) = filters.action.as_ref() {
        push_clause(builder, has_clause);
        builder.push("action = ").push_bind(action.clone());
    }
    if let Some(entity_type) = filters.entity_type.as_ref() {
        push_clause(builder, has_clause);
        builder.push("entity_type = ").push_bind(entity_type.clone());
    }
    if let Some(user_id) = filters.user_id.as_ref() {
        push_clause(builder, has_clause);
        builder.push("user_id = ").push_bind(user_id.clone());
    }
    if let Some(search) = filters.search.as_ref() {
        let pattern = format!("%{}%", search.to_lowercase());
        push_clause(builder, has_clause);
        builder
            .push("(LOWER(description) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(entity_name, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(entity_id, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(start) = filters.start_date {
        push_clause(builder, has_clause);
        builder.push("created_at >= ").push_bind(start_of_day(start));
    }
    if let Some(end) = filters.end_date {
        push_clause(builder, has_clause);
        // inclusive end date
        builder
            .push("created_at < ")
            .push_bind(start_of_day(end + Duration::days(1)));
    }
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

pub async fn stats(pool: &PgPool, today: NaiveDate) -> Result<AuditLogStats, sqlx::Error> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await?;
    let today_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE created_at >= $1")
            .bind(start_of_day(today))
            .fetch_one(pool)
            .await?;
    let last_7_days =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE created_at >= $1")
            .bind(start_of_day(today - Duration::days(6)))
            .fetch_one(pool)
            .await?;

    Ok(AuditLogStats {
        total,
        today: today_count,
        last_7_days,
        by_action: group_counts(pool, "action").await?,
        by_entity_type: group_counts(pool, "entity_type").await?,
        by_role: group_counts(pool, "user_role").await?,
    })
}

async fn group_counts(pool: &PgPool, column: &'static str) -> Result<Vec<LabelCount>, sqlx::Error> {
    let query = format!(
        "SELECT {column} AS label, COUNT(*) AS count FROM audit_logs \
         GROUP BY {column} ORDER BY count DESC, label"
    );
    sqlx::query_as::<_, LabelCount>(&query).fetch_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_render_in_declaration_order() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM audit_logs");
        let mut has_clause = false;
        let filters = AuditLogFilters {
            action: Some("login".into()),
            user_id: Some("ana@fleet.test".into()),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            ..Default::default()
        };
        apply_audit_log_filters(&mut builder, &mut has_clause, &filters);
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM audit_logs WHERE action = $1 AND user_id = $2 \
             AND created_at >= $3 AND created_at < $4"
        );
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(start_of_day(date).to_rfc3339(), "2025-05-06T00:00:00+00:00");
    }
}

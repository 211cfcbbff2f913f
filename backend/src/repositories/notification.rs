use chrono::NaiveDate;
use sqlx::{types::Json, PgExecutor, Postgres, QueryBuilder};

use crate::models::notification::{NewNotification, Notification, NotificationStatus};

const NOTIFICATION_COLUMNS: &str = "id, type, title, message, requested_by, status, metadata, \
     processing_date, created_at, updated_at";

pub async fn insert<'e, E>(db: E, item: &NewNotification) -> Result<Notification, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO notifications (type, title, message, requested_by, status, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        NOTIFICATION_COLUMNS
    );
    sqlx::query_as::<_, Notification>(&query)
        .bind(item.notification_type.as_str())
        .bind(&item.title)
        .bind(&item.message)
        .bind(&item.requested_by)
        .bind(item.status.as_str())
        .bind(item.metadata.as_ref().map(Json))
        .fetch_one(db)
        .await
}

pub async fn find_by_id<'e, E>(db: E, id: i64) -> Result<Option<Notification>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);
    sqlx::query_as::<_, Notification>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Locks the notification so concurrent decisions serialize.
pub async fn find_by_id_for_update<'e, E>(
    db: E,
    id: i64,
) -> Result<Option<Notification>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM notifications WHERE id = $1 FOR UPDATE",
        NOTIFICATION_COLUMNS
    );
    sqlx::query_as::<_, Notification>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E>(
    db: E,
    status: Option<NotificationStatus>,
) -> Result<Vec<Notification>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM notifications", NOTIFICATION_COLUMNS));
    if let Some(status) = status {
        builder.push(" WHERE status = ").push_bind(status.as_str());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    builder.build_query_as::<Notification>().fetch_all(db).await
}

pub async fn update_status<'e, E>(
    db: E,
    id: i64,
    status: NotificationStatus,
    processing_date: Option<NaiveDate>,
) -> Result<Option<Notification>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "UPDATE notifications SET status = $2, \
         processing_date = COALESCE($3, processing_date), updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        NOTIFICATION_COLUMNS
    );
    sqlx::query_as::<_, Notification>(&query)
        .bind(id)
        .bind(status.as_str())
        .bind(processing_date)
        .fetch_optional(db)
        .await
}

pub async fn count_pending<'e, E>(db: E) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE status = 'pending'")
        .fetch_one(db)
        .await
}

//! Repository functions for back-office accounts.

use sqlx::{PgExecutor, Postgres, QueryBuilder};

use crate::models::system_user::{Role, SystemUser, UpdateSystemUser};

const SYSTEM_USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, role, \
     assigned_city, is_active, last_login, created_by, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewSystemUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub assigned_city: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
}

pub async fn find_by_id<'e, E>(db: E, id: i64) -> Result<Option<SystemUser>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM system_users WHERE id = $1", SYSTEM_USER_COLUMNS);
    sqlx::query_as::<_, SystemUser>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_email<'e, E>(db: E, email: &str) -> Result<Option<SystemUser>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM system_users WHERE LOWER(email) = LOWER($1)",
        SYSTEM_USER_COLUMNS
    );
    sqlx::query_as::<_, SystemUser>(&query)
        .bind(email.trim())
        .fetch_optional(db)
        .await
}

pub async fn list<'e, E>(db: E) -> Result<Vec<SystemUser>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM system_users ORDER BY created_at DESC, id DESC",
        SYSTEM_USER_COLUMNS
    );
    sqlx::query_as::<_, SystemUser>(&query).fetch_all(db).await
}

pub async fn insert<'e, E>(db: E, user: &NewSystemUser) -> Result<SystemUser, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO system_users \
         (email, first_name, last_name, password_hash, role, assigned_city, is_active, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        SYSTEM_USER_COLUMNS
    );
    sqlx::query_as::<_, SystemUser>(&query)
        .bind(user.email.trim().to_lowercase())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.assigned_city)
        .bind(user.is_active)
        .bind(&user.created_by)
        .fetch_one(db)
        .await
}

/// Applies the fields present in `update`; returns `None` when the id is unknown.
pub async fn update<'e, E>(
    db: E,
    id: i64,
    update: &UpdateSystemUser,
) -> Result<Option<SystemUser>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE system_users SET ");
    {
        let mut set = builder.separated(", ");
        if let Some(email) = update.email.as_ref() {
            set.push("email = ")
                .push_bind_unseparated(email.trim().to_lowercase());
        }
        if let Some(first_name) = update.first_name.as_ref() {
            set.push("first_name = ").push_bind_unseparated(first_name.clone());
        }
        if let Some(last_name) = update.last_name.as_ref() {
            set.push("last_name = ").push_bind_unseparated(last_name.clone());
        }
        if let Some(role) = update.role {
            set.push("role = ").push_bind_unseparated(role.as_str());
        }
        if let Some(city) = update.assigned_city.as_ref() {
            let city = city.trim();
            set.push("assigned_city = ")
                .push_bind_unseparated((!city.is_empty()).then(|| city.to_string()));
        }
        if let Some(is_active) = update.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
        }
        set.push("updated_at = NOW()");
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(SYSTEM_USER_COLUMNS);
    builder
        .build_query_as::<SystemUser>()
        .fetch_optional(db)
        .await
}

pub async fn update_password<'e, E>(db: E, id: i64, password_hash: &str) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE system_users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn touch_last_login<'e, E>(db: E, id: i64) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE system_users SET last_login = NOW() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .map(|_| ())
}

pub async fn delete<'e, E>(db: E, id: i64) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM system_users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

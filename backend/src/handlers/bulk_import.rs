use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    handlers::common::ensure_super_admin,
    middleware::AuditContext,
    models::{
        employee::Employee,
        notification::{NewNotification, NotificationStatus, NotificationType},
        system_user::SystemUser,
    },
    repositories::{
        begin_transaction, commit_transaction, employee as employee_repo,
        notification as notification_repo,
    },
    services::{
        audit::{AuditEvent, AuditService},
        bulk_import::{normalize_rows, RawRow},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkImportRequest {
    #[schema(value_type = Vec<Object>)]
    pub employees: Vec<RawRow>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkImportResponse {
    pub dry_run: bool,
    pub imported: usize,
    pub employees: Vec<Employee>,
    pub notification_id: Option<i64>,
}

pub async fn bulk_import(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
    Json(payload): Json<BulkImportRequest>,
) -> Result<Json<BulkImportResponse>, AppError> {
    ensure_super_admin(&user)?;
    if payload.employees.is_empty() {
        return Err(AppError::bad_request("employees must contain at least one row"));
    }

    let batch = normalize_rows(&payload.employees, Utc::now());
    if !batch.errors.is_empty() {
        tracing::debug!(errors = batch.errors.len(), "Bulk import rejected");
        return Err(AppError::Validation(batch.errors));
    }

    if payload.dry_run {
        return Ok(Json(BulkImportResponse {
            dry_run: true,
            imported: 0,
            employees: batch.employees,
            notification_id: None,
        }));
    }

    let mut tx = begin_transaction(&state.pool).await?;
    let mut saved = Vec::with_capacity(batch.employees.len());
    for employee in &batch.employees {
        saved.push(employee_repo::upsert(&mut *tx, employee).await?);
    }
    let notification = notification_repo::insert(
        &mut *tx,
        &NewNotification {
            notification_type: NotificationType::BulkUpload,
            title: "Bulk employee import".to_string(),
            message: format!("{} employees imported by {}", saved.len(), user.email),
            requested_by: user.email.clone(),
            status: NotificationStatus::Processed,
            metadata: Some(json!({
                "count": saved.len(),
                "glovo_ids": saved.iter().map(|e| e.glovo_id.as_str()).collect::<Vec<_>>(),
            })),
        },
    )
    .await?;
    commit_transaction(tx).await?;

    tracing::info!(imported = saved.len(), actor = %user.email, "Bulk import committed");

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "bulk_import_employees",
                "employee",
                format!("Bulk import of {} employees", saved.len()),
            )
            .entity("bulk_import", Some(format!("{} employees", saved.len())))
            .new_data(&json!({
                "count": saved.len(),
                "notification_id": notification.id,
            })),
        )
        .await;

    Ok(Json(BulkImportResponse {
        dry_run: false,
        imported: saved.len(),
        employees: saved,
        notification_id: Some(notification.id),
    }))
}

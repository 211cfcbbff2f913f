use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    error::AppError,
    handlers::common::ensure_can_manage,
    middleware::AuditContext,
    models::system_user::SystemUser,
    repositories::{notification as notification_repo, EmployeeRepository},
    services::{
        audit::{AuditEvent, AuditService},
        dashboard::{build_metrics, DashboardMetrics},
    },
    state::AppState,
};

pub async fn metrics(
    State(state): State<AppState>,
    Extension(user): Extension<SystemUser>,
    context: AuditContext,
) -> Result<Json<DashboardMetrics>, AppError> {
    ensure_can_manage(&user)?;

    let pending_actions = if user.is_super_admin() {
        notification_repo::count_pending(&state.pool).await?
    } else {
        0
    };
    let scope = user.city_scope().map(str::to_string);
    let metrics =
        build_metrics(&EmployeeRepository::new(), &state.pool, scope, pending_actions).await?;

    AuditService::new(state.pool.clone())
        .log_action(
            &context,
            AuditEvent::new(
                "access_dashboard",
                "dashboard",
                format!("Dashboard opened by {}", user.email),
            ),
        )
        .await;

    Ok(Json(metrics))
}

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware as app_middleware, state::AppState};

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
}

fn employee_routes() -> Router<AppState> {
    use handlers::{bulk_import, company_leaves, employees, it_leaves, suspensions};

    Router::new()
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/api/employees/all", delete(employees::delete_all_employees))
        .route("/api/employees/export/csv", get(employees::export_employees_csv))
        .route("/api/employees/bulk-import", post(bulk_import::bulk_import))
        .route("/api/employees/sync-last-order", post(employees::sync_last_order))
        .route(
            "/api/employees/check-expired-penalizations",
            post(suspensions::check_expired),
        )
        .route(
            "/api/employees/check-scheduled-penalizations",
            post(suspensions::check_scheduled),
        )
        .route(
            "/api/employees/penalizations/expiring-soon",
            get(suspensions::penalizations_expiring_soon),
        )
        .route(
            "/api/employees/vacations/expiring-soon",
            get(suspensions::vacations_expiring_soon),
        )
        .route(
            "/api/employees/reactivated-from-leaves",
            get(company_leaves::list_reactivated),
        )
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route("/api/employees/{id}/penalize", post(suspensions::penalize))
        .route("/api/employees/{id}/vacation", post(suspensions::vacation))
        .route(
            "/api/employees/{id}/remove-penalization",
            post(suspensions::remove_penalization),
        )
        .route(
            "/api/employees/{id}/remove-vacation",
            post(suspensions::remove_vacation),
        )
        .route(
            "/api/employees/{id}/it-leave",
            post(it_leaves::set_employee_it_leave),
        )
        .route(
            "/api/employees/{id}/reactivate",
            post(company_leaves::reactivate_employee),
        )
}

fn workflow_routes() -> Router<AppState> {
    use handlers::{company_leaves, it_leaves, notifications};

    Router::new()
        .route(
            "/api/it-leaves",
            get(it_leaves::list_it_leaves).post(it_leaves::create_it_leave),
        )
        .route(
            "/api/company-leaves",
            get(company_leaves::list_company_leaves).post(company_leaves::create_company_leave),
        )
        .route(
            "/api/company-leaves/{id}/change-reason",
            post(company_leaves::change_leave_reason),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/api/notifications/{id}/status",
            put(notifications::update_notification_status),
        )
        .route(
            "/api/notifications/{id}/process",
            post(notifications::process_notification),
        )
}

fn admin_routes() -> Router<AppState> {
    use handlers::{audit_logs, auth, dashboard, employees, lookups, system_users};

    Router::new()
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/dashboard/metrics", get(dashboard::metrics))
        .route("/api/cities", get(lookups::cities))
        .route("/api/ciudades", get(lookups::cities))
        .route("/api/fleets", get(lookups::fleets))
        .route("/api/log-page-access", post(employees::log_page_access))
        .route(
            "/api/system-users",
            get(system_users::list_system_users).post(system_users::create_system_user),
        )
        .route(
            "/api/system-users/{id}",
            put(system_users::update_system_user).delete(system_users::delete_system_user),
        )
        .route(
            "/api/system-users/{id}/password",
            put(system_users::change_system_user_password),
        )
        .route("/api/audit-logs", get(audit_logs::list_audit_logs))
        .route("/api/audit-logs/stats", get(audit_logs::audit_log_stats))
}

/// Every route that requires a bearer token, without the auth layer.
///
/// Tests mount this directly behind an `Extension<SystemUser>` layer.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(employee_routes())
        .merge(workflow_routes())
        .merge(admin_routes())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}

pub fn build_router(state: AppState) -> Router {
    let authed = protected_routes().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        app_middleware::auth,
    ));

    Router::new()
        .merge(public_routes())
        .merge(authed)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(axum_middleware::from_fn(app_middleware::log_error_responses))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allow_origins)),
        )
        .with_state(state)
}

#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{
        bulk_import::{BulkImportRequest, BulkImportResponse},
        employees::{EmployeeListQuery, PageAccessRequest},
        health::HealthResponse,
        it_leaves::ItLeaveResponse,
        notifications::ProcessNotificationResponse,
        suspensions::{
            ExpiringQuery, ExpiringResponse, LiftResponse, SuspensionPayload, SuspensionResponse,
        },
    },
    models::{
        audit_log::{AuditLog, AuditLogListQuery, AuditLogStats, LabelCount},
        company_leave::{
            ChangeLeaveReasonRequest, CompanyLeave, CompanyLeaveQuery, CompanyLeaveStatus,
            CompanyLeaveType, CreateCompanyLeaveRequest, CreateCompanyLeaveResponse,
            EmployeeLeaveHistory,
        },
        employee::{
            CreateEmployee, Employee, EmployeeStatus, SuspensionKind, UpdateEmployee, Vehicle,
        },
        it_leave::{CreateItLeaveRequest, ItLeave, ItLeaveStatus, ItLeaveType, SetItLeaveRequest},
        notification::{
            CreateNotificationRequest, Notification, NotificationQuery, NotificationStatus,
            NotificationType, ProcessNotificationRequest, UpdateNotificationStatusRequest,
        },
        system_user::{
            ChangePasswordRequest, CreateSystemUser, LoginRequest, LoginResponse, Role,
            SystemUserResponse, UpdateSystemUser,
        },
        PaginatedResponse,
    },
    services::{
        dashboard::{CityMetric, DashboardMetrics},
        suspension::SuspensionOutcome,
        sweep::{ActivatedEmployee, ExpiredSweepReport, RestoredEmployee, ScheduledSweepReport},
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        login_doc,
        current_user_doc,
        logout_doc,
        dashboard_metrics_doc,
        cities_doc,
        fleets_doc,
        page_access_doc,
        list_employees_doc,
        create_employee_doc,
        get_employee_doc,
        update_employee_doc,
        delete_employee_doc,
        delete_all_employees_doc,
        export_employees_doc,
        bulk_import_doc,
        sync_last_order_doc,
        penalize_doc,
        vacation_doc,
        remove_penalization_doc,
        remove_vacation_doc,
        check_expired_doc,
        check_scheduled_doc,
        penalizations_expiring_doc,
        vacations_expiring_doc,
        set_it_leave_doc,
        list_it_leaves_doc,
        create_it_leave_doc,
        list_company_leaves_doc,
        create_company_leave_doc,
        change_leave_reason_doc,
        reactivate_employee_doc,
        reactivated_employees_doc,
        list_notifications_doc,
        create_notification_doc,
        update_notification_status_doc,
        process_notification_doc,
        list_system_users_doc,
        create_system_user_doc,
        update_system_user_doc,
        delete_system_user_doc,
        change_system_user_password_doc,
        list_audit_logs_doc,
        audit_log_stats_doc
    ),
    components(
        schemas(
            // auth & accounts
            LoginRequest,
            LoginResponse,
            Role,
            SystemUserResponse,
            CreateSystemUser,
            UpdateSystemUser,
            ChangePasswordRequest,
            HealthResponse,
            // employees
            Employee,
            EmployeeStatus,
            Vehicle,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListQuery,
            PageAccessRequest,
            BulkImportRequest,
            BulkImportResponse,
            // suspensions
            SuspensionKind,
            SuspensionPayload,
            SuspensionOutcome,
            SuspensionResponse,
            LiftResponse,
            ExpiringResponse,
            RestoredEmployee,
            ExpiredSweepReport,
            ActivatedEmployee,
            ScheduledSweepReport,
            // leaves
            ItLeave,
            ItLeaveType,
            ItLeaveStatus,
            SetItLeaveRequest,
            CreateItLeaveRequest,
            ItLeaveResponse,
            CompanyLeave,
            CompanyLeaveType,
            CompanyLeaveStatus,
            CreateCompanyLeaveRequest,
            CreateCompanyLeaveResponse,
            ChangeLeaveReasonRequest,
            EmployeeLeaveHistory,
            // notifications
            Notification,
            NotificationType,
            NotificationStatus,
            CreateNotificationRequest,
            UpdateNotificationStatusRequest,
            ProcessNotificationRequest,
            ProcessNotificationResponse,
            // reporting
            DashboardMetrics,
            CityMetric,
            AuditLog,
            AuditLogStats,
            LabelCount
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, logout and current account"),
        (name = "Employees", description = "Courier roster, CSV export and bulk import"),
        (name = "Suspensions", description = "Penalizations, vacations and daily sweeps"),
        (name = "Leaves", description = "IT leaves and company leave workflow"),
        (name = "Notifications", description = "Approval queue for super admins"),
        (name = "Admin", description = "System users, audit logs and dashboard")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, body = HealthResponse)),
    tag = "Auth",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials or disabled account")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses((status = 200, description = "Authenticated account", body = SystemUserResponse)),
    tag = "Auth"
)]
fn current_user_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, body = serde_json::Value)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    responses(
        (status = 200, body = DashboardMetrics),
        (status = 403, description = "Normal accounts cannot open the dashboard")
    ),
    tag = "Admin"
)]
fn dashboard_metrics_doc() {}

#[utoipa::path(
    get,
    path = "/api/cities",
    responses((status = 200, body = [String])),
    tag = "Employees"
)]
fn cities_doc() {}

#[utoipa::path(
    get,
    path = "/api/fleets",
    responses((status = 200, body = [String])),
    tag = "Employees"
)]
fn fleets_doc() {}

#[utoipa::path(
    post,
    path = "/api/log-page-access",
    request_body = PageAccessRequest,
    responses((status = 200, body = serde_json::Value)),
    tag = "Admin"
)]
fn page_access_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeListQuery),
    responses((status = 200, body = [Employee])),
    tag = "Employees"
)]
fn list_employees_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, body = Employee),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Glovo ID already exists")
    ),
    tag = "Employees"
)]
fn create_employee_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = String, Path, description = "Glovo ID")),
    responses((status = 200, body = Employee), (status = 404)),
    tag = "Employees"
)]
fn get_employee_doc() {}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = String, Path, description = "Glovo ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, body = Employee),
        (status = 404),
        (status = 409, description = "New Glovo ID already taken")
    ),
    tag = "Employees"
)]
fn update_employee_doc() {}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = String, Path, description = "Glovo ID")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Employees"
)]
fn delete_employee_doc() {}

#[utoipa::path(
    delete,
    path = "/api/employees/all",
    responses((status = 204), (status = 403)),
    tag = "Employees"
)]
fn delete_all_employees_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/export/csv",
    params(EmployeeListQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 404, description = "Nothing to export")
    ),
    tag = "Employees"
)]
fn export_employees_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/bulk-import",
    request_body = BulkImportRequest,
    responses((status = 200, body = BulkImportResponse), (status = 400)),
    tag = "Employees"
)]
fn bulk_import_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/sync-last-order",
    responses((status = 200, body = serde_json::Value)),
    tag = "Employees"
)]
fn sync_last_order_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/penalize",
    params(("id" = String, Path, description = "Glovo ID")),
    request_body = SuspensionPayload,
    responses((status = 200, body = SuspensionResponse), (status = 400), (status = 409)),
    tag = "Suspensions"
)]
fn penalize_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/vacation",
    params(("id" = String, Path, description = "Glovo ID")),
    request_body = SuspensionPayload,
    responses((status = 200, body = SuspensionResponse), (status = 400), (status = 409)),
    tag = "Suspensions"
)]
fn vacation_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/remove-penalization",
    params(("id" = String, Path, description = "Glovo ID")),
    responses((status = 200, body = LiftResponse), (status = 409)),
    tag = "Suspensions"
)]
fn remove_penalization_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/remove-vacation",
    params(("id" = String, Path, description = "Glovo ID")),
    responses((status = 200, body = LiftResponse), (status = 409)),
    tag = "Suspensions"
)]
fn remove_vacation_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/check-expired-penalizations",
    responses((status = 200, body = ExpiredSweepReport)),
    tag = "Suspensions"
)]
fn check_expired_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/check-scheduled-penalizations",
    responses((status = 200, body = ScheduledSweepReport)),
    tag = "Suspensions"
)]
fn check_scheduled_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/penalizations/expiring-soon",
    params(ExpiringQuery),
    responses((status = 200, body = ExpiringResponse)),
    tag = "Suspensions"
)]
fn penalizations_expiring_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/vacations/expiring-soon",
    params(ExpiringQuery),
    responses((status = 200, body = ExpiringResponse)),
    tag = "Suspensions"
)]
fn vacations_expiring_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/it-leave",
    params(("id" = String, Path, description = "Glovo ID")),
    request_body = SetItLeaveRequest,
    responses((status = 200, body = ItLeaveResponse), (status = 409)),
    tag = "Leaves"
)]
fn set_it_leave_doc() {}

#[utoipa::path(
    get,
    path = "/api/it-leaves",
    responses((status = 200, body = [ItLeave])),
    tag = "Leaves"
)]
fn list_it_leaves_doc() {}

#[utoipa::path(
    post,
    path = "/api/it-leaves",
    request_body = CreateItLeaveRequest,
    responses((status = 201, body = ItLeaveResponse), (status = 404), (status = 409)),
    tag = "Leaves"
)]
fn create_it_leave_doc() {}

#[utoipa::path(
    get,
    path = "/api/company-leaves",
    params(CompanyLeaveQuery),
    responses((status = 200, body = PaginatedResponse<CompanyLeave>)),
    tag = "Leaves"
)]
fn list_company_leaves_doc() {}

#[utoipa::path(
    post,
    path = "/api/company-leaves",
    request_body = CreateCompanyLeaveRequest,
    responses(
        (status = 201, body = CreateCompanyLeaveResponse),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee already in the leave workflow")
    ),
    tag = "Leaves"
)]
fn create_company_leave_doc() {}

#[utoipa::path(
    post,
    path = "/api/company-leaves/{id}/change-reason",
    params(("id" = i64, Path, description = "Company leave ID")),
    request_body = ChangeLeaveReasonRequest,
    responses((status = 200, body = CompanyLeave), (status = 404)),
    tag = "Leaves"
)]
fn change_leave_reason_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/reactivate",
    params(("id" = String, Path, description = "Glovo ID")),
    responses((status = 201, body = Employee), (status = 404), (status = 409)),
    tag = "Leaves"
)]
fn reactivate_employee_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/reactivated-from-leaves",
    responses((status = 200, body = [CompanyLeave])),
    tag = "Leaves"
)]
fn reactivated_employees_doc() {}

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationQuery),
    responses((status = 200, body = [Notification])),
    tag = "Notifications"
)]
fn list_notifications_doc() {}

#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = CreateNotificationRequest,
    responses((status = 201, body = Notification)),
    tag = "Notifications"
)]
fn create_notification_doc() {}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/status",
    params(("id" = i64, Path, description = "Notification ID")),
    request_body = UpdateNotificationStatusRequest,
    responses((status = 200, body = Notification), (status = 404)),
    tag = "Notifications"
)]
fn update_notification_status_doc() {}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/process",
    params(("id" = i64, Path, description = "Notification ID")),
    request_body = ProcessNotificationRequest,
    responses(
        (status = 200, body = ProcessNotificationResponse),
        (status = 400, description = "Unknown action"),
        (status = 409, description = "Action not allowed from the current status")
    ),
    tag = "Notifications"
)]
fn process_notification_doc() {}

#[utoipa::path(
    get,
    path = "/api/system-users",
    responses((status = 200, body = [SystemUserResponse])),
    tag = "Admin"
)]
fn list_system_users_doc() {}

#[utoipa::path(
    post,
    path = "/api/system-users",
    request_body = CreateSystemUser,
    responses((status = 201, body = SystemUserResponse), (status = 409)),
    tag = "Admin"
)]
fn create_system_user_doc() {}

#[utoipa::path(
    put,
    path = "/api/system-users/{id}",
    params(("id" = i64, Path, description = "System user ID")),
    request_body = UpdateSystemUser,
    responses((status = 200, body = SystemUserResponse), (status = 404)),
    tag = "Admin"
)]
fn update_system_user_doc() {}

#[utoipa::path(
    delete,
    path = "/api/system-users/{id}",
    params(("id" = i64, Path, description = "System user ID")),
    responses(
        (status = 204),
        (status = 403, description = "Own or protected account"),
        (status = 404)
    ),
    tag = "Admin"
)]
fn delete_system_user_doc() {}

#[utoipa::path(
    put,
    path = "/api/system-users/{id}/password",
    params(("id" = i64, Path, description = "System user ID")),
    request_body = ChangePasswordRequest,
    responses((status = 200, body = serde_json::Value), (status = 404)),
    tag = "Admin"
)]
fn change_system_user_password_doc() {}

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogListQuery),
    responses((status = 200, body = [AuditLog])),
    tag = "Admin"
)]
fn list_audit_logs_doc() {}

#[utoipa::path(
    get,
    path = "/api/audit-logs/stats",
    responses((status = 200, body = AuditLogStats)),
    tag = "Admin"
)]
fn audit_log_stats_doc() {}

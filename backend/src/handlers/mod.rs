pub mod audit_logs;
pub mod auth;
pub mod bulk_import;
pub mod common;
pub mod company_leaves;
pub mod dashboard;
pub mod employees;
pub mod health;
pub mod it_leaves;
pub mod lookups;
pub mod notifications;
pub mod suspensions;
pub mod system_users;

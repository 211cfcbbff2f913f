pub mod audit_log;
pub mod auth;
pub mod logging;
pub mod request_id;

pub use audit_log::AuditContext;
pub use auth::auth;
pub use logging::log_error_responses;
pub use request_id::{request_id, RequestId};

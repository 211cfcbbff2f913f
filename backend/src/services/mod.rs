pub mod audit;
pub mod bulk_import;
pub mod dashboard;
pub mod employee_state;
pub mod leave_workflow;
pub mod suspension;
pub mod sweep;

pub use audit::{AuditEvent, AuditService};

pub mod audit_log;
pub mod company_leave;
pub mod employee;
pub mod it_leave;
pub mod notification;
pub mod system_user;
pub mod transaction;

pub use employee::{EmployeeRepository, EmployeeRepositoryTrait};
pub use transaction::{begin_transaction, commit_transaction};

#[cfg(test)]
pub use employee::MockEmployeeRepositoryTrait;

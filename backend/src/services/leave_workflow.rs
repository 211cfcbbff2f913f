//! Decision table for company-leave notifications.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::error::AppError;
use crate::models::company_leave::CompanyLeaveStatus;
use crate::models::notification::NotificationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Approve,
    Reject,
    PendingLaboral,
    Processed,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 4] = [
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::PendingLaboral,
        WorkflowAction::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::PendingLaboral => "pending_laboral",
            WorkflowAction::Processed => "processed",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "approve" | "approved" => Ok(WorkflowAction::Approve),
            "reject" | "rejected" => Ok(WorkflowAction::Reject),
            "pending_laboral" | "pendiente_laboral" => Ok(WorkflowAction::PendingLaboral),
            "processed" | "process" => Ok(WorkflowAction::Processed),
            other => Err(WorkflowError::UnknownAction(other.to_string())),
        }
    }
}

/// What happens to the employee row on a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeEffect {
    /// Status becomes `company_leave_approved`; hours stay parked.
    MarkApproved,
    /// Status becomes `pending_laboral`; hours stay parked.
    MarkPendingLaboral,
    /// Hours restored and status back to `active`.
    Restore,
    /// Row deleted; the leave snapshot remains as the record.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub notification: NotificationStatus,
    pub leave: CompanyLeaveStatus,
    pub employee: EmployeeEffect,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Unknown action `{0}`. Valid actions: approve, reject, pending_laboral, processed")]
    UnknownAction(String),
    #[error("Cannot apply `{action}` to a notification in status {}", .from.as_str())]
    InvalidTransition {
        from: NotificationStatus,
        action: WorkflowAction,
    },
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::UnknownAction(_) => AppError::BadRequest(err.to_string()),
            WorkflowError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

/// Resolves `(current status, action)` to the resulting states.
pub fn transition(
    from: NotificationStatus,
    action: WorkflowAction,
) -> Result<Transition, WorkflowError> {
    use CompanyLeaveStatus as L;
    use EmployeeEffect as E;
    use NotificationStatus as N;
    use WorkflowAction as A;

    let (notification, leave, employee) = match (from, action) {
        (N::Pending, A::Approve) => (N::Approved, L::Approved, E::MarkApproved),
        (N::Pending, A::Reject) => (N::Rejected, L::Rejected, E::Restore),
        (N::Pending, A::PendingLaboral) => (N::PendingLaboral, L::Pending, E::MarkPendingLaboral),
        (N::PendingLaboral, A::Reject) => (N::Rejected, L::Rejected, E::Restore),
        (N::PendingLaboral, A::Processed) => (N::Processed, L::Approved, E::Remove),
        (N::Approved, A::Processed) => (N::Processed, L::Approved, E::Remove),
        _ => return Err(WorkflowError::InvalidTransition { from, action }),
    };
    Ok(Transition {
        notification,
        leave,
        employee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [NotificationStatus; 5] = [
        NotificationStatus::Pending,
        NotificationStatus::Approved,
        NotificationStatus::Rejected,
        NotificationStatus::Processed,
        NotificationStatus::PendingLaboral,
    ];

    #[test]
    fn allowed_transitions_match_table() {
        let cases = [
            (
                NotificationStatus::Pending,
                WorkflowAction::Approve,
                NotificationStatus::Approved,
                CompanyLeaveStatus::Approved,
                EmployeeEffect::MarkApproved,
            ),
            (
                NotificationStatus::Pending,
                WorkflowAction::Reject,
                NotificationStatus::Rejected,
                CompanyLeaveStatus::Rejected,
                EmployeeEffect::Restore,
            ),
            (
                NotificationStatus::Pending,
                WorkflowAction::PendingLaboral,
                NotificationStatus::PendingLaboral,
                CompanyLeaveStatus::Pending,
                EmployeeEffect::MarkPendingLaboral,
            ),
            (
                NotificationStatus::PendingLaboral,
                WorkflowAction::Reject,
                NotificationStatus::Rejected,
                CompanyLeaveStatus::Rejected,
                EmployeeEffect::Restore,
            ),
            (
                NotificationStatus::PendingLaboral,
                WorkflowAction::Processed,
                NotificationStatus::Processed,
                CompanyLeaveStatus::Approved,
                EmployeeEffect::Remove,
            ),
            (
                NotificationStatus::Approved,
                WorkflowAction::Processed,
                NotificationStatus::Processed,
                CompanyLeaveStatus::Approved,
                EmployeeEffect::Remove,
            ),
        ];

        for (from, action, notification, leave, employee) in cases {
            assert_eq!(
                transition(from, action),
                Ok(Transition {
                    notification,
                    leave,
                    employee
                }),
                "{:?} + {:?}",
                from,
                action
            );
        }
    }

    #[test]
    fn every_other_pair_is_rejected() {
        let allowed = [
            (NotificationStatus::Pending, WorkflowAction::Approve),
            (NotificationStatus::Pending, WorkflowAction::Reject),
            (NotificationStatus::Pending, WorkflowAction::PendingLaboral),
            (NotificationStatus::PendingLaboral, WorkflowAction::Reject),
            (NotificationStatus::PendingLaboral, WorkflowAction::Processed),
            (NotificationStatus::Approved, WorkflowAction::Processed),
        ];
        let mut rejected = 0;
        for from in ALL_STATUSES {
            for action in WorkflowAction::ALL {
                if allowed.contains(&(from, action)) {
                    continue;
                }
                assert_eq!(
                    transition(from, action),
                    Err(WorkflowError::InvalidTransition { from, action })
                );
                rejected += 1;
            }
        }
        assert_eq!(rejected, 14);
    }

    #[test]
    fn unknown_action_is_bad_request() {
        let err = "archive".parse::<WorkflowAction>().unwrap_err();
        assert_eq!(err, WorkflowError::UnknownAction("archive".into()));
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let err = transition(NotificationStatus::Rejected, WorkflowAction::Approve).unwrap_err();
        assert!(err.to_string().contains("rejected"));
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }
}

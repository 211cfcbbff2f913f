use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::middleware::audit_log::AuditContext;
use crate::repositories::audit_log::{self as audit_log_repo, NewAuditLog};

/// Actor name used for entries written by scheduled jobs.
pub const SYSTEM_ACTOR: &str = "system";

/// One action to append to the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub description: String,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn entity(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.entity_id = Some(id.into());
        self.entity_name = name;
        self
    }

    pub fn old_data<T: Serialize>(mut self, data: &T) -> Self {
        self.old_data = serde_json::to_value(data).ok();
        self
    }

    pub fn new_data<T: Serialize>(mut self, data: &T) -> Self {
        self.new_data = serde_json::to_value(data).ok();
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends the event. A failed insert is logged and swallowed.
    pub async fn log_action(&self, context: &AuditContext, event: AuditEvent) {
        let entry = NewAuditLog {
            user_id: context.user_id.clone(),
            user_role: context.user_role.clone(),
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            entity_name: event.entity_name,
            description: event.description,
            old_data: event.old_data,
            new_data: event.new_data,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            request_id: context.request_id.clone(),
        };

        if let Err(err) = audit_log_repo::insert_audit_log(&self.pool, &entry).await {
            tracing::warn!(
                error = %err,
                action = %entry.action,
                entity_type = %entry.entity_type,
                user_id = %entry.user_id,
                "Failed to record audit log entry"
            );
        }
    }
}

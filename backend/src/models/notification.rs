use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Item waiting for (or recording) an administrator decision.
pub struct Notification {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub requested_by: String,
    pub status: NotificationStatus,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Json<Value>>,
    pub processing_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn metadata_value(&self) -> Option<&Value> {
        self.metadata.as_ref().map(|m| &m.0)
    }

    /// Company leave referenced by a `company_leave_request` notification.
    pub fn company_leave_id(&self) -> Option<i64> {
        self.metadata_value()?
            .get("company_leave_id")
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
    }

    pub fn employee_id(&self) -> Option<String> {
        self.metadata_value()?
            .get("employee_id")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn metadata_original_hours(&self) -> Option<i32> {
        self.metadata_value()?
            .get("original_hours")
            .and_then(Value::as_i64)
            .map(|h| h as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    CompanyLeaveRequest,
    ItLeaveRequest,
    EmployeeUpdate,
    BulkUpload,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::CompanyLeaveRequest => "company_leave_request",
            NotificationType::ItLeaveRequest => "it_leave_request",
            NotificationType::EmployeeUpdate => "employee_update",
            NotificationType::BulkUpload => "bulk_upload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
    PendingLaboral,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Approved => "approved",
            NotificationStatus::Rejected => "rejected",
            NotificationStatus::Processed => "processed",
            NotificationStatus::PendingLaboral => "pending_laboral",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(NotificationStatus::Pending),
            "approved" => Ok(NotificationStatus::Approved),
            "rejected" => Ok(NotificationStatus::Rejected),
            "processed" => Ok(NotificationStatus::Processed),
            "pending_laboral" => Ok(NotificationStatus::PendingLaboral),
            other => Err(format!("unknown notification status `{}`", other)),
        }
    }
}

/// Insert payload shared by handlers and workflow code.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub requested_by: String,
    pub status: NotificationStatus,
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotificationStatusRequest {
    pub status: NotificationStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessNotificationRequest {
    /// One of `approve`, `reject`, `pending_laboral`, `processed`.
    pub action: String,
    pub processing_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(metadata: Option<Value>) -> Notification {
        let now = Utc::now();
        Notification {
            id: 7,
            notification_type: NotificationType::CompanyLeaveRequest,
            title: "Company leave - Dismissal".into(),
            message: "pending".into(),
            requested_by: "admin@fleet.test".into(),
            status: NotificationStatus::Pending,
            metadata: metadata.map(Json),
            processing_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn metadata_accessors_read_ids_and_hours() {
        let n = notification(Some(json!({
            "company_leave_id": 12,
            "employee_id": "G-1",
            "original_hours": 30
        })));
        assert_eq!(n.company_leave_id(), Some(12));
        assert_eq!(n.employee_id().as_deref(), Some("G-1"));
        assert_eq!(n.metadata_original_hours(), Some(30));
    }

    #[test]
    fn company_leave_id_accepts_string_values() {
        let n = notification(Some(json!({ "company_leave_id": "44" })));
        assert_eq!(n.company_leave_id(), Some(44));
        assert_eq!(notification(None).company_leave_id(), None);
    }

    #[test]
    fn type_field_serializes_as_type() {
        let value = serde_json::to_value(notification(None)).unwrap();
        assert_eq!(value["type"], "company_leave_request");
        assert_eq!(value["status"], "pending");
    }
}

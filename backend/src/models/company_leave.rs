use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::notification::Notification;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// HR-initiated departure of an employee, pending approval until processed.
pub struct CompanyLeave {
    pub id: i64,
    pub employee_id: String,
    /// Employee row as it looked when the leave was requested.
    #[schema(value_type = Object)]
    pub employee_data: Json<Value>,
    pub leave_type: CompanyLeaveType,
    pub leave_date: NaiveDate,
    pub comments: Option<String>,
    pub leave_requested_by: String,
    pub leave_requested_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub status: CompanyLeaveStatus,
    pub reactivated_at: Option<DateTime<Utc>>,
    pub reactivated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyLeave {
    /// Hours the employee had before the leave parked them.
    pub fn snapshot_hours(&self) -> Option<i32> {
        let data = &self.employee_data.0;
        data.get("original_hours")
            .and_then(Value::as_i64)
            .or_else(|| data.get("hours").and_then(Value::as_i64))
            .map(|h| h as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyLeaveType {
    Dismissal,
    Voluntary,
    Nspp,
    Annulment,
    TemporaryContractEnd,
    ItExhaustion,
    OtherCauses,
}

impl CompanyLeaveType {
    pub const ALL: [CompanyLeaveType; 7] = [
        CompanyLeaveType::Dismissal,
        CompanyLeaveType::Voluntary,
        CompanyLeaveType::Nspp,
        CompanyLeaveType::Annulment,
        CompanyLeaveType::TemporaryContractEnd,
        CompanyLeaveType::ItExhaustion,
        CompanyLeaveType::OtherCauses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyLeaveType::Dismissal => "dismissal",
            CompanyLeaveType::Voluntary => "voluntary",
            CompanyLeaveType::Nspp => "nspp",
            CompanyLeaveType::Annulment => "annulment",
            CompanyLeaveType::TemporaryContractEnd => "temporary_contract_end",
            CompanyLeaveType::ItExhaustion => "it_exhaustion",
            CompanyLeaveType::OtherCauses => "other_causes",
        }
    }

    pub fn requires_comment(&self) -> bool {
        matches!(self, CompanyLeaveType::OtherCauses)
    }

    /// Human label used in notification titles and audit descriptions.
    pub fn label(&self, comments: Option<&str>) -> String {
        let reason = match self {
            CompanyLeaveType::Dismissal => "Dismissal",
            CompanyLeaveType::Voluntary => "Voluntary resignation",
            CompanyLeaveType::Nspp => "NSPP",
            CompanyLeaveType::Annulment => "Annulment",
            CompanyLeaveType::TemporaryContractEnd => "End of temporary contract",
            CompanyLeaveType::ItExhaustion => "IT exhaustion",
            CompanyLeaveType::OtherCauses => {
                let detail = comments
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or("Not specified");
                return format!("Company leave - Other causes: {}", detail);
            }
        };
        format!("Company leave - {}", reason)
    }

    fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(CompanyLeaveType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for CompanyLeaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dismissal" | "despido" => Ok(CompanyLeaveType::Dismissal),
            "voluntary" | "voluntaria" => Ok(CompanyLeaveType::Voluntary),
            "nspp" => Ok(CompanyLeaveType::Nspp),
            "annulment" | "anulacion" => Ok(CompanyLeaveType::Annulment),
            "temporary_contract_end" | "fin_contrato_temporal" => {
                Ok(CompanyLeaveType::TemporaryContractEnd)
            }
            "it_exhaustion" | "agotamiento_it" => Ok(CompanyLeaveType::ItExhaustion),
            "other_causes" | "otras_causas" => Ok(CompanyLeaveType::OtherCauses),
            other => Err(format!(
                "Invalid leave type `{}`. Valid types: {}",
                other,
                Self::valid_values()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyLeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl CompanyLeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyLeaveStatus::Pending => "pending",
            CompanyLeaveStatus::Approved => "approved",
            CompanyLeaveStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for CompanyLeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(CompanyLeaveStatus::Pending),
            "approved" => Ok(CompanyLeaveStatus::Approved),
            "rejected" => Ok(CompanyLeaveStatus::Rejected),
            other => Err(format!("unknown company leave status `{}`", other)),
        }
    }
}

/// Parses the leave type and enforces the comment rule for `other_causes`.
pub fn parse_leave_reason(
    raw_type: &str,
    comments: Option<&str>,
) -> Result<CompanyLeaveType, String> {
    let leave_type: CompanyLeaveType = raw_type.parse()?;
    let has_comment = comments.map(|c| !c.trim().is_empty()).unwrap_or(false);
    if leave_type.requires_comment() && !has_comment {
        return Err("Comments are required when the leave type is other_causes".to_string());
    }
    Ok(leave_type)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyLeaveRequest {
    #[validate(length(min = 1))]
    pub employee_id: String,
    pub leave_type: String,
    pub leave_date: NaiveDate,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeLeaveReasonRequest {
    pub new_reason: String,
    pub comments: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCompanyLeaveResponse {
    pub leave: CompanyLeave,
    pub notification: Notification,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CompanyLeaveQuery {
    pub status: Option<String>,
    pub leave_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Record of a company-leave reason being changed after the fact.
pub struct EmployeeLeaveHistory {
    pub id: i64,
    pub employee_id: String,
    pub leave_type: String,
    pub previous_reason: String,
    pub new_reason: String,
    pub comments: Option<String>,
    pub changed_by: String,
    pub changed_by_role: String,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Medical leave (incapacidad temporal) of an employee.
pub struct ItLeave {
    pub id: i64,
    pub employee_id: String,
    #[schema(value_type = Object)]
    pub employee_data: Json<Value>,
    pub leave_type: ItLeaveType,
    pub leave_date: NaiveDate,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_by: Option<String>,
    pub status: ItLeaveStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItLeaveType {
    #[serde(alias = "enfermedad")]
    Illness,
    #[serde(alias = "accidente")]
    Accident,
}

impl ItLeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItLeaveType::Illness => "illness",
            ItLeaveType::Accident => "accident",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItLeaveStatus {
    Active,
    Ended,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetItLeaveRequest {
    pub leave_type: ItLeaveType,
    /// Defaults to today in the configured time zone.
    pub leave_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItLeaveRequest {
    #[validate(length(min = 1))]
    pub employee_id: String,
    pub leave_type: ItLeaveType,
    pub leave_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_type_accepts_spanish_aliases() {
        let t: ItLeaveType = serde_json::from_str("\"enfermedad\"").unwrap();
        assert_eq!(t, ItLeaveType::Illness);
        let t: ItLeaveType = serde_json::from_str("\"accident\"").unwrap();
        assert_eq!(t, ItLeaveType::Accident);
        assert_eq!(
            serde_json::to_value(ItLeaveType::Accident).unwrap(),
            serde_json::json!("accident")
        );
    }
}

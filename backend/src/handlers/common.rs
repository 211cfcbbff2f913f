use chrono::{DateTime, NaiveDate, NaiveDateTime};
use validator::ValidationError;

use crate::error::AppError;
use crate::models::system_user::SystemUser;

/// Admins and super admins may change data; normal accounts only read.
pub fn ensure_can_manage(user: &SystemUser) -> Result<(), AppError> {
    if user.can_manage() {
        Ok(())
    } else {
        Err(AppError::forbidden("Insufficient permissions"))
    }
}

pub fn ensure_super_admin(user: &SystemUser) -> Result<(), AppError> {
    if user.is_super_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only super admins can perform this action"))
    }
}

pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_optional_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_date_value(value).map(Some).ok_or_else(|| {
            AppError::bad_request(format!(
                "`{}` must be a valid date (YYYY-MM-DD or RFC3339)",
                field
            ))
        }),
        None => Ok(None),
    }
}

/// Turns a single rule failure into a 400 naming the field.
pub fn rule_error(field: &str, err: ValidationError) -> AppError {
    AppError::Validation(vec![format!("{}: {}", field, err.code)])
}

/// Empty strings and `all` mean "no filter".
pub fn non_empty_filter(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::models::system_user::{Role, SystemUser};

    pub fn user_with_role(role: Role) -> SystemUser {
        let now = Utc::now();
        SystemUser {
            id: 1,
            email: format!("{}@fleet.test", role.as_str()),
            first_name: "Test".into(),
            last_name: "User".into(),
            password_hash: String::new(),
            role,
            assigned_city: None,
            is_active: true,
            last_login: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::user_with_role;
    use super::*;
    use crate::models::system_user::Role;

    #[test]
    fn manage_gate_rejects_normal_users() {
        assert!(ensure_can_manage(&user_with_role(Role::Admin)).is_ok());
        assert!(ensure_can_manage(&user_with_role(Role::SuperAdmin)).is_ok());
        let err = ensure_can_manage(&user_with_role(Role::Normal)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn super_admin_gate_rejects_admins() {
        assert!(ensure_super_admin(&user_with_role(Role::SuperAdmin)).is_ok());
        assert!(matches!(
            ensure_super_admin(&user_with_role(Role::Admin)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn parse_date_value_supports_rfc3339_sql_and_plain_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date");
        assert_eq!(parse_date_value("2025-03-04T09:10:11+01:00"), Some(expected));
        assert_eq!(parse_date_value("2025-03-04 09:10:11"), Some(expected));
        assert_eq!(parse_date_value("2025-03-04"), Some(expected));
        assert!(parse_date_value("04/03/2025").is_none());
    }

    #[test]
    fn parse_optional_date_names_the_field() {
        assert!(parse_optional_date(None, "start_date").unwrap().is_none());
        assert!(parse_optional_date(Some(""), "start_date").unwrap().is_none());
        let err = parse_optional_date(Some("yesterday"), "end_date").unwrap_err();
        assert!(err.to_string().contains("end_date"));
    }

    #[test]
    fn all_and_blank_filters_are_dropped() {
        assert_eq!(non_empty_filter(Some(" all ".into())), None);
        assert_eq!(non_empty_filter(Some("".into())), None);
        assert_eq!(non_empty_filter(Some("MAD".into())), Some("MAD".into()));
    }
}

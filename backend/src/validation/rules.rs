//! Common validation rules shared across request payloads.

use chrono::NaiveDate;
use validator::ValidationError;

/// Validates a platform identifier.
///
/// Requirements:
/// - 1-64 characters after trimming
/// - No whitespace inside the id
pub fn validate_glovo_id(id: &str) -> Result<(), ValidationError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ValidationError::new("glovo_id_invalid_length"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("glovo_id_invalid_characters"));
    }
    Ok(())
}

pub fn validate_password(password: &str, min_length: usize) -> Result<(), ValidationError> {
    if password.chars().count() < min_length {
        return Err(ValidationError::new("password_too_short"));
    }
    Ok(())
}

/// `start` must not be after `end`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::new("start_date_after_end_date"));
    }
    Ok(())
}

/// Window for the expiring-soon listings.
pub fn validate_lookahead_days(days: i64) -> Result<(), ValidationError> {
    if !(1..=365).contains(&days) {
        return Err(ValidationError::new("days_out_of_range"));
    }
    Ok(())
}

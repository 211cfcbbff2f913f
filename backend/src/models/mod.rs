//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Resolves `page`/`per_page` query values into a clamped pair.
pub fn paginate(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

/// Wrapper for paginated API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    /// The data items for the current page.
    pub data: Vec<T>,
    /// Total number of records matching the query.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        Self {
            data,
            total,
            page,
            per_page,
        }
    }
}

pub mod audit_log;
pub mod company_leave;
pub mod employee;
pub mod it_leave;
pub mod notification;
pub mod system_user;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_clamps_values() {
        assert_eq!(paginate(None, None), (1, 20));
        assert_eq!(paginate(Some(0), Some(500)), (1, 100));
        assert_eq!(paginate(Some(3), Some(0)), (3, 1));
    }
}

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::employee::EmployeeStatus;
use crate::repositories::employee::{CityCount, EmployeeRepositoryTrait};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CityMetric {
    pub city: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardMetrics {
    pub total_employees: i64,
    pub active_employees: i64,
    pub it_leave: i64,
    pub penalized: i64,
    pub vacation: i64,
    pub pending_activation: i64,
    pub company_leave_pending: i64,
    pub company_leave_approved: i64,
    pub pending_laboral: i64,
    pub employees_by_city: Vec<CityMetric>,
    /// Notifications waiting for a decision. Always 0 for non super admins.
    pub pending_actions: i64,
}

pub async fn build_metrics(
    repo: &dyn EmployeeRepositoryTrait,
    pool: &PgPool,
    city_scope: Option<String>,
    pending_actions: i64,
) -> Result<DashboardMetrics, AppError> {
    let by_status = repo.count_by_status(pool, city_scope.clone()).await?;
    let by_city = repo.count_by_city(pool, city_scope).await?;

    let mut metrics = DashboardMetrics {
        pending_actions,
        employees_by_city: by_city
            .into_iter()
            .map(|CityCount { city, count }| CityMetric { city, count })
            .collect(),
        ..Default::default()
    };

    for row in by_status {
        metrics.total_employees += row.count;
        let Ok(status) = row.status.parse::<EmployeeStatus>() else {
            tracing::warn!(status = %row.status, "Unknown employee status in dashboard counts");
            continue;
        };
        let slot = match status {
            EmployeeStatus::Active => &mut metrics.active_employees,
            EmployeeStatus::ItLeave => &mut metrics.it_leave,
            EmployeeStatus::Penalized => &mut metrics.penalized,
            EmployeeStatus::Vacation => &mut metrics.vacation,
            EmployeeStatus::PendingActivation => &mut metrics.pending_activation,
            EmployeeStatus::CompanyLeavePending => &mut metrics.company_leave_pending,
            EmployeeStatus::CompanyLeaveApproved => &mut metrics.company_leave_approved,
            EmployeeStatus::PendingLaboral => &mut metrics.pending_laboral,
        };
        *slot += row.count;
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::employee::StatusCount;
    use crate::repositories::MockEmployeeRepositoryTrait;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn metrics_fold_status_counts_and_cities() {
        let mut repo = MockEmployeeRepositoryTrait::new();
        repo.expect_count_by_status()
            .withf(|_, scope| scope.as_deref() == Some("Madrid"))
            .returning(|_, _| {
                Ok(vec![
                    StatusCount {
                        status: "active".into(),
                        count: 7,
                    },
                    StatusCount {
                        status: "it_leave".into(),
                        count: 2,
                    },
                    StatusCount {
                        status: "penalized".into(),
                        count: 1,
                    },
                ])
            });
        repo.expect_count_by_city().returning(|_, _| {
            Ok(vec![CityCount {
                city: "Madrid".into(),
                count: 10,
            }])
        });

        let metrics = build_metrics(&repo, &lazy_pool(), Some("Madrid".into()), 0)
            .await
            .expect("metrics");

        assert_eq!(metrics.total_employees, 10);
        assert_eq!(metrics.active_employees, 7);
        assert_eq!(metrics.it_leave, 2);
        assert_eq!(metrics.penalized, 1);
        assert_eq!(metrics.vacation, 0);
        assert_eq!(metrics.pending_actions, 0);
        assert_eq!(
            metrics.employees_by_city,
            vec![CityMetric {
                city: "Madrid".into(),
                count: 10
            }]
        );
    }

    #[tokio::test]
    async fn unknown_status_still_counts_towards_total() {
        let mut repo = MockEmployeeRepositoryTrait::new();
        repo.expect_count_by_status().returning(|_, _| {
            Ok(vec![StatusCount {
                status: "archived".into(),
                count: 3,
            }])
        });
        repo.expect_count_by_city().returning(|_, _| Ok(vec![]));

        let metrics = build_metrics(&repo, &lazy_pool(), None, 4)
            .await
            .expect("metrics");
        assert_eq!(metrics.total_employees, 3);
        assert_eq!(metrics.active_employees, 0);
        assert_eq!(metrics.pending_actions, 4);
    }
}

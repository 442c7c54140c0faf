//! Port for the year-end data reset.

use async_trait::async_trait;
use serde::Serialize;

use super::define_port_error;

define_port_error! {
    /// Errors raised by maintenance adapters.
    pub enum MaintenanceRepositoryError {}
}

/// Rows removed by a year-end reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearEndSummary {
    pub work_logs: u64,
    pub assignments: u64,
    pub preferences: u64,
}

/// Bulk maintenance port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Delete all work logs, assignments (with their slots) and preferences
    /// in one transaction. Members, tasks and schedules are kept.
    async fn reset_year_end(&self) -> Result<YearEndSummary, MaintenanceRepositoryError>;
}

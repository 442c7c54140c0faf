//! PostgreSQL-backed year-end maintenance.

use async_trait::async_trait;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;

use crate::domain::ports::{MaintenanceRepository, MaintenanceRepositoryError, YearEndSummary};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::{assignments, preferences, work_logs};

/// Diesel-backed implementation of the maintenance port.
#[derive(Clone)]
pub struct DieselMaintenanceRepository {
    pool: DbPool,
}

impl DieselMaintenanceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MaintenanceRepositoryError {
    map_basic_pool_error(error, MaintenanceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MaintenanceRepositoryError {
    map_basic_diesel_error(
        error,
        MaintenanceRepositoryError::query,
        MaintenanceRepositoryError::connection,
    )
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl MaintenanceRepository for DieselMaintenanceRepository {
    /// Clear the season's work logs, assignments (with their slots) and
    /// preferences. Members, tasks and schedules stay.
    async fn reset_year_end(&self) -> Result<YearEndSummary, MaintenanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let summary = conn
            .transaction(|conn| {
                async move {
                    let work_logs = diesel::delete(work_logs::table).execute(conn).await?;
                    let assignments = diesel::delete(assignments::table).execute(conn).await?;
                    let preferences = diesel::delete(preferences::table).execute(conn).await?;
                    Ok::<_, diesel::result::Error>(YearEndSummary {
                        work_logs: affected(work_logs),
                        assignments: affected(assignments),
                        preferences: affected(preferences),
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        info!(
            work_logs = summary.work_logs,
            assignments = summary.assignments,
            preferences = summary.preferences,
            "season data cleared"
        );
        Ok(summary)
    }
}

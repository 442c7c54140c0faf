//! Year-end cleanup.

use tracing::{info, warn};

use super::BatchJobs;
use crate::domain::port_errors::map_maintenance_error;
use crate::domain::ports::YearEndSummary;
use crate::domain::Error;

impl BatchJobs {
    /// Delete all work logs, assignments and preferences in one transaction.
    ///
    /// Refuses to run unless `force` is set.
    pub async fn reset_year_end(&self, force: bool) -> Result<YearEndSummary, Error> {
        if !force {
            warn!("year-end reset requested without force");
            return Err(Error::invalid_request(
                "year-end reset deletes all work logs, assignments and preferences; pass --force",
            ));
        }
        let summary = self
            .ports
            .maintenance
            .reset_year_end()
            .await
            .map_err(map_maintenance_error)?;
        info!(
            work_logs = summary.work_logs,
            assignments = summary.assignments,
            preferences = summary.preferences,
            "year-end reset done"
        );
        Ok(summary)
    }
}

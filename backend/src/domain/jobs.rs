//! Batch jobs run by the `arbeitsplan-jobs` binary.
//!
//! Each job reads the store, enqueues mail and returns a serialisable report
//! that the binary prints. None of them hold locks between steps.

mod consistency;
mod notifier;
mod quota_reset;
mod reminders;
mod statistics;
mod year_end;

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;

use super::ports::DomainPorts;
use super::port_errors::map_member_error;
use super::{CODED_QUOTA_THRESHOLD, DEFAULT_QUOTA, Error, Hours, MemberId};

pub use consistency::ConsistencyReport;
pub use notifier::NotificationRun;
pub use quota_reset::{QuotaChange, QuotaResetReport};
pub use reminders::{PendingWorkLogReport, UpcomingTaskReport};
pub use statistics::TaskStatistics;

/// Tunables shared by the jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSettings {
    pub default_quota: Hours,
    pub coded_quota_threshold: Hours,
    /// Age after which unreviewed work logs are reminded.
    pub pending_reminder_days: u32,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            default_quota: DEFAULT_QUOTA,
            coded_quota_threshold: CODED_QUOTA_THRESHOLD,
            pending_reminder_days: 7,
        }
    }
}

/// Entry point for all batch jobs.
#[derive(Clone)]
pub struct BatchJobs {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
    settings: JobSettings,
}

impl BatchJobs {
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>, settings: JobSettings) -> Self {
        Self {
            ports,
            clock,
            settings,
        }
    }

    async fn board_ids(&self) -> Result<Vec<MemberId>, Error> {
        Ok(self
            .ports
            .members
            .list_board()
            .await
            .map_err(map_member_error)?
            .into_iter()
            .map(|member| member.id)
            .collect())
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;

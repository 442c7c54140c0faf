//! Port for work log ("Leistung") persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Hours, MemberId, OutgoingMail, TaskId, WorkLog, WorkLogId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by work log repository adapters.
    pub enum WorkLogRepositoryError {
        /// The member or task of the work log does not exist.
        MissingReference { message: String } =>
            "work log references a missing record: {message}",
        /// The work log was deleted before the write landed.
        Vanished { work_log_id: String } => "work log {work_log_id} no longer exists",
    }
}

/// Accepted work per task, for the yearly statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedWorkTotal {
    pub task_id: TaskId,
    pub hours: Hours,
    pub members: u32,
}

/// Work log persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkLogRepository: Send + Sync {
    /// Persist a new work log.
    async fn insert(&self, log: &WorkLog) -> Result<(), WorkLogRepositoryError>;

    /// Find a work log by id.
    async fn find_by_id(&self, id: &WorkLogId) -> Result<Option<WorkLog>, WorkLogRepositoryError>;

    /// Overwrite a work log unless its stored status is accepted or rejected.
    ///
    /// The status check and the write are one statement; `false` means the
    /// log is missing or already final.
    async fn update_open(&self, log: &WorkLog) -> Result<bool, WorkLogRepositoryError>;

    /// Delete a work log unless it is accepted or rejected. `false` means
    /// nothing was deleted.
    async fn delete_open(&self, id: &WorkLogId) -> Result<bool, WorkLogRepositoryError>;

    /// Store a board decision and queue the member's notice atomically.
    async fn record_review(
        &self,
        log: &WorkLog,
        notice: &OutgoingMail,
    ) -> Result<(), WorkLogRepositoryError>;

    /// All work logs of a member, newest first.
    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError>;

    /// Work logs booked on the given tasks, newest first.
    async fn list_for_tasks(&self, tasks: &[TaskId])
    -> Result<Vec<WorkLog>, WorkLogRepositoryError>;

    /// Logs created at or before `cutoff` that are neither accepted nor
    /// rejected.
    async fn list_unreviewed_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError>;

    /// Accepted hours and distinct members per task.
    async fn accepted_totals(&self) -> Result<Vec<AcceptedWorkTotal>, WorkLogRepositoryError>;
}

//! Submission and review of work logs ("Leistungen").

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::ports::DomainPorts;
use super::port_errors::{map_task_error, map_work_log_error};
use super::{
    Actor, Error, Hours, MailTemplate, MemberId, OutgoingMail, Task, TaskId, WorkLog, WorkLogId,
    WorkLogStatus, WorkLogValidationError, validate_work_hours,
};

impl From<WorkLogValidationError> for Error {
    fn from(err: WorkLogValidationError) -> Self {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "hours" }))
    }
}

/// Member-editable fields of a work log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogDraft {
    pub task_id: TaskId,
    pub worked_on: NaiveDate,
    pub hours: Hours,
    #[serde(default)]
    pub remark: String,
}

/// Board decision on a work log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogReview {
    pub status: WorkLogStatus,
    #[serde(default)]
    pub board_remark: String,
}

/// Work log use cases.
#[derive(Clone)]
pub struct WorkLogService {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
}

impl WorkLogService {
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Record work for the acting member. New logs start out open.
    pub async fn submit(&self, actor: &Actor, draft: WorkLogDraft) -> Result<WorkLog, Error> {
        validate_work_hours(draft.hours)?;
        self.load_task(draft.task_id).await?;
        let now = self.clock.utc();
        let log = WorkLog {
            id: WorkLogId::random(),
            member_id: actor.member_id,
            task_id: draft.task_id,
            worked_on: draft.worked_on,
            hours: draft.hours,
            status: WorkLogStatus::Open,
            remark: draft.remark,
            board_remark: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.ports
            .work_logs
            .insert(&log)
            .await
            .map_err(map_work_log_error)?;
        info!(work_log_id = %log.id, member_id = %log.member_id, hours = %log.hours, "work logged");
        Ok(log)
    }

    /// Edit an own log that has not been accepted or rejected yet.
    ///
    /// Editing answers an inquiry, so the log returns to open.
    pub async fn update_own(
        &self,
        actor: &Actor,
        id: WorkLogId,
        draft: WorkLogDraft,
    ) -> Result<WorkLog, Error> {
        let mut log = self.load_own_mutable(actor, id).await?;
        validate_work_hours(draft.hours)?;
        if draft.task_id != log.task_id {
            self.load_task(draft.task_id).await?;
        }
        log.task_id = draft.task_id;
        log.worked_on = draft.worked_on;
        log.hours = draft.hours;
        log.remark = draft.remark;
        log.status = WorkLogStatus::Open;
        log.updated_at = self.clock.utc();
        let written = self
            .ports
            .work_logs
            .update_open(&log)
            .await
            .map_err(map_work_log_error)?;
        if !written {
            return Err(self.explain_refused_write(actor, id).await);
        }
        Ok(log)
    }

    /// Delete an own log that has not been accepted or rejected yet.
    pub async fn delete_own(&self, actor: &Actor, id: WorkLogId) -> Result<(), Error> {
        self.load_own_mutable(actor, id).await?;
        let deleted = self
            .ports
            .work_logs
            .delete_open(&id)
            .await
            .map_err(map_work_log_error)?;
        if !deleted {
            return Err(self.explain_refused_write(actor, id).await);
        }
        info!(work_log_id = %id, "work log deleted");
        Ok(())
    }

    /// Set status and board remark.
    ///
    /// Board members review every log, team leads the logs of their tasks.
    /// The member is notified when anything changed.
    pub async fn review(
        &self,
        actor: &Actor,
        id: WorkLogId,
        review: WorkLogReview,
    ) -> Result<WorkLog, Error> {
        let mut log = self.load(id).await?;
        let task = self.load_task(log.task_id).await?;
        if !task.reviewable_by(actor.member_id, actor.board) {
            return Err(Error::forbidden("only the board or the team lead may review")
                .with_details(json!({ "taskId": task.id })));
        }
        if log.status == review.status && log.board_remark == review.board_remark {
            return Ok(log);
        }

        log.status = review.status;
        log.board_remark = review.board_remark;
        log.updated_at = self.clock.utc();
        self.ports
            .work_logs
            .record_review(&log, &self.review_notice(&log, &task))
            .await
            .map_err(map_work_log_error)?;
        info!(work_log_id = %id, status = log.status.code(), "work log reviewed");
        Ok(log)
    }

    pub async fn list_for_member(&self, member: MemberId) -> Result<Vec<WorkLog>, Error> {
        self.ports
            .work_logs
            .list_for_member(&member)
            .await
            .map_err(map_work_log_error)
    }

    /// Logs the actor may review.
    pub async fn list_reviewable(&self, actor: &Actor) -> Result<Vec<WorkLog>, Error> {
        let tasks: Vec<TaskId> = self
            .ports
            .tasks
            .list()
            .await
            .map_err(map_task_error)?
            .into_iter()
            .filter(|task| task.reviewable_by(actor.member_id, actor.board))
            .map(|task| task.id)
            .collect();
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        self.ports
            .work_logs
            .list_for_tasks(&tasks)
            .await
            .map_err(map_work_log_error)
    }

    async fn load(&self, id: WorkLogId) -> Result<WorkLog, Error> {
        self.ports
            .work_logs
            .find_by_id(&id)
            .await
            .map_err(map_work_log_error)?
            .ok_or_else(|| {
                Error::not_found(format!("work log {id} not found"))
                    .with_details(json!({ "workLogId": id }))
            })
    }

    async fn load_own_mutable(&self, actor: &Actor, id: WorkLogId) -> Result<WorkLog, Error> {
        let log = self.load(id).await?;
        if log.member_id != actor.member_id {
            return Err(Error::forbidden("work logs can only be changed by their member"));
        }
        if log.status.is_terminal() {
            return Err(Error::invalid_request(format!(
                "work log is {} and can no longer be changed",
                log.status.label()
            ))
            .with_details(json!({ "workLogId": id, "status": log.status })));
        }
        Ok(log)
    }

    /// The store refused a member-side write: the log was reviewed or
    /// deleted after it was loaded. Report it the way a fresh load would.
    async fn explain_refused_write(&self, actor: &Actor, id: WorkLogId) -> Error {
        match self.load_own_mutable(actor, id).await {
            Err(err) => err,
            Ok(_) => Error::internal(format!("work log {id} could not be written")),
        }
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, Error> {
        self.ports
            .tasks
            .find_by_id(&id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| {
                Error::invalid_request(format!("task {id} does not exist"))
                    .with_details(json!({ "field": "taskId", "taskId": id }))
            })
    }

    fn review_notice(&self, log: &WorkLog, task: &Task) -> OutgoingMail {
        let context = json!({
            "workLog": {
                "id": log.id,
                "workedOn": log.worked_on,
                "hours": log.hours,
                "status": log.status.label(),
                "boardRemark": log.board_remark,
            },
            "task": { "id": task.id, "name": task.name },
        });
        OutgoingMail::to(
            log.member_id,
            MailTemplate::WorkLogReviewed,
            context,
            self.clock.utc(),
        )
    }
}

#[cfg(test)]
#[path = "work_log_service_tests.rs"]
mod tests;

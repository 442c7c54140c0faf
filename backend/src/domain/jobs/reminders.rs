//! Reminder mails for upcoming tasks and unreviewed work logs.

use std::collections::BTreeMap;

use chrono::{Days, TimeDelta};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::BatchJobs;
use crate::domain::port_errors::{
    map_assignment_error, map_mail_error, map_member_error, map_task_error, map_work_log_error,
};
use crate::domain::{
    AssignmentDetail, Error, MailTemplate, MemberId, OutgoingMail, Task, TaskId, WorkLog,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTaskReport {
    pub members_reminded: usize,
    pub contacts_reminded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWorkLogReport {
    pub work_logs: usize,
    pub owners_reminded: Vec<MemberId>,
}

impl BatchJobs {
    /// Remind members of tasks taking place in `lead_days` days, and tell
    /// each task contact who is coming.
    pub async fn remind_upcoming_tasks(&self, lead_days: u32) -> Result<UpcomingTaskReport, Error> {
        let today = self.clock.utc().date_naive();
        let Some(target) = today.checked_add_days(Days::new(u64::from(lead_days))) else {
            return Err(Error::invalid_request(format!(
                "lead time of {lead_days} days is out of range"
            )));
        };
        let details = self
            .ports
            .assignments
            .list_for_date(target)
            .await
            .map_err(map_assignment_error)?;

        let mut by_task: BTreeMap<TaskId, Vec<&AssignmentDetail>> = BTreeMap::new();
        for detail in &details {
            by_task.entry(detail.task.id).or_default().push(detail);
        }

        let mut report = UpcomingTaskReport::default();
        for assigned in by_task.values() {
            let Some(task) = assigned.first().map(|detail| &detail.task) else {
                continue;
            };
            let member_ids: Vec<MemberId> =
                assigned.iter().map(|d| d.assignment.member_id).collect();
            let members = self
                .ports
                .members
                .find_many(&member_ids)
                .await
                .map_err(map_member_error)?;
            let names: BTreeMap<MemberId, String> =
                members.iter().map(|m| (m.id, m.full_name())).collect();

            for detail in assigned {
                let context = json!({
                    "task": task_context(task),
                    "hourSummary": detail.hour_summary(),
                    "contactId": task.contact(),
                });
                self.enqueue(OutgoingMail::to(
                    detail.assignment.member_id,
                    MailTemplate::UpcomingTask,
                    context,
                    self.clock.utc(),
                ))
                .await?;
                report.members_reminded += 1;
            }

            let roster: Vec<_> = assigned
                .iter()
                .map(|detail| {
                    json!({
                        "memberId": detail.assignment.member_id,
                        "name": names.get(&detail.assignment.member_id),
                        "hourSummary": detail.hour_summary(),
                    })
                })
                .collect();
            self.enqueue(OutgoingMail::to(
                task.contact(),
                MailTemplate::UpcomingTaskContact,
                json!({ "task": task_context(task), "members": roster }),
                self.clock.utc(),
            ))
            .await?;
            report.contacts_reminded += 1;
        }
        info!(
            date = %target,
            members = report.members_reminded,
            contacts = report.contacts_reminded,
            "upcoming task reminders queued"
        );
        Ok(report)
    }

    /// Remind task owners of work logs that have waited for review longer
    /// than the configured age. One mail per owner.
    pub async fn remind_pending_work_logs(&self) -> Result<PendingWorkLogReport, Error> {
        let cutoff =
            self.clock.utc() - TimeDelta::days(i64::from(self.settings.pending_reminder_days));
        let logs = self
            .ports
            .work_logs
            .list_unreviewed_since(cutoff)
            .await
            .map_err(map_work_log_error)?;

        let mut tasks: BTreeMap<TaskId, Option<Task>> = BTreeMap::new();
        let mut by_owner: BTreeMap<MemberId, Vec<(&WorkLog, Task)>> = BTreeMap::new();
        for log in &logs {
            if !tasks.contains_key(&log.task_id) {
                let task = self
                    .ports
                    .tasks
                    .find_by_id(&log.task_id)
                    .await
                    .map_err(map_task_error)?;
                tasks.insert(log.task_id, task);
            }
            if let Some(Some(task)) = tasks.get(&log.task_id) {
                by_owner
                    .entry(task.owner_id)
                    .or_default()
                    .push((log, task.clone()));
            }
        }

        let mut report = PendingWorkLogReport {
            work_logs: logs.len(),
            owners_reminded: Vec::with_capacity(by_owner.len()),
        };
        for (owner, entries) in by_owner {
            let items: Vec<_> = entries
                .iter()
                .map(|(log, task)| {
                    json!({
                        "workLogId": log.id,
                        "memberId": log.member_id,
                        "task": task.name,
                        "workedOn": log.worked_on,
                        "hours": log.hours,
                        "status": log.status.label(),
                    })
                })
                .collect();
            self.enqueue(OutgoingMail::to(
                owner,
                MailTemplate::WorkLogReminder,
                json!({ "workLogs": items }),
                self.clock.utc(),
            ))
            .await?;
            report.owners_reminded.push(owner);
        }
        info!(
            work_logs = report.work_logs,
            owners = report.owners_reminded.len(),
            "pending work log reminders queued"
        );
        Ok(report)
    }

    async fn enqueue(&self, mail: OutgoingMail) -> Result<(), Error> {
        self.ports.mail.enqueue(mail).await.map_err(map_mail_error)
    }
}

fn task_context(task: &Task) -> serde_json::Value {
    json!({
        "id": task.id,
        "name": task.name,
        "date": task.date,
        "hoursPerPerson": task.hours_per_person,
    })
}

//! Nightly assignment digest ("Zuteilungsbenachrichtigung").

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::BatchJobs;
use crate::domain::port_errors::{map_assignment_error, map_mail_error, map_notification_error};
use crate::domain::{AssignmentDetail, Error, MailTemplate, MemberId, OutgoingMail};

/// Members whose digest was queued.
///
/// `still_pending` lists members whose assignments changed while their
/// digest was composed; their flag stays raised and the next run mails them
/// the complete list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRun {
    pub notified: Vec<MemberId>,
    pub still_pending: Vec<MemberId>,
}

fn assignment_entry(detail: &AssignmentDetail) -> Value {
    json!({
        "taskId": detail.task.id,
        "task": detail.task.name,
        "date": detail.task.date,
        "hours": detail.hours(),
        "hourSummary": detail.hour_summary(),
    })
}

impl BatchJobs {
    /// Send every flagged member their current assignments and clear the
    /// flag. A member whose mail fails keeps the flag for the next run, and
    /// so does one whose flag was raised again after it was read.
    pub async fn notify_assignments(&self) -> Result<NotificationRun, Error> {
        let pending = self
            .ports
            .notifications
            .pending_members()
            .await
            .map_err(map_notification_error)?;
        let mut run = NotificationRun::default();
        for member in pending {
            if member.profile_incomplete() {
                warn!(member_id = %member.id, "notifying member with incomplete profile");
            }
            let assignments = self
                .ports
                .assignments
                .list_for_member(&member.id)
                .await
                .map_err(map_assignment_error)?;
            let now = self.clock.utc();
            let context = json!({
                "member": { "id": member.id, "name": member.full_name() },
                "assignments": assignments.iter().map(assignment_entry).collect::<Vec<_>>(),
            });
            self.ports
                .mail
                .enqueue(OutgoingMail::to(
                    member.id,
                    MailTemplate::AssignmentDigest,
                    context,
                    now,
                ))
                .await
                .map_err(map_mail_error)?;
            let cleared = self
                .ports
                .notifications
                .mark_notified(&member.id, member.notification.revision, now)
                .await
                .map_err(map_notification_error)?;
            run.notified.push(member.id);
            if !cleared {
                info!(member_id = %member.id, "assignments changed during the run, flag kept");
                run.still_pending.push(member.id);
            }
        }
        info!(
            notified = run.notified.len(),
            still_pending = run.still_pending.len(),
            "assignment digests queued"
        );
        Ok(run)
    }
}

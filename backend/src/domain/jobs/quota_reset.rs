//! Yearly quota reset for members who joined in the second half-year.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::BatchJobs;
use crate::domain::port_errors::{map_mail_error, map_member_error};
use crate::domain::{Error, Hours, MailTemplate, Member, MemberId, OutgoingMail};

/// A member and their quota before and after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaChange {
    pub member_id: MemberId,
    pub name: String,
    pub previous: Hours,
    pub current: Hours,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResetReport {
    pub changed: Vec<QuotaChange>,
    /// Members left with a quota that is neither the default nor coded.
    pub unusual: Vec<QuotaChange>,
}

impl BatchJobs {
    fn is_unusual(&self, quota: Hours) -> bool {
        quota < self.settings.coded_quota_threshold && quota != self.settings.default_quota
    }

    /// Reset reduced quotas of members who joined on or after July 1 of the
    /// current year to the default. Quotas at or above the coded threshold
    /// mark special membership categories and stay untouched.
    pub async fn reset_quotas(&self) -> Result<QuotaResetReport, Error> {
        let today = self.clock.utc().date_naive();
        let Some(cutoff) = NaiveDate::from_ymd_opt(today.year(), 7, 1) else {
            return Err(Error::internal("July 1 is not a valid date"));
        };
        let members = self
            .ports
            .members
            .list_active()
            .await
            .map_err(map_member_error)?;

        let mut report = QuotaResetReport::default();
        for member in members {
            let quota = member.quota;
            if member.joined_on >= cutoff && self.is_unusual(quota) {
                let target = self.settings.default_quota;
                self.ports
                    .members
                    .update_quota(&member.id, target)
                    .await
                    .map_err(map_member_error)?;
                report.changed.push(change(&member, target));
            } else if self.is_unusual(quota) {
                report.unusual.push(change(&member, quota));
            }
        }

        let board = self.board_ids().await?;
        if !board.is_empty() {
            let mail = OutgoingMail {
                template: MailTemplate::QuotaReport,
                recipients: board,
                context: json!({ "changed": report.changed, "unusual": report.unusual }),
                created_at: self.clock.utc(),
            };
            self.ports.mail.enqueue(mail).await.map_err(map_mail_error)?;
        }
        info!(
            changed = report.changed.len(),
            unusual = report.unusual.len(),
            "quota reset done"
        );
        Ok(report)
    }
}

fn change(member: &Member, current: Hours) -> QuotaChange {
    QuotaChange {
        member_id: member.id,
        name: member.full_name(),
        previous: member.quota,
        current,
    }
}

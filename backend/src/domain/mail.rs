//! Outgoing notifications.
//!
//! The core never sends mail. It enqueues a template name, recipients and a
//! JSON context; a separate delivery process renders and sends them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MemberId;

/// Templates known to the delivery process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailTemplate {
    /// Preference submitted, changed or withdrawn; sent to the task owner.
    #[serde(rename = "meldungNotify")]
    PreferenceNotice,
    /// Nightly digest of a member's assignments.
    #[serde(rename = "zuteilungEmail")]
    AssignmentDigest,
    /// Work log reviewed; sent to the submitting member.
    #[serde(rename = "leistungEmail")]
    WorkLogReviewed,
    /// Work logs waiting for review; sent to task owners.
    #[serde(rename = "leistungReminder")]
    WorkLogReminder,
    /// Task coming up for an assigned member.
    #[serde(rename = "upcomingJob")]
    UpcomingTask,
    /// Summary of reminded members for a task contact.
    #[serde(rename = "upcomingJob-Kontakt")]
    UpcomingTaskContact,
    /// Duplicate preference records detected.
    #[serde(rename = "meldungInconsistent")]
    PreferenceInconsistency,
    /// Yearly quota adjustments.
    #[serde(rename = "quotaReport")]
    QuotaReport,
}

impl MailTemplate {
    /// Template identifier as stored in the outbox.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreferenceNotice => "meldungNotify",
            Self::AssignmentDigest => "zuteilungEmail",
            Self::WorkLogReviewed => "leistungEmail",
            Self::WorkLogReminder => "leistungReminder",
            Self::UpcomingTask => "upcomingJob",
            Self::UpcomingTaskContact => "upcomingJob-Kontakt",
            Self::PreferenceInconsistency => "meldungInconsistent",
            Self::QuotaReport => "quotaReport",
        }
    }
}

impl std::fmt::Display for MailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMail {
    pub template: MailTemplate,
    pub recipients: Vec<MemberId>,
    pub context: Value,
    pub created_at: DateTime<Utc>,
}

impl OutgoingMail {
    /// Mail for a single recipient.
    #[must_use]
    pub fn to(
        recipient: MemberId,
        template: MailTemplate,
        context: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            template,
            recipients: vec![recipient],
            context,
            created_at,
        }
    }
}

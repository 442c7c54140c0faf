//! Detection of duplicate preference records.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::BatchJobs;
use crate::domain::port_errors::{map_mail_error, map_preference_error};
use crate::domain::ports::DuplicatePreference;
use crate::domain::{Error, MailTemplate, OutgoingMail};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub duplicates: Vec<DuplicatePreference>,
    pub board_notified: bool,
}

impl BatchJobs {
    /// List (member, task) pairs holding more than one preference. The
    /// unique index should keep this empty; the board hears about any hit.
    pub async fn check_consistency(&self) -> Result<ConsistencyReport, Error> {
        let duplicates = self
            .ports
            .preferences
            .duplicate_pairs()
            .await
            .map_err(map_preference_error)?;
        if duplicates.is_empty() {
            info!("preferences consistent");
            return Ok(ConsistencyReport::default());
        }

        warn!(pairs = duplicates.len(), "duplicate preferences found");
        let recipients = self.board_ids().await?;
        let board_notified = !recipients.is_empty();
        if board_notified {
            let mail = OutgoingMail {
                template: MailTemplate::PreferenceInconsistency,
                recipients,
                context: json!({ "duplicates": duplicates }),
                created_at: self.clock.utc(),
            };
            self.ports.mail.enqueue(mail).await.map_err(map_mail_error)?;
        }
        Ok(ConsistencyReport {
            duplicates,
            board_notified,
        })
    }
}

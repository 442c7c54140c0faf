//! Mail outbox backed by the `mail_outbox` table.
//!
//! Rows are picked up by the club's mail delivery process; rendering and
//! sending happen outside this service.

use async_trait::async_trait;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::OutgoingMail;
use crate::domain::ports::{MailQueue, MailQueueError};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewMailRow;
use super::pool::{DbPool, PoolError};
use super::schema::mail_outbox;

/// Diesel-backed implementation of the mail queue port.
#[derive(Clone)]
pub struct DieselMailOutbox {
    pool: DbPool,
}

impl DieselMailOutbox {
    /// Create a new outbox with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MailQueueError {
    map_basic_pool_error(error, MailQueueError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MailQueueError {
    map_basic_diesel_error(error, MailQueueError::query, MailQueueError::connection)
}

fn mail_row(mail: &OutgoingMail) -> NewMailRow<'_> {
    NewMailRow {
        id: Uuid::new_v4(),
        template: mail.template.as_str(),
        recipients: mail.recipients.iter().map(|id| *id.as_uuid()).collect(),
        context: &mail.context,
        created_at: mail.created_at,
    }
}

/// Queue `mail` on an open connection, typically inside the transaction
/// that performs the change the mail reports.
pub(super) async fn insert_mail(
    conn: &mut AsyncPgConnection,
    mail: &OutgoingMail,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(mail_outbox::table)
        .values(mail_row(mail))
        .execute(conn)
        .await?;
    debug!(template = %mail.template, recipients = mail.recipients.len(), "mail queued");
    Ok(())
}

#[async_trait]
impl MailQueue for DieselMailOutbox {
    async fn enqueue(&self, mail: OutgoingMail) -> Result<(), MailQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        insert_mail(&mut conn, &mail).await.map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::json;

    use crate::domain::{MailTemplate, MemberId};

    #[rstest]
    fn rows_carry_template_key_and_recipients() {
        let member = MemberId::random();
        let mail = OutgoingMail::to(
            member,
            MailTemplate::WorkLogReviewed,
            json!({ "task": "Rasen" }),
            Utc::now(),
        );
        let row = mail_row(&mail);
        assert_eq!(row.template, "leistungEmail");
        assert_eq!(row.recipients, vec![*member.as_uuid()]);
        assert_eq!(row.context, &json!({ "task": "Rasen" }));
    }
}

//! Port for the outgoing mail queue.

use async_trait::async_trait;

use crate::domain::OutgoingMail;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail queue adapters.
    pub enum MailQueueError {}
}

/// Enqueue-only mail port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailQueue: Send + Sync {
    /// Queue a message for later delivery.
    async fn enqueue(&self, mail: OutgoingMail) -> Result<(), MailQueueError>;
}

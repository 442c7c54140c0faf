//! Port for the per-member notification-pending flag.
//!
//! The flag is raised inside the assignment transactions (see
//! [`super::AssignmentRepository`]); this port covers the notifier side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Member, MemberId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification flag adapters.
    pub enum NotificationFlagError {
        /// The member does not exist.
        UnknownMember { member_id: String } => "unknown member {member_id}",
    }
}

/// Notification flag port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationFlagStore: Send + Sync {
    /// Members whose flag is raised, with the revision of their last raise.
    async fn pending_members(&self) -> Result<Vec<Member>, NotificationFlagError>;

    /// Clear the flag and record when the member was notified, provided no
    /// raise happened after `seen_revision` was read.
    ///
    /// Returns `false` and leaves the flag raised when the revision moved on.
    async fn mark_notified(
        &self,
        member: &MemberId,
        seen_revision: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, NotificationFlagError>;
}

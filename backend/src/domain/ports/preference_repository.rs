//! Port for preference ("Meldung") persistence.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{MemberId, OutgoingMail, Preference, PreferenceId, TaskId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by preference repository adapters.
    pub enum PreferenceRepositoryError {
        /// The member or task referenced by a new preference does not exist.
        MissingReference { message: String } => "preference references a missing record: {message}",
    }
}

/// Outcome of [`PreferenceRepository::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreference {
    pub preference: Preference,
    /// True when this call inserted the record.
    pub created: bool,
}

/// A (member, task) pair with more than one preference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePreference {
    pub member_id: MemberId,
    pub task_id: TaskId,
    pub count: u64,
}

/// Preference persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Insert `defaults` unless a record for its (member, task) pair exists,
    /// then return the stored record.
    ///
    /// Implementations must be atomic: concurrent callers for the same pair
    /// observe one record.
    async fn get_or_create(
        &self,
        defaults: &Preference,
    ) -> Result<StoredPreference, PreferenceRepositoryError>;

    /// Find a preference by id.
    async fn find_by_id(
        &self,
        id: &PreferenceId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError>;

    /// Find the preference for a (member, task) pair.
    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError>;

    /// Overwrite levels, remarks and `updated_at` of an existing record.
    async fn update(&self, preference: &Preference) -> Result<(), PreferenceRepositoryError>;

    /// Overwrite a record and queue `notice` in the same transaction.
    async fn update_and_notify(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<(), PreferenceRepositoryError>;

    /// Overwrite a record and queue `notice` unless the member holds an
    /// assignment for the task.
    ///
    /// The assignment check and the write are one statement; `false` means
    /// an assignment exists and nothing was written.
    async fn update_unless_assigned(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<bool, PreferenceRepositoryError>;

    /// All preferences of a member.
    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError>;

    /// All preferences for a task.
    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError>;

    /// Pairs holding more than one record.
    async fn duplicate_pairs(&self) -> Result<Vec<DuplicatePreference>, PreferenceRepositoryError>;
}

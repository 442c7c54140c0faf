//! Port for tasks, task groups and hour schedules.

use async_trait::async_trait;

use crate::domain::{Task, TaskGroup, TaskGroupId, TaskId, TimeSlotRequirement};

use super::define_port_error;

define_port_error! {
    /// Errors raised by task repository adapters.
    pub enum TaskRepositoryError {
        /// Another task already uses the name.
        DuplicateName { name: String } => "a task named {name} already exists",
        /// Work logs still reference the task.
        TaskInUse { task_id: String } => "task {task_id} is still referenced by work logs",
        /// The referenced task group does not exist.
        UnknownGroup { group_id: String } => "unknown task group {group_id}",
    }
}

/// Task persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Find one task.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskRepositoryError>;

    /// All tasks ordered by group and name.
    async fn list(&self) -> Result<Vec<Task>, TaskRepositoryError>;

    /// Persist a new task.
    async fn insert(&self, task: &Task) -> Result<(), TaskRepositoryError>;

    /// Overwrite an existing task.
    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError>;

    /// Delete a task together with its preferences, assignments and
    /// schedule. Fails with `TaskInUse` while work logs reference it.
    async fn delete(&self, id: &TaskId) -> Result<(), TaskRepositoryError>;

    /// Find one task group.
    async fn find_group(&self, id: &TaskGroupId) -> Result<Option<TaskGroup>, TaskRepositoryError>;

    /// All task groups ordered by name.
    async fn list_groups(&self) -> Result<Vec<TaskGroup>, TaskRepositoryError>;

    /// Persist a new task group.
    async fn insert_group(&self, group: &TaskGroup) -> Result<(), TaskRepositoryError>;

    /// Hour schedule of a task, ascending by hour.
    async fn requirements(
        &self,
        task: &TaskId,
    ) -> Result<Vec<TimeSlotRequirement>, TaskRepositoryError>;

    /// Replace the hour schedule of a task in one transaction.
    ///
    /// Rows are upserted per hour; hours absent from `requirements` are
    /// removed.
    async fn replace_requirements(
        &self,
        task: &TaskId,
        requirements: &[TimeSlotRequirement],
    ) -> Result<(), TaskRepositoryError>;
}

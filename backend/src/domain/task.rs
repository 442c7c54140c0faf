//! Tasks, task groups and hour schedules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{HourSlot, Hours, MemberId, TaskGroupId, TaskId};

/// Maximum length of a task name.
pub const TASK_NAME_MAX: usize = 50;
/// Maximum length of a task group name.
pub const TASK_GROUP_NAME_MAX: usize = 30;

/// Validation errors for task and group fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("task name must not contain a dot")]
    ContainsDot,
}

fn validated(
    raw: impl Into<String>,
    field: &'static str,
    max: usize,
) -> Result<String, TaskValidationError> {
    let value: String = raw.into().trim().to_owned();
    if value.is_empty() {
        return Err(TaskValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(TaskValidationError::TooLong { field, max });
    }
    Ok(value)
}

/// Unique task name. Dots are reserved by the export layouts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct TaskName(String);

impl TaskName {
    /// Validate and wrap a task name.
    pub fn new(raw: impl Into<String>) -> Result<Self, TaskValidationError> {
        let value = validated(raw, "task name", TASK_NAME_MAX)?;
        if value.contains('.') {
            return Err(TaskValidationError::ContainsDot);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskName {
    type Error = TaskValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskName> for String {
    fn from(value: TaskName) -> Self {
        value.0
    }
}

/// Named category of tasks with a responsible board member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub id: TaskGroupId,
    pub name: String,
    pub owner_id: MemberId,
    pub remark: String,
}

impl TaskGroup {
    /// Build a new group, validating the name.
    pub fn new(
        name: impl Into<String>,
        owner_id: MemberId,
        remark: impl Into<String>,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id: TaskGroupId::random(),
            name: validated(name, "group name", TASK_GROUP_NAME_MAX)?,
            owner_id,
            remark: remark.into(),
        })
    }
}

/// A unit of club work needing `required_headcount` helpers for
/// `hours_per_person` hours each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: TaskName,
    pub group_id: TaskGroupId,
    pub required_headcount: u32,
    pub hours_per_person: Hours,
    pub date: Option<NaiveDate>,
    pub owner_id: MemberId,
    pub team_lead_id: Option<MemberId>,
    pub remark: String,
}

impl Task {
    /// Contact person for helpers: the team lead when set, else the owner.
    #[must_use]
    pub fn contact(&self) -> MemberId {
        self.team_lead_id.unwrap_or(self.owner_id)
    }

    /// True when the task date lies strictly before `today`.
    #[must_use]
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date.is_some_and(|date| date < today)
    }

    /// True while fewer members are assigned than required.
    #[must_use]
    pub fn is_open(&self, assigned: usize) -> bool {
        u32::try_from(assigned).is_ok_and(|count| count < self.required_headcount)
    }

    /// Whether `member` may review work logged on this task.
    ///
    /// Board members review everything; team leads review their own tasks.
    #[must_use]
    pub fn reviewable_by(&self, member: MemberId, is_board: bool) -> bool {
        is_board || self.team_lead_id == Some(member)
    }
}

/// Required headcount for one hour of a task ("Stundenplan").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotRequirement {
    pub task_id: TaskId,
    pub hour: HourSlot,
    pub headcount: u32,
}

/// Required vs. covered headcount for one scheduled hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourCoverage {
    pub hour: HourSlot,
    pub required: u32,
    pub covered: u32,
}

impl HourCoverage {
    /// True when enough helpers cover this hour.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.covered >= self.required
    }
}

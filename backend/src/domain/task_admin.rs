//! Task, group and hour-schedule administration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::ports::DomainPorts;
use super::port_errors::{map_assignment_error, map_task_error};
use super::{
    Actor, AssignmentDetail, Error, HourCoverage, HourSlot, Hours, MemberId, Task, TaskGroup,
    TaskGroupId, TaskId, TaskName, TaskValidationError, TimeSlotRequirement,
};

impl From<TaskValidationError> for Error {
    fn from(err: TaskValidationError) -> Self {
        let field = match &err {
            TaskValidationError::Empty { field } | TaskValidationError::TooLong { field, .. } => {
                *field
            }
            TaskValidationError::ContainsDot => "task name",
        };
        Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
    }
}

/// Editable fields of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    pub group_id: TaskGroupId,
    pub required_headcount: u32,
    pub hours_per_person: Hours,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Defaults to the acting board member.
    #[serde(default)]
    pub owner_id: Option<MemberId>,
    #[serde(default)]
    pub team_lead_id: Option<MemberId>,
    #[serde(default)]
    pub remark: String,
}

/// Editable fields of a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroupDraft {
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<MemberId>,
    #[serde(default)]
    pub remark: String,
}

/// Requested headcount for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourRequirement {
    pub hour: HourSlot,
    pub headcount: u32,
}

/// Staffing status of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStaffing {
    pub task_id: TaskId,
    pub assigned: u32,
    pub required: u32,
    pub open: bool,
    /// Empty for tasks without an hour schedule.
    pub coverage: Vec<HourCoverage>,
    pub schedule_complete: bool,
}

/// Per scheduled hour, compare the requirement with booked people.
///
/// Each booked slot counts its member plus the assignment's helpers.
#[must_use]
pub fn hour_coverage(
    requirements: &[TimeSlotRequirement],
    assignments: &[AssignmentDetail],
) -> Vec<HourCoverage> {
    let mut covered: BTreeMap<HourSlot, u32> = BTreeMap::new();
    for detail in assignments {
        for hour in &detail.slots {
            *covered.entry(*hour).or_default() += detail.people_per_slot();
        }
    }
    let mut coverage: Vec<HourCoverage> = requirements
        .iter()
        .map(|requirement| HourCoverage {
            hour: requirement.hour,
            required: requirement.headcount,
            covered: covered.get(&requirement.hour).copied().unwrap_or(0),
        })
        .collect();
    coverage.sort_by_key(|entry| entry.hour);
    coverage
}

/// Administration use cases for tasks and groups.
#[derive(Clone)]
pub struct TaskAdministration {
    ports: DomainPorts,
}

impl TaskAdministration {
    pub fn new(ports: DomainPorts) -> Self {
        Self { ports }
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, Error> {
        self.ports.tasks.list().await.map_err(map_task_error)
    }

    pub async fn list_groups(&self) -> Result<Vec<TaskGroup>, Error> {
        self.ports.tasks.list_groups().await.map_err(map_task_error)
    }

    pub async fn find_task(&self, id: TaskId) -> Result<Task, Error> {
        self.ports
            .tasks
            .find_by_id(&id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| {
                Error::not_found(format!("task {id} not found"))
                    .with_details(json!({ "taskId": id }))
            })
    }

    /// Create a task. Board members only.
    pub async fn create_task(&self, actor: &Actor, draft: TaskDraft) -> Result<Task, Error> {
        ensure_board(actor)?;
        let task = self.build_task(actor, TaskId::random(), draft).await?;
        self.ports.tasks.insert(&task).await.map_err(map_task_error)?;
        info!(task_id = %task.id, name = %task.name, "task created");
        Ok(task)
    }

    /// Replace the editable fields of a task. Board members only.
    pub async fn update_task(
        &self,
        actor: &Actor,
        id: TaskId,
        draft: TaskDraft,
    ) -> Result<Task, Error> {
        ensure_board(actor)?;
        self.find_task(id).await?;
        let task = self.build_task(actor, id, draft).await?;
        self.ports.tasks.update(&task).await.map_err(map_task_error)?;
        info!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Delete a task. Only its responsible owner may do so, and only while
    /// no work logs reference it.
    pub async fn delete_task(&self, actor: &Actor, id: TaskId) -> Result<(), Error> {
        let task = self.find_task(id).await?;
        if task.owner_id != actor.member_id {
            return Err(Error::forbidden("only the responsible owner may delete a task")
                .with_details(json!({ "taskId": id })));
        }
        self.ports.tasks.delete(&id).await.map_err(map_task_error)?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Create a task group. Board members only.
    pub async fn create_group(
        &self,
        actor: &Actor,
        draft: TaskGroupDraft,
    ) -> Result<TaskGroup, Error> {
        ensure_board(actor)?;
        let group = TaskGroup::new(
            draft.name,
            draft.owner_id.unwrap_or(actor.member_id),
            draft.remark,
        )?;
        self.ports
            .tasks
            .insert_group(&group)
            .await
            .map_err(map_task_error)?;
        info!(group_id = %group.id, name = %group.name, "task group created");
        Ok(group)
    }

    /// Replace the hour schedule of a task. Board members only.
    ///
    /// Later entries for the same hour win; zero headcounts drop the hour.
    pub async fn replace_schedule(
        &self,
        actor: &Actor,
        id: TaskId,
        hours: Vec<HourRequirement>,
    ) -> Result<Vec<TimeSlotRequirement>, Error> {
        ensure_board(actor)?;
        self.find_task(id).await?;
        let mut by_hour = BTreeMap::new();
        for entry in hours {
            entry.hour.ensure_scheduled().map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "hour", "taskId": id }))
            })?;
            by_hour.insert(entry.hour, entry.headcount);
        }
        let requirements: Vec<TimeSlotRequirement> = by_hour
            .into_iter()
            .filter(|(_, headcount)| *headcount > 0)
            .map(|(hour, headcount)| TimeSlotRequirement {
                task_id: id,
                hour,
                headcount,
            })
            .collect();
        self.ports
            .tasks
            .replace_requirements(&id, &requirements)
            .await
            .map_err(map_task_error)?;
        info!(task_id = %id, hours = requirements.len(), "hour schedule replaced");
        Ok(requirements)
    }

    /// Headcount and per-hour coverage of a task.
    pub async fn staffing(&self, id: TaskId) -> Result<TaskStaffing, Error> {
        let task = self.find_task(id).await?;
        let requirements = self
            .ports
            .tasks
            .requirements(&id)
            .await
            .map_err(map_task_error)?;
        let assignments = self
            .ports
            .assignments
            .list_for_task(&id)
            .await
            .map_err(map_assignment_error)?;
        let coverage = hour_coverage(&requirements, &assignments);
        Ok(TaskStaffing {
            task_id: id,
            assigned: u32::try_from(assignments.len()).unwrap_or(u32::MAX),
            required: task.required_headcount,
            open: task.is_open(assignments.len()),
            schedule_complete: coverage.iter().all(HourCoverage::is_complete),
            coverage,
        })
    }

    async fn build_task(&self, actor: &Actor, id: TaskId, draft: TaskDraft) -> Result<Task, Error> {
        let name = TaskName::new(draft.name)?;
        self.ports
            .tasks
            .find_group(&draft.group_id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| {
                Error::invalid_request(format!("task group {} does not exist", draft.group_id))
                    .with_details(json!({ "field": "groupId" }))
            })?;
        Ok(Task {
            id,
            name,
            group_id: draft.group_id,
            required_headcount: draft.required_headcount,
            hours_per_person: draft.hours_per_person,
            date: draft.date,
            owner_id: draft.owner_id.unwrap_or(actor.member_id),
            team_lead_id: draft.team_lead_id,
            remark: draft.remark,
        })
    }
}

fn ensure_board(actor: &Actor) -> Result<(), Error> {
    if actor.board {
        Ok(())
    } else {
        Err(Error::forbidden("only board members may administer tasks"))
    }
}

#[cfg(test)]
#[path = "task_admin_tests.rs"]
mod tests;

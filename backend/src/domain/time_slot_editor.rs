//! Hour-slot bookkeeping for tasks with an hour schedule.
//!
//! The board ticks (member, hour) boxes for the assignees of one task. The
//! submission carries the previously ticked set, so the change set is a plain
//! set difference; parent assignments are still checked against the store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use utoipa::ToSchema;

use super::ports::DomainPorts;
use super::port_errors::{map_assignment_error, map_task_error};
use super::{
    Actor, AssignmentDetail, AssignmentId, Error, HourIntervalError, HourSlot, MAX_EXTRA_HELPERS,
    MemberId, TaskId, TimeSlotRequirement,
};

/// One ticked or unticked (member, hour) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotSelection {
    pub member_id: MemberId,
    pub hour: HourSlot,
    pub checked: bool,
}

/// A (member, hour) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct MemberHour {
    pub member_id: MemberId,
    pub hour: HourSlot,
}

/// Board submission for one task's hour grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotSubmission {
    pub selections: Vec<SlotSelection>,
    /// Boxes that were ticked when the grid was rendered.
    #[serde(default)]
    pub previously_checked: BTreeSet<MemberHour>,
    /// Helper counts per member, applied only where they differ.
    #[serde(default)]
    pub extra_helpers: BTreeMap<MemberId, u16>,
}

/// A slot row to insert or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotChange {
    pub assignment_id: AssignmentId,
    pub member_id: MemberId,
    pub hour: HourSlot,
}

/// Changes for one task's hour grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotPlan {
    pub task_id: TaskId,
    pub to_create: BTreeSet<SlotChange>,
    pub to_delete: BTreeSet<SlotChange>,
    pub helper_updates: BTreeMap<AssignmentId, u16>,
    /// Members with created or deleted slots, once each.
    pub flag_members: BTreeSet<MemberId>,
}

impl TimeSlotPlan {
    /// True when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty() && self.helper_updates.is_empty()
    }
}

/// What an adapter actually changed while applying a slot plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedTimeSlotPlan {
    pub created: u64,
    pub deleted: u64,
    pub helpers_updated: u64,
    pub flagged: u64,
}

/// Reasons a slot submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSlotPlanError {
    #[error("task {task_id} has no hour schedule")]
    NoSchedule { task_id: TaskId },
    #[error("member {member_id} has no assignment for task {task_id}")]
    MissingAssignment { member_id: MemberId, task_id: TaskId },
    #[error("member {member_id}: {source}")]
    InvalidHour {
        member_id: MemberId,
        source: HourIntervalError,
    },
    #[error("member {member_id}: at most {MAX_EXTRA_HELPERS} extra helpers, got {helpers}")]
    TooManyHelpers { member_id: MemberId, helpers: u16 },
}

impl From<TimeSlotPlanError> for Error {
    fn from(err: TimeSlotPlanError) -> Self {
        let details = match &err {
            TimeSlotPlanError::NoSchedule { task_id } => json!({ "taskId": task_id }),
            TimeSlotPlanError::MissingAssignment { member_id, task_id } => {
                json!({ "memberId": member_id, "taskId": task_id })
            }
            TimeSlotPlanError::InvalidHour { member_id, source } => {
                json!({ "memberId": member_id, "field": "hour", "reason": source.to_string() })
            }
            TimeSlotPlanError::TooManyHelpers { member_id, .. } => {
                json!({ "memberId": member_id, "field": "extraHelpers", "max": MAX_EXTRA_HELPERS })
            }
        };
        Error::invalid_request(err.to_string()).with_details(details)
    }
}

/// Compute the slot changes for one task.
///
/// Ticked boxes and helper counts must belong to a member assigned to the
/// task, and helper counts stay within [`MAX_EXTRA_HELPERS`]. Previously
/// ticked boxes whose assignment has meanwhile been removed are skipped:
/// their slots went with the assignment.
pub fn plan_time_slots(
    task_id: TaskId,
    requirements: &[TimeSlotRequirement],
    assignments: &[AssignmentDetail],
    submission: &TimeSlotSubmission,
) -> Result<TimeSlotPlan, TimeSlotPlanError> {
    if requirements.is_empty() {
        return Err(TimeSlotPlanError::NoSchedule { task_id });
    }
    let by_member: BTreeMap<MemberId, &AssignmentDetail> = assignments
        .iter()
        .map(|detail| (detail.assignment.member_id, detail))
        .collect();
    let parent = |member_id: MemberId| {
        by_member
            .get(&member_id)
            .copied()
            .ok_or(TimeSlotPlanError::MissingAssignment { member_id, task_id })
    };

    let mut desired = BTreeSet::new();
    for selection in submission.selections.iter().filter(|s| s.checked) {
        selection
            .hour
            .ensure_scheduled()
            .map_err(|source| TimeSlotPlanError::InvalidHour {
                member_id: selection.member_id,
                source,
            })?;
        parent(selection.member_id)?;
        desired.insert(MemberHour {
            member_id: selection.member_id,
            hour: selection.hour,
        });
    }

    let mut plan = TimeSlotPlan {
        task_id,
        to_create: BTreeSet::new(),
        to_delete: BTreeSet::new(),
        helper_updates: BTreeMap::new(),
        flag_members: BTreeSet::new(),
    };
    for pair in desired.difference(&submission.previously_checked) {
        let detail = parent(pair.member_id)?;
        plan.to_create.insert(SlotChange {
            assignment_id: detail.assignment.id,
            member_id: pair.member_id,
            hour: pair.hour,
        });
    }
    for pair in submission.previously_checked.difference(&desired) {
        let Some(detail) = by_member.get(&pair.member_id) else {
            debug!(member_id = %pair.member_id, %task_id, "skipping slot of removed assignment");
            continue;
        };
        plan.to_delete.insert(SlotChange {
            assignment_id: detail.assignment.id,
            member_id: pair.member_id,
            hour: pair.hour,
        });
    }
    for (member_id, helpers) in &submission.extra_helpers {
        let detail = parent(*member_id)?;
        if *helpers > MAX_EXTRA_HELPERS {
            return Err(TimeSlotPlanError::TooManyHelpers {
                member_id: *member_id,
                helpers: *helpers,
            });
        }
        if detail.assignment.extra_helpers != *helpers {
            plan.helper_updates.insert(detail.assignment.id, *helpers);
        }
    }
    plan.flag_members = plan
        .to_create
        .iter()
        .chain(plan.to_delete.iter())
        .map(|change| change.member_id)
        .collect();
    Ok(plan)
}

/// Edits the hour grid of a task ("Stundenplan bearbeiten").
#[derive(Clone)]
pub struct TimeSlotEditor {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
}

impl TimeSlotEditor {
    /// Create an editor over the given ports.
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Validate and apply a slot submission in one transaction.
    pub async fn submit(
        &self,
        actor: &Actor,
        task_id: TaskId,
        submission: TimeSlotSubmission,
    ) -> Result<AppliedTimeSlotPlan, Error> {
        if !actor.board {
            return Err(Error::forbidden("only board members may edit hour schedules"));
        }
        self.ports
            .tasks
            .find_by_id(&task_id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| Error::not_found(format!("task {task_id} not found")))?;

        let requirements = self
            .ports
            .tasks
            .requirements(&task_id)
            .await
            .map_err(map_task_error)?;
        let assignments = self
            .ports
            .assignments
            .list_for_task(&task_id)
            .await
            .map_err(map_assignment_error)?;
        let plan = plan_time_slots(task_id, &requirements, &assignments, &submission)?;

        if plan.is_empty() {
            debug!(%task_id, "hour grid unchanged");
            return Ok(AppliedTimeSlotPlan::default());
        }
        let applied = self
            .ports
            .assignments
            .apply_time_slot_plan(&plan)
            .await
            .map_err(map_assignment_error)?;
        info!(
            %task_id,
            created = applied.created,
            deleted = applied.deleted,
            helpers_updated = applied.helpers_updated,
            at = %self.clock.utc(),
            "hour grid updated"
        );
        Ok(applied)
    }
}

#[cfg(test)]
#[path = "time_slot_editor_tests.rs"]
mod tests;

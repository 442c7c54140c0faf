//! Reconciliation of desired and actual assignments for a task.
//!
//! The board submits the complete set of members that should work on a task.
//! [`plan_reconciliation`] turns that into creations, deletions and the set of
//! members whose notification flag must be raised; [`AssignmentReconciler`]
//! applies the plan in one transaction per task.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use utoipa::ToSchema;

use super::ports::DomainPorts;
use super::port_errors::{map_assignment_error, map_task_error};
use super::{Actor, Error, MemberId, TaskId};

/// Changes required to bring one task's assignments to the desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub task_id: TaskId,
    pub to_create: BTreeSet<MemberId>,
    pub to_delete: BTreeSet<MemberId>,
    /// One entry per touched member, however many rows change for them.
    pub flag_members: BTreeSet<MemberId>,
    pub at: DateTime<Utc>,
}

impl ReconciliationPlan {
    /// True when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// What an adapter actually changed while applying a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedReconciliation {
    pub created: u64,
    pub deleted: u64,
    pub flagged: u64,
}

/// Compute `desired - current` and `current - desired`.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use arbeitsplan::domain::{plan_reconciliation, MemberId, TaskId};
///
/// let (a, b) = (MemberId::random(), MemberId::random());
/// let plan = plan_reconciliation(TaskId::random(), &BTreeSet::from([a]), [b], chrono::Utc::now());
/// assert!(plan.to_create.contains(&a));
/// assert!(plan.to_delete.contains(&b));
/// assert_eq!(plan.flag_members.len(), 2);
/// ```
pub fn plan_reconciliation(
    task_id: TaskId,
    desired: &BTreeSet<MemberId>,
    current: impl IntoIterator<Item = MemberId>,
    at: DateTime<Utc>,
) -> ReconciliationPlan {
    let current: BTreeSet<MemberId> = current.into_iter().collect();
    let to_create: BTreeSet<MemberId> = desired.difference(&current).copied().collect();
    let to_delete: BTreeSet<MemberId> = current.difference(desired).copied().collect();
    let flag_members = to_create.union(&to_delete).copied().collect();
    ReconciliationPlan {
        task_id,
        to_create,
        to_delete,
        flag_members,
        at,
    }
}

/// Desired assignees of one task, as submitted by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSelection {
    pub task_id: TaskId,
    pub desired_member_ids: BTreeSet<MemberId>,
}

/// Result of reconciling one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub task_id: TaskId,
    pub created: Vec<MemberId>,
    pub deleted: Vec<MemberId>,
    pub flagged: Vec<MemberId>,
}

impl ReconciliationOutcome {
    fn unchanged(task_id: TaskId) -> Self {
        Self {
            task_id,
            created: Vec::new(),
            deleted: Vec::new(),
            flagged: Vec::new(),
        }
    }
}

/// Applies board assignment decisions ("Zuteilung").
#[derive(Clone)]
pub struct AssignmentReconciler {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
}

impl AssignmentReconciler {
    /// Create a reconciler over the given ports.
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Bring the assignments of one task in line with `selection`.
    ///
    /// # Errors
    /// `Forbidden` for non-board actors, `NotFound` for unknown tasks and
    /// mapped store errors. A failed transaction leaves the task untouched.
    pub async fn reconcile(
        &self,
        actor: &Actor,
        selection: TaskSelection,
    ) -> Result<ReconciliationOutcome, Error> {
        if !actor.board {
            return Err(Error::forbidden("only board members may assign tasks"));
        }
        let TaskSelection {
            task_id,
            desired_member_ids,
        } = selection;

        self.ports
            .tasks
            .find_by_id(&task_id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| {
                Error::not_found(format!("task {task_id} not found"))
                    .with_details(json!({ "taskId": task_id }))
            })?;

        let current = self
            .ports
            .assignments
            .list_for_task(&task_id)
            .await
            .map_err(map_assignment_error)?;
        let plan = plan_reconciliation(
            task_id,
            &desired_member_ids,
            current.iter().map(|detail| detail.assignment.member_id),
            self.clock.utc(),
        );

        if plan.is_empty() {
            debug!(%task_id, "assignments already match selection");
            return Ok(ReconciliationOutcome::unchanged(task_id));
        }

        let applied = self
            .ports
            .assignments
            .apply_reconciliation(&plan)
            .await
            .map_err(|err| {
                map_assignment_error(err).with_details(json!({ "taskId": task_id }))
            })?;
        info!(
            %task_id,
            created = applied.created,
            deleted = applied.deleted,
            flagged = applied.flagged,
            "assignments reconciled"
        );

        Ok(ReconciliationOutcome {
            task_id,
            created: plan.to_create.into_iter().collect(),
            deleted: plan.to_delete.into_iter().collect(),
            flagged: plan.flag_members.into_iter().collect(),
        })
    }

    /// Reconcile several tasks, one transaction each.
    ///
    /// Stops at the first failing task; tasks reconciled before it stay
    /// committed and the error names the failing task.
    pub async fn reconcile_many(
        &self,
        actor: &Actor,
        selections: Vec<TaskSelection>,
    ) -> Result<Vec<ReconciliationOutcome>, Error> {
        let mut outcomes = Vec::with_capacity(selections.len());
        for selection in selections {
            outcomes.push(self.reconcile(actor, selection).await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

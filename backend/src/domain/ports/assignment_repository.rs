//! Port for assignments ("Zuteilungen") and their hour slots.
//!
//! Mutations arrive as precomputed plans. Adapters apply a plan, including
//! the notification flags it lists, inside a single transaction.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    AppliedReconciliation, AppliedTimeSlotPlan, Assignment, AssignmentDetail, MemberId,
    ReconciliationPlan, TaskId, TimeSlotPlan,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by assignment repository adapters.
    pub enum AssignmentRepositoryError {
        /// A slot references an assignment that no longer exists.
        MissingAssignment { member_id: String, task_id: String } =>
            "member {member_id} has no assignment for task {task_id}",
        /// The member or task of a new assignment does not exist.
        MissingReference { message: String } =>
            "assignment references a missing record: {message}",
    }
}

/// Assignment persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Assignment of a member to a task, if any.
    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Assignment>, AssignmentRepositoryError>;

    /// Assignments of a task with their booked slots.
    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError>;

    /// Assignments of a member with their tasks and booked slots.
    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError>;

    /// Assignments for tasks taking place on `date`.
    async fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError>;

    /// Apply creations, deletions and flag raises of one task atomically.
    ///
    /// Creating an existing (member, task) pair is a no-op, as is deleting a
    /// missing one.
    async fn apply_reconciliation(
        &self,
        plan: &ReconciliationPlan,
    ) -> Result<AppliedReconciliation, AssignmentRepositoryError>;

    /// Apply slot creations, deletions, helper counts and flag raises of one
    /// task atomically.
    async fn apply_time_slot_plan(
        &self,
        plan: &TimeSlotPlan,
    ) -> Result<AppliedTimeSlotPlan, AssignmentRepositoryError>;
}

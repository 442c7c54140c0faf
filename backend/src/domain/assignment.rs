//! Assignments of members to tasks ("Zuteilungen") and their hour slots.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    AssignmentId, HourInterval, HourSlot, Hours, MemberId, Task, TaskId, compress,
    format_intervals,
};

/// A committed work assignment of one member to one task.
/// Largest helper count an assignment can carry; the store keeps it in a
/// signed 16-bit column.
pub const MAX_EXTRA_HELPERS: u16 = 32_767;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub member_id: MemberId,
    pub task_id: TaskId,
    /// Set when created by a bulk tool rather than a board click.
    pub automatic: bool,
    /// Additional people the member brings along.
    pub extra_helpers: u16,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// New manual assignment without helpers.
    #[must_use]
    pub fn new(member_id: MemberId, task_id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id: AssignmentId::random(),
            member_id,
            task_id,
            automatic: false,
            extra_helpers: 0,
            created_at: now,
        }
    }
}

/// Marks that an assignment covers one hour slot ("StundenZuteilung").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotAssignment {
    pub assignment_id: AssignmentId,
    pub hour: HourSlot,
}

/// An assignment together with its task and covered hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    pub assignment: Assignment,
    pub task: Task,
    pub slots: BTreeSet<HourSlot>,
}

impl AssignmentDetail {
    /// Hours this assignment contributes to the member's workload.
    ///
    /// Each booked slot is one hour; without slots the task's hours per
    /// person apply.
    #[must_use]
    pub fn hours(&self) -> Hours {
        if self.slots.is_empty() {
            self.task.hours_per_person
        } else {
            let count = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            Hours::from_whole(count)
        }
    }

    /// Booked slots folded into consecutive intervals.
    #[must_use]
    pub fn intervals(&self) -> Vec<HourInterval> {
        compress(self.slots.iter().copied())
    }

    /// Human readable hour ranges, empty when no slots are booked.
    #[must_use]
    pub fn hour_summary(&self) -> String {
        format_intervals(&self.intervals())
    }

    /// People covering each booked slot: the member plus helpers.
    #[must_use]
    pub fn people_per_slot(&self) -> u32 {
        1 + u32::from(self.assignment.extra_helpers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskGroupId, TaskName};
    use rstest::rstest;

    fn detail(slots: &[i64], hours_per_person: Hours) -> AssignmentDetail {
        let task = Task {
            id: TaskId::random(),
            name: TaskName::new("Hafenfest Ausschank").expect("valid name"),
            group_id: TaskGroupId::random(),
            required_headcount: 4,
            hours_per_person,
            date: None,
            owner_id: MemberId::random(),
            team_lead_id: None,
            remark: String::new(),
        };
        AssignmentDetail {
            assignment: Assignment::new(MemberId::random(), task.id, Utc::now()),
            task,
            slots: slots
                .iter()
                .map(|h| HourSlot::new(*h).expect("valid hour"))
                .collect(),
        }
    }

    #[rstest]
    fn slot_count_overrides_task_hours() {
        let booked = detail(&[14, 15, 17], Hours::from_whole(8));
        assert_eq!(booked.hours(), Hours::from_whole(3));
    }

    #[rstest]
    fn falls_back_to_task_hours_without_slots() {
        let unbooked = detail(&[], Hours::from_tenths(25));
        assert_eq!(unbooked.hours(), Hours::from_tenths(25));
        assert_eq!(unbooked.hour_summary(), "");
    }

    #[rstest]
    fn summary_compresses_slots() {
        let booked = detail(&[14, 15, 17], Hours::ZERO);
        assert_eq!(booked.hour_summary(), "14 Uhr - 16 Uhr, 17 Uhr - 18 Uhr");
    }
}

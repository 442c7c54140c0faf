//! Accepted-hours statistics per task.

use serde::Serialize;

use super::BatchJobs;
use crate::domain::port_errors::{map_task_error, map_work_log_error};
use crate::domain::{Error, Hours, TaskId};

/// One line of the statistics output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub task_id: TaskId,
    pub task: String,
    /// Headcount times hours per person.
    pub requested_hours: Hours,
    pub accepted_hours: Hours,
    pub members: u32,
    /// Accepted hours per distinct member, rounded down to a tenth.
    pub average_hours: Hours,
}

impl BatchJobs {
    /// Statistics for every task with accepted work, ordered by task name.
    pub async fn task_statistics(&self) -> Result<Vec<TaskStatistics>, Error> {
        let totals = self
            .ports
            .work_logs
            .accepted_totals()
            .await
            .map_err(map_work_log_error)?;
        let mut lines = Vec::with_capacity(totals.len());
        for total in totals {
            let Some(task) = self
                .ports
                .tasks
                .find_by_id(&total.task_id)
                .await
                .map_err(map_task_error)?
            else {
                continue;
            };
            let average = match total.members {
                0 => Hours::ZERO,
                members => Hours::from_tenths(total.hours.tenths() / members),
            };
            lines.push(TaskStatistics {
                task_id: task.id,
                task: task.name.to_string(),
                requested_hours: task.hours_per_person.times(task.required_headcount),
                accepted_hours: total.hours,
                members: total.members,
                average_hours: average,
            });
        }
        lines.sort_by(|a, b| a.task.cmp(&b.task));
        Ok(lines)
    }
}

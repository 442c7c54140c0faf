//! Per-member workload ("Arbeitslast") against the yearly quota.
//!
//! Every query reads the store afresh. "Today" comes from the injected clock
//! so past and future splits are deterministic in tests.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ports::DomainPorts;
use super::port_errors::{
    map_assignment_error, map_member_error, map_preference_error, map_work_log_error,
};
use super::{AssignmentDetail, Error, Hours, Member, MemberId, WorkLog, WorkLogStatus};

/// Which assignments count towards assigned hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    /// Task date on or before today.
    Past,
    /// Task date after today.
    Future,
    /// Task without a date.
    Undated,
    All,
}

impl TimeFilter {
    /// Whether a task dated `date` passes the filter.
    #[must_use]
    pub fn admits(self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        match (self, date) {
            (Self::All, _) => true,
            (Self::Undated, None) => true,
            (Self::Past, Some(date)) => date <= today,
            (Self::Future, Some(date)) => date > today,
            _ => false,
        }
    }
}

/// Where a member stands with respect to the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStanding {
    /// Accepted hours reach the quota.
    Satisfied,
    /// Accepted, open and still-to-come hours together reach the quota.
    Satisfiable,
    Unreachable,
}

/// Snapshot of a member's hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadBalance {
    pub member_id: MemberId,
    pub quota: Hours,
    pub claimed: Hours,
    pub accepted: Hours,
    pub open: Hours,
    pub inquiry: Hours,
    pub rejected: Hours,
    pub assigned_past: Hours,
    pub assigned_future: Hours,
    pub assigned_undated: Hours,
}

impl WorkloadBalance {
    fn from_parts(
        member: &Member,
        logs: &[WorkLog],
        assignments: &[AssignmentDetail],
        today: NaiveDate,
    ) -> Self {
        let by_status = |status: WorkLogStatus| -> Hours {
            logs.iter()
                .filter(|log| log.status == status)
                .map(|log| log.hours)
                .sum()
        };
        let assigned = |filter: TimeFilter| assigned_hours(assignments, filter, today);
        Self {
            member_id: member.id,
            quota: member.quota,
            claimed: logs.iter().map(|log| log.hours).sum(),
            accepted: by_status(WorkLogStatus::Accepted),
            open: by_status(WorkLogStatus::Open),
            inquiry: by_status(WorkLogStatus::Inquiry),
            rejected: by_status(WorkLogStatus::Rejected),
            assigned_past: assigned(TimeFilter::Past),
            assigned_future: assigned(TimeFilter::Future),
            assigned_undated: assigned(TimeFilter::Undated),
        }
    }

    /// Accepted hours reach the quota.
    #[must_use]
    pub fn quota_satisfied(&self) -> bool {
        self.accepted >= self.quota
    }

    /// Not yet satisfied, but accepted + open + future + undated hours
    /// would reach the quota.
    #[must_use]
    pub fn quota_satisfiable(&self) -> bool {
        !self.quota_satisfied() && self.reachable() >= self.quota
    }

    #[must_use]
    pub fn standing(&self) -> QuotaStanding {
        if self.quota_satisfied() {
            QuotaStanding::Satisfied
        } else if self.quota_satisfiable() {
            QuotaStanding::Satisfiable
        } else {
            QuotaStanding::Unreachable
        }
    }

    fn reachable(&self) -> Hours {
        self.accepted + self.open + self.assigned_future + self.assigned_undated
    }
}

/// Sum of assignment contributions passing `filter`.
#[must_use]
pub fn assigned_hours(
    assignments: &[AssignmentDetail],
    filter: TimeFilter,
    today: NaiveDate,
) -> Hours {
    assignments
        .iter()
        .filter(|detail| filter.admits(detail.task.date, today))
        .map(AssignmentDetail::hours)
        .sum()
}

/// Read-only workload queries.
#[derive(Clone)]
pub struct WorkloadLedger {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
}

impl WorkloadLedger {
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    async fn logs(&self, member: &MemberId) -> Result<Vec<WorkLog>, Error> {
        self.ports
            .work_logs
            .list_for_member(member)
            .await
            .map_err(map_work_log_error)
    }

    async fn assignments(&self, member: &MemberId) -> Result<Vec<AssignmentDetail>, Error> {
        self.ports
            .assignments
            .list_for_member(member)
            .await
            .map_err(map_assignment_error)
    }

    /// Sum of all work-log hours regardless of status.
    pub async fn claimed_hours(&self, member: MemberId) -> Result<Hours, Error> {
        Ok(self.logs(&member).await?.iter().map(|log| log.hours).sum())
    }

    pub async fn hours_by_status(
        &self,
        member: MemberId,
        status: WorkLogStatus,
    ) -> Result<Hours, Error> {
        Ok(self
            .logs(&member)
            .await?
            .iter()
            .filter(|log| log.status == status)
            .map(|log| log.hours)
            .sum())
    }

    pub async fn assigned_hours(
        &self,
        member: MemberId,
        filter: TimeFilter,
    ) -> Result<Hours, Error> {
        let assignments = self.assignments(&member).await?;
        Ok(assigned_hours(&assignments, filter, self.today()))
    }

    /// Number of preferences other than "never".
    pub async fn preference_count(&self, member: MemberId) -> Result<usize, Error> {
        Ok(self
            .ports
            .preferences
            .list_for_member(&member)
            .await
            .map_err(map_preference_error)?
            .iter()
            .filter(|preference| preference.counts_as_submission())
            .count())
    }

    pub async fn assignment_count(&self, member: MemberId) -> Result<usize, Error> {
        Ok(self.assignments(&member).await?.len())
    }

    /// Full snapshot for one member.
    pub async fn balance(&self, member: MemberId) -> Result<WorkloadBalance, Error> {
        let record = self
            .ports
            .members
            .find_by_id(&member)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| Error::not_found(format!("member {member} not found")))?;
        let logs = self.logs(&member).await?;
        let assignments = self.assignments(&member).await?;
        Ok(WorkloadBalance::from_parts(
            &record,
            &logs,
            &assignments,
            self.today(),
        ))
    }

    /// Snapshots of all active members, optionally narrowed to a standing.
    pub async fn balances(
        &self,
        standing: Option<QuotaStanding>,
    ) -> Result<Vec<WorkloadBalance>, Error> {
        let members = self
            .ports
            .members
            .list_active()
            .await
            .map_err(map_member_error)?;
        let today = self.today();
        let mut balances = Vec::with_capacity(members.len());
        for member in &members {
            let logs = self.logs(&member.id).await?;
            let assignments = self.assignments(&member.id).await?;
            let balance = WorkloadBalance::from_parts(member, &logs, &assignments, today);
            if standing.is_none_or(|wanted| balance.standing() == wanted) {
                balances.push(balance);
            }
        }
        Ok(balances)
    }
}

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;

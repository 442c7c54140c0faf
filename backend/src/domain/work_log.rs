//! Self-reported work ("Leistungen") and their review lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Hours, MemberId, TaskId, WorkLogId};

/// Largest amount a single work log may claim.
pub const WORK_LOG_MAX_HOURS: Hours = Hours::from_tenths(999);

/// Review status of a work log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkLogStatus {
    /// Submitted, not yet reviewed.
    #[default]
    Open,
    /// Accepted by the board; counts towards the quota.
    Accepted,
    /// The board asked the member for clarification.
    Inquiry,
    /// Rejected by the board.
    Rejected,
}

impl WorkLogStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Accepted, Self::Inquiry, Self::Rejected];

    /// Two-letter storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Open => "OF",
            Self::Accepted => "AK",
            Self::Inquiry => "RU",
            Self::Rejected => "NE",
        }
    }

    /// German label used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Offen",
            Self::Accepted => "Akzeptiert",
            Self::Inquiry => "Rückfrage",
            Self::Rejected => "Abgelehnt",
        }
    }

    /// Accepted and rejected logs are frozen for the submitting member.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

/// Error returned for an unknown status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown work log status: {input}")]
pub struct ParseWorkLogStatusError {
    pub input: String,
}

impl std::str::FromStr for WorkLogStatus {
    type Err = ParseWorkLogStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| ParseWorkLogStatusError {
                input: s.to_owned(),
            })
    }
}

/// Validation errors for submitted work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkLogValidationError {
    #[error("hours must be greater than zero")]
    ZeroHours,
    #[error("hours must not exceed {max}")]
    TooManyHours { max: Hours },
}

/// Check the claimed amount of a work log.
pub fn validate_work_hours(hours: Hours) -> Result<(), WorkLogValidationError> {
    if hours == Hours::ZERO {
        return Err(WorkLogValidationError::ZeroHours);
    }
    if hours > WORK_LOG_MAX_HOURS {
        return Err(WorkLogValidationError::TooManyHours {
            max: WORK_LOG_MAX_HOURS,
        });
    }
    Ok(())
}

/// Hours a member reports for a task on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    pub id: WorkLogId,
    pub member_id: MemberId,
    pub task_id: TaskId,
    pub worked_on: NaiveDate,
    pub hours: Hours,
    pub status: WorkLogStatus,
    pub remark: String,
    pub board_remark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(WorkLogStatus::Open, false)]
    #[case(WorkLogStatus::Inquiry, false)]
    #[case(WorkLogStatus::Accepted, true)]
    #[case(WorkLogStatus::Rejected, true)]
    fn terminal_statuses(#[case] status: WorkLogStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[rstest]
    fn codes_parse_back() {
        for status in WorkLogStatus::ALL {
            assert_eq!(status.code().parse::<WorkLogStatus>(), Ok(status));
        }
        assert!("XX".parse::<WorkLogStatus>().is_err());
    }

    #[rstest]
    #[case(Hours::ZERO, Err(WorkLogValidationError::ZeroHours))]
    #[case(Hours::from_tenths(1), Ok(()))]
    #[case(Hours::from_tenths(999), Ok(()))]
    #[case(
        Hours::from_whole(100),
        Err(WorkLogValidationError::TooManyHours { max: WORK_LOG_MAX_HOURS })
    )]
    fn hour_bounds(#[case] hours: Hours, #[case] expected: Result<(), WorkLogValidationError>) {
        assert_eq!(validate_work_hours(hours), expected);
    }
}

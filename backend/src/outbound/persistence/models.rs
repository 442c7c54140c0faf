//! Internal Diesel row structs and their conversions.
//!
//! Rows never leave the persistence layer. Reading a row back into a domain
//! type re-validates the stored codes; a mismatch surfaces as
//! [`RowDecodeError`] and is reported by the repositories as a query error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Assignment, AssignmentId, HourSlot, Hours, Member, MemberId, NotificationState, Preference,
    PreferenceId, PreferenceLevel, Task, TaskGroup, TaskGroupId, TaskId, TaskName,
    TimeSlotRequirement, WorkLog, WorkLogId, WorkLogStatus,
};

use super::schema::{
    assignments, mail_outbox, members, preferences, task_groups, tasks, time_slot_assignments,
    time_slot_requirements, work_logs,
};

/// A stored value that no longer satisfies the domain rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {column} in stored row: {message}")]
pub(crate) struct RowDecodeError {
    pub column: &'static str,
    pub message: String,
}

impl RowDecodeError {
    fn new(column: &'static str, message: impl std::fmt::Display) -> Self {
        Self {
            column,
            message: message.to_string(),
        }
    }
}

/// A domain value outside the range its column can hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{column} value {value} does not fit the column")]
pub(crate) struct RowEncodeError {
    pub column: &'static str,
    pub value: String,
}

pub(crate) fn helpers_column(count: u16) -> Result<i16, RowEncodeError> {
    i16::try_from(count).map_err(|_| RowEncodeError {
        column: "extra_helpers",
        value: count.to_string(),
    })
}

pub(crate) fn hours_column(hours: Hours) -> i32 {
    i32::try_from(hours.tenths()).unwrap_or(i32::MAX)
}

pub(crate) fn count_column(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

pub(crate) fn hour_column(hour: HourSlot) -> i16 {
    i16::from(hour.hour())
}

pub(crate) fn decode_hours(column: &'static str, tenths: i32) -> Result<Hours, RowDecodeError> {
    u32::try_from(tenths)
        .map(Hours::from_tenths)
        .map_err(|err| RowDecodeError::new(column, err))
}

pub(crate) fn decode_count(column: &'static str, value: i32) -> Result<u32, RowDecodeError> {
    u32::try_from(value).map_err(|err| RowDecodeError::new(column, err))
}

pub(crate) fn decode_hour(hour: i16) -> Result<HourSlot, RowDecodeError> {
    HourSlot::new(i64::from(hour)).map_err(|err| RowDecodeError::new("hour", err))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub member_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub quota_tenths: i32,
    pub joined_on: NaiveDate,
    pub board: bool,
    pub active: bool,
    pub notification_pending: bool,
    pub notification_revision: i64,
    pub last_notified_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = RowDecodeError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MemberId::from_uuid(row.id),
            member_number: row.member_number,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            quota: decode_hours("quota_tenths", row.quota_tenths)?,
            joined_on: row.joined_on,
            board: row.board,
            active: row.active,
            notification: NotificationState {
                pending: row.notification_pending,
                revision: row.notification_revision,
                last_notified_at: row.last_notified_at,
            },
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = members)]
pub(crate) struct NewMemberRow<'a> {
    pub id: Uuid,
    pub member_number: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub quota_tenths: i32,
    pub joined_on: NaiveDate,
    pub board: bool,
    pub active: bool,
    pub notification_pending: bool,
    pub notification_revision: i64,
    pub last_notified_at: DateTime<Utc>,
}

impl<'a> From<&'a Member> for NewMemberRow<'a> {
    fn from(member: &'a Member) -> Self {
        Self {
            id: *member.id.as_uuid(),
            member_number: &member.member_number,
            first_name: &member.first_name,
            last_name: &member.last_name,
            email: member.email.as_deref(),
            quota_tenths: hours_column(member.quota),
            joined_on: member.joined_on,
            board: member.board,
            active: member.active,
            notification_pending: member.notification.pending,
            notification_revision: member.notification.revision,
            last_notified_at: member.notification.last_notified_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Task groups and tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskGroupRow {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub remark: String,
}

impl From<TaskGroupRow> for TaskGroup {
    fn from(row: TaskGroupRow) -> Self {
        Self {
            id: TaskGroupId::from_uuid(row.id),
            name: row.name,
            owner_id: MemberId::from_uuid(row.owner_id),
            remark: row.remark,
        }
    }
}

impl From<&TaskGroup> for TaskGroupRow {
    fn from(group: &TaskGroup) -> Self {
        Self {
            id: *group.id.as_uuid(),
            name: group.name.clone(),
            owner_id: *group.owner_id.as_uuid(),
            remark: group.remark.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub name: String,
    pub group_id: Uuid,
    pub required_headcount: i32,
    pub hours_per_person_tenths: i32,
    pub date: Option<NaiveDate>,
    pub owner_id: Uuid,
    pub team_lead_id: Option<Uuid>,
    pub remark: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = RowDecodeError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TaskId::from_uuid(row.id),
            name: TaskName::new(row.name).map_err(|err| RowDecodeError::new("name", err))?,
            group_id: TaskGroupId::from_uuid(row.group_id),
            required_headcount: decode_count("required_headcount", row.required_headcount)?,
            hours_per_person: decode_hours("hours_per_person_tenths", row.hours_per_person_tenths)?,
            date: row.date,
            owner_id: MemberId::from_uuid(row.owner_id),
            team_lead_id: row.team_lead_id.map(MemberId::from_uuid),
            remark: row.remark,
        })
    }
}

/// Insert and full-update shape of a task. `None` clears nullable columns.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TaskWriteRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub group_id: Uuid,
    pub required_headcount: i32,
    pub hours_per_person_tenths: i32,
    pub date: Option<NaiveDate>,
    pub owner_id: Uuid,
    pub team_lead_id: Option<Uuid>,
    pub remark: &'a str,
}

impl<'a> From<&'a Task> for TaskWriteRow<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: *task.id.as_uuid(),
            name: task.name.as_ref(),
            group_id: *task.group_id.as_uuid(),
            required_headcount: count_column(task.required_headcount),
            hours_per_person_tenths: hours_column(task.hours_per_person),
            date: task.date,
            owner_id: *task.owner_id.as_uuid(),
            team_lead_id: task.team_lead_id.map(|id| *id.as_uuid()),
            remark: &task.remark,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = time_slot_requirements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RequirementRow {
    pub task_id: Uuid,
    pub hour: i16,
    pub headcount: i32,
}

impl TryFrom<RequirementRow> for TimeSlotRequirement {
    type Error = RowDecodeError;

    fn try_from(row: RequirementRow) -> Result<Self, Self::Error> {
        Ok(Self {
            task_id: TaskId::from_uuid(row.task_id),
            hour: decode_hour(row.hour)?,
            headcount: decode_count("headcount", row.headcount)?,
        })
    }
}

impl From<&TimeSlotRequirement> for RequirementRow {
    fn from(requirement: &TimeSlotRequirement) -> Self {
        Self {
            task_id: *requirement.task_id.as_uuid(),
            hour: hour_column(requirement.hour),
            headcount: count_column(requirement.headcount),
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = preferences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PreferenceRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub task_id: Uuid,
    pub member_level: i16,
    pub board_level: i16,
    pub remarks: String,
    pub board_remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PreferenceRow> for Preference {
    type Error = RowDecodeError;

    fn try_from(row: PreferenceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PreferenceId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            task_id: TaskId::from_uuid(row.task_id),
            member_level: PreferenceLevel::try_from(row.member_level)
                .map_err(|err| RowDecodeError::new("member_level", err))?,
            board_level: PreferenceLevel::try_from(row.board_level)
                .map_err(|err| RowDecodeError::new("board_level", err))?,
            remarks: row.remarks,
            board_remarks: row.board_remarks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = preferences)]
pub(crate) struct NewPreferenceRow<'a> {
    pub id: Uuid,
    pub member_id: Uuid,
    pub task_id: Uuid,
    pub member_level: i16,
    pub board_level: i16,
    pub remarks: &'a str,
    pub board_remarks: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Preference> for NewPreferenceRow<'a> {
    fn from(preference: &'a Preference) -> Self {
        Self {
            id: *preference.id.as_uuid(),
            member_id: *preference.member_id.as_uuid(),
            task_id: *preference.task_id.as_uuid(),
            member_level: preference.member_level.code(),
            board_level: preference.board_level.code(),
            remarks: &preference.remarks,
            board_remarks: &preference.board_remarks,
            created_at: preference.created_at,
            updated_at: preference.updated_at,
        }
    }
}

/// Mutable columns of a preference; the (member, task) pair never changes.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = preferences)]
pub(crate) struct PreferenceUpdate<'a> {
    pub member_level: i16,
    pub board_level: i16,
    pub remarks: &'a str,
    pub board_remarks: &'a str,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Preference> for PreferenceUpdate<'a> {
    fn from(preference: &'a Preference) -> Self {
        Self {
            member_level: preference.member_level.code(),
            board_level: preference.board_level.code(),
            remarks: &preference.remarks,
            board_remarks: &preference.board_remarks,
            updated_at: preference.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Assignments and hour slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssignmentRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub task_id: Uuid,
    pub automatic: bool,
    pub extra_helpers: i16,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = RowDecodeError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AssignmentId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            task_id: TaskId::from_uuid(row.task_id),
            automatic: row.automatic,
            extra_helpers: u16::try_from(row.extra_helpers)
                .map_err(|err| RowDecodeError::new("extra_helpers", err))?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<&Assignment> for AssignmentRow {
    type Error = RowEncodeError;

    fn try_from(assignment: &Assignment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *assignment.id.as_uuid(),
            member_id: *assignment.member_id.as_uuid(),
            task_id: *assignment.task_id.as_uuid(),
            automatic: assignment.automatic,
            extra_helpers: helpers_column(assignment.extra_helpers)?,
            created_at: assignment.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = time_slot_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SlotRow {
    pub assignment_id: Uuid,
    pub hour: i16,
}

// ---------------------------------------------------------------------------
// Work logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = work_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WorkLogRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub task_id: Uuid,
    pub worked_on: NaiveDate,
    pub hours_tenths: i32,
    pub status: String,
    pub remark: String,
    pub board_remark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WorkLogRow> for WorkLog {
    type Error = RowDecodeError;

    fn try_from(row: WorkLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WorkLogId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            task_id: TaskId::from_uuid(row.task_id),
            worked_on: row.worked_on,
            hours: decode_hours("hours_tenths", row.hours_tenths)?,
            status: row
                .status
                .parse::<WorkLogStatus>()
                .map_err(|err| RowDecodeError::new("status", err))?,
            remark: row.remark,
            board_remark: row.board_remark,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = work_logs)]
pub(crate) struct WorkLogWriteRow<'a> {
    pub id: Uuid,
    pub member_id: Uuid,
    pub task_id: Uuid,
    pub worked_on: NaiveDate,
    pub hours_tenths: i32,
    pub status: &'static str,
    pub remark: &'a str,
    pub board_remark: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a WorkLog> for WorkLogWriteRow<'a> {
    fn from(log: &'a WorkLog) -> Self {
        Self {
            id: *log.id.as_uuid(),
            member_id: *log.member_id.as_uuid(),
            task_id: *log.task_id.as_uuid(),
            worked_on: log.worked_on,
            hours_tenths: hours_column(log.hours),
            status: log.status.code(),
            remark: &log.remark,
            board_remark: &log.board_remark,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Mail outbox
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mail_outbox)]
pub(crate) struct NewMailRow<'a> {
    pub id: Uuid,
    pub template: &'static str,
    pub recipients: Vec<Uuid>,
    pub context: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn work_log_row(status: &str, hours_tenths: i32) -> WorkLogRow {
        WorkLogRow {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            worked_on: NaiveDate::from_ymd_opt(2024, 5, 4).expect("valid date"),
            hours_tenths,
            status: status.to_owned(),
            remark: String::new(),
            board_remark: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[rstest]
    fn work_log_rows_decode_status_codes() {
        let log = WorkLog::try_from(work_log_row("AK", 25)).expect("valid row");
        assert_eq!(log.status, WorkLogStatus::Accepted);
        assert_eq!(log.hours, Hours::from_tenths(25));
    }

    #[rstest]
    #[case("XX", 10, "status")]
    #[case("OF", -5, "hours_tenths")]
    fn corrupt_work_log_rows_name_the_column(
        #[case] status: &str,
        #[case] hours: i32,
        #[case] column: &str,
    ) {
        let err = WorkLog::try_from(work_log_row(status, hours)).expect_err("corrupt row");
        assert_eq!(err.column, column);
    }

    #[rstest]
    fn hour_slots_outside_the_day_are_rejected() {
        assert!(decode_hour(24).is_err());
        assert_eq!(decode_hour(9).map(HourSlot::hour), Ok(9));
    }

    #[rstest]
    fn helper_counts_beyond_smallint_are_not_clamped() {
        assert_eq!(helpers_column(32_767), Ok(i16::MAX));
        let err = helpers_column(32_768).expect_err("out of range");
        assert_eq!(err.column, "extra_helpers");
        assert_eq!(err.value, "32768");
    }

    #[rstest]
    fn oversized_counts_saturate_on_write() {
        assert_eq!(count_column(u32::MAX), i32::MAX);
        assert_eq!(hours_column(Hours::from_tenths(35)), 35);
    }
}

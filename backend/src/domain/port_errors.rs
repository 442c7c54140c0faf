//! Translation of port errors into domain [`Error`]s.
//!
//! Connection failures become `service_unavailable`, query failures become
//! `internal`; port-specific variants map to the caller-facing code that
//! names the offending record.

use serde_json::json;
use tracing::{error, warn};

use super::Error;
use super::ports::{
    AssignmentRepositoryError, MailQueueError, MaintenanceRepositoryError, MemberRepositoryError,
    NotificationFlagError, PreferenceRepositoryError, TaskRepositoryError, WorkLogRepositoryError,
};

fn unavailable(port: &str, message: &str) -> Error {
    warn!(port, message, "store unavailable");
    Error::service_unavailable(format!("{port} unavailable: {message}"))
}

fn failed(port: &str, message: &str) -> Error {
    error!(port, message, "store query failed");
    Error::internal(format!("{port} error: {message}"))
}

pub(crate) fn map_member_error(err: MemberRepositoryError) -> Error {
    match err {
        MemberRepositoryError::Connection { message } => unavailable("member repository", &message),
        MemberRepositoryError::Query { message } => failed("member repository", &message),
        MemberRepositoryError::DuplicateMemberNumber { member_number } => {
            Error::conflict(format!("member number {member_number} is already registered"))
                .with_details(json!({ "field": "memberNumber", "value": member_number }))
        }
    }
}

pub(crate) fn map_notification_error(err: NotificationFlagError) -> Error {
    match err {
        NotificationFlagError::Connection { message } => {
            unavailable("notification flag store", &message)
        }
        NotificationFlagError::Query { message } => failed("notification flag store", &message),
        NotificationFlagError::UnknownMember { member_id } => {
            Error::not_found(format!("member {member_id} not found"))
                .with_details(json!({ "memberId": member_id }))
        }
    }
}

pub(crate) fn map_task_error(err: TaskRepositoryError) -> Error {
    match err {
        TaskRepositoryError::Connection { message } => unavailable("task repository", &message),
        TaskRepositoryError::Query { message } => failed("task repository", &message),
        TaskRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("a task named {name} already exists"))
                .with_details(json!({ "field": "name", "value": name }))
        }
        TaskRepositoryError::TaskInUse { task_id } => {
            Error::conflict("cannot delete, still in use")
                .with_details(json!({ "taskId": task_id, "reason": "work_logs_reference_task" }))
        }
        TaskRepositoryError::UnknownGroup { group_id } => {
            Error::invalid_request(format!("task group {group_id} does not exist"))
                .with_details(json!({ "field": "groupId", "value": group_id }))
        }
    }
}

pub(crate) fn map_preference_error(err: PreferenceRepositoryError) -> Error {
    match err {
        PreferenceRepositoryError::Connection { message } => {
            unavailable("preference repository", &message)
        }
        PreferenceRepositoryError::Query { message } => failed("preference repository", &message),
        PreferenceRepositoryError::MissingReference { message } => {
            Error::not_found(format!("preference references a missing record: {message}"))
        }
    }
}

pub(crate) fn map_assignment_error(err: AssignmentRepositoryError) -> Error {
    match err {
        AssignmentRepositoryError::Connection { message } => {
            unavailable("assignment repository", &message)
        }
        AssignmentRepositoryError::Query { message } => failed("assignment repository", &message),
        AssignmentRepositoryError::MissingAssignment { member_id, task_id } => {
            Error::invalid_request(format!(
                "member {member_id} has no assignment for task {task_id}"
            ))
            .with_details(json!({ "memberId": member_id, "taskId": task_id }))
        }
        AssignmentRepositoryError::MissingReference { message } => {
            Error::invalid_request(format!("assignment references a missing record: {message}"))
        }
    }
}

pub(crate) fn map_work_log_error(err: WorkLogRepositoryError) -> Error {
    match err {
        WorkLogRepositoryError::Connection { message } => {
            unavailable("work log repository", &message)
        }
        WorkLogRepositoryError::Query { message } => failed("work log repository", &message),
        WorkLogRepositoryError::MissingReference { message } => {
            Error::invalid_request(format!("work log references a missing record: {message}"))
        }
        WorkLogRepositoryError::Vanished { work_log_id } => {
            Error::not_found(format!("work log {work_log_id} not found"))
                .with_details(json!({ "workLogId": work_log_id }))
        }
    }
}

pub(crate) fn map_maintenance_error(err: MaintenanceRepositoryError) -> Error {
    match err {
        MaintenanceRepositoryError::Connection { message } => {
            unavailable("maintenance repository", &message)
        }
        MaintenanceRepositoryError::Query { message } => failed("maintenance repository", &message),
    }
}

pub(crate) fn map_mail_error(err: MailQueueError) -> Error {
    match err {
        MailQueueError::Connection { message } => unavailable("mail queue", &message),
        MailQueueError::Query { message } => failed("mail queue", &message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn task_in_use_is_a_conflict_naming_the_task() {
        let err = map_task_error(TaskRepositoryError::task_in_use("t-1"));
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.message(), "cannot delete, still in use");
        assert_eq!(
            err.details().and_then(|d| d.get("taskId")).and_then(|v| v.as_str()),
            Some("t-1")
        );
    }

    #[rstest]
    #[case(MemberRepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(MemberRepositoryError::query("bad sql"), ErrorCode::InternalError)]
    #[case(MemberRepositoryError::duplicate_member_number("17"), ErrorCode::Conflict)]
    fn member_errors_map_to_codes(#[case] err: MemberRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_member_error(err).code(), code);
    }

    #[rstest]
    fn missing_assignment_is_a_validation_error() {
        let err = map_assignment_error(AssignmentRepositoryError::missing_assignment("m", "t"));
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(err.message().contains("has no assignment"));
    }
}

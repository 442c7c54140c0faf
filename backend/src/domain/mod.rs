//! Domain primitives, aggregates and use cases.
//!
//! Purpose: model members, tasks, preferences, assignments, hour slots and
//! work logs, and implement the club work-plan use cases on top of the
//! driven ports in [`ports`]. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Value types: [`Hours`], [`HourSlot`], [`HourInterval`] and the typed ids.
//! - Entities: [`Member`], [`Task`], [`Preference`], [`Assignment`],
//!   [`WorkLog`], [`OutgoingMail`].
//! - Services: [`PreferenceRegistry`], [`AssignmentReconciler`],
//!   [`TimeSlotEditor`], [`WorkloadLedger`], [`TaskAdministration`],
//!   [`WorkLogService`], [`MemberDirectory`], [`BatchJobs`].
//! - Errors: [`Error`] and [`ErrorCode`].

pub mod error;
pub mod jobs;
pub mod ports;

mod assignment;
mod hour_interval;
mod hours;
mod ids;
mod mail;
mod member;
mod member_directory;
mod port_errors;
mod preference;
mod preference_registry;
mod reconciler;
mod task;
mod task_admin;
mod time_slot_editor;
mod trace_id;
mod work_log;
mod work_log_service;
mod workload;

pub use self::assignment::{
    Assignment, AssignmentDetail, MAX_EXTRA_HELPERS, TimeSlotAssignment,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::hour_interval::{
    HourInterval, HourIntervalError, HourSlot, SCHEDULE_FIRST_HOUR, SCHEDULE_LAST_HOUR, compress,
    compress_markers, format_intervals,
};
pub use self::hours::{Hours, HoursError};
pub use self::ids::{AssignmentId, MemberId, PreferenceId, TaskGroupId, TaskId, WorkLogId};
pub use self::jobs::{BatchJobs, JobSettings};
pub use self::mail::{MailTemplate, OutgoingMail};
pub use self::member::{
    Actor, CODED_QUOTA_THRESHOLD, DEFAULT_QUOTA, Member, NotificationState, never_notified,
};
pub use self::member_directory::MemberDirectory;
pub use self::preference::{
    ParsePreferenceLevelError, Preference, PreferenceChange, PreferenceLevel,
    QUICK_PREFERENCE_REMARK,
};
pub use self::preference_registry::PreferenceRegistry;
pub use self::reconciler::{
    AppliedReconciliation, AssignmentReconciler, ReconciliationOutcome, ReconciliationPlan,
    TaskSelection, plan_reconciliation,
};
pub use self::task::{
    HourCoverage, TASK_GROUP_NAME_MAX, TASK_NAME_MAX, Task, TaskGroup, TaskName,
    TaskValidationError, TimeSlotRequirement,
};
pub use self::task_admin::{
    HourRequirement, TaskAdministration, TaskDraft, TaskGroupDraft, TaskStaffing, hour_coverage,
};
pub use self::time_slot_editor::{
    AppliedTimeSlotPlan, MemberHour, SlotChange, SlotSelection, TimeSlotEditor, TimeSlotPlan,
    TimeSlotPlanError, TimeSlotSubmission, plan_time_slots,
};
pub use self::trace_id::TraceId;
pub use self::work_log::{
    ParseWorkLogStatusError, WORK_LOG_MAX_HOURS, WorkLog, WorkLogStatus, WorkLogValidationError,
    validate_work_hours,
};
pub use self::work_log_service::{WorkLogDraft, WorkLogReview, WorkLogService};
pub use self::workload::{
    QuotaStanding, TimeFilter, WorkloadBalance, WorkloadLedger, assigned_hours,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use arbeitsplan::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

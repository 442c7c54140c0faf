//! OpenAPI documentation for the work plan API.
//!
//! Served by Swagger UI in debug builds and written to stdout by the
//! `openapi-dump` binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AppliedTimeSlotPlan, Error, ErrorCode, HourRequirement, Preference, PreferenceLevel,
    QuotaStanding, ReconciliationOutcome, Task, TaskGroup, TaskSelection, TaskStaffing,
    TimeSlotSubmission, WorkLog, WorkLogStatus, WorkloadBalance,
};
use crate::inbound::http::{assignments, health, preferences, tasks, work_logs, workload};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie carrying the logged-in member id.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Arbeitsplan API",
        description = "Club work plan: tasks, preferences, assignments, hour slots and work logs."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        tasks::list_tasks,
        tasks::create_task,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::replace_schedule,
        tasks::staffing,
        tasks::list_groups,
        tasks::create_group,
        preferences::list_own,
        preferences::get_or_create,
        preferences::quick,
        preferences::update_own,
        preferences::update_board,
        assignments::reconcile_task,
        assignments::reconcile_many,
        assignments::submit_time_slots,
        work_logs::list_own,
        work_logs::list_reviewable,
        work_logs::submit,
        work_logs::update_own,
        work_logs::delete_own,
        work_logs::review,
        workload::own_balance,
        workload::member_balance,
        workload::balances,
        health::ready,
        health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Task,
        TaskGroup,
        TaskStaffing,
        HourRequirement,
        Preference,
        PreferenceLevel,
        TaskSelection,
        ReconciliationOutcome,
        TimeSlotSubmission,
        AppliedTimeSlotPlan,
        WorkLog,
        WorkLogStatus,
        WorkloadBalance,
        QuotaStanding,
        workload::WorkloadResponse,
        preferences::MemberPreferenceRequest,
        preferences::BoardPreferenceRequest,
        assignments::AssigneesRequest,
    )),
    tags(
        (name = "tasks", description = "Tasks, groups and hour schedules"),
        (name = "preferences", description = "Member and board ratings of tasks"),
        (name = "assignments", description = "Assigning members to tasks and hours"),
        (name = "work-logs", description = "Reported and reviewed hours"),
        (name = "workload", description = "Hours against the yearly quota"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    #[rstest]
    #[case("/api/v1/tasks")]
    #[case("/api/v1/tasks/{task_id}/assignments")]
    #[case("/api/v1/tasks/{task_id}/time-slots")]
    #[case("/api/v1/preferences/{preference_id}")]
    #[case("/api/v1/work-logs/{work_log_id}/review")]
    #[case("/api/v1/workload")]
    #[case("/health/ready")]
    fn documents_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn error_schema_exposes_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        match schemas.get("Error").expect("Error schema") {
            RefOr::T(Schema::Object(object)) => {
                assert!(object.properties.contains_key("code"));
                assert!(object.properties.contains_key("message"));
            }
            other => panic!("unexpected schema shape: {other:?}"),
        }
    }

    #[rstest]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}

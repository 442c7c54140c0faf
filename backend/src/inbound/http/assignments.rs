//! Board endpoints for assigning members to tasks and hour slots.
//!
//! ```text
//! PUT  /api/v1/tasks/{task_id}/assignments
//! POST /api/v1/assignments/reconcile
//! PUT  /api/v1/tasks/{task_id}/time-slots
//! ```

use std::collections::BTreeSet;

use actix_web::{post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ApiResult, AppliedTimeSlotPlan, Error, MemberId, ReconciliationOutcome, TaskId, TaskSelection,
    TimeSlotSubmission,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Desired assignees of the task in the path.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssigneesRequest {
    pub desired_member_ids: BTreeSet<MemberId>,
}

/// Make the assignees of one task match the submitted set.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}/assignments",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    request_body = AssigneesRequest,
    responses(
        (
            status = 200,
            description = "Created, deleted and flagged members",
            body = ReconciliationOutcome
        ),
        (status = 400, description = "Unknown member", body = Error),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "reconcileTaskAssignments"
)]
#[put("/tasks/{task_id}/assignments")]
pub async fn reconcile_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
    payload: web::Json<AssigneesRequest>,
) -> ApiResult<web::Json<ReconciliationOutcome>> {
    let actor = session.require_actor(&state.members).await?;
    let selection = TaskSelection {
        task_id: path.into_inner(),
        desired_member_ids: payload.into_inner().desired_member_ids,
    };
    Ok(web::Json(state.reconciler.reconcile(&actor, selection).await?))
}

/// Reconcile several tasks in submission order.
///
/// Stops at the first failing task; earlier tasks stay committed.
#[utoipa::path(
    post,
    path = "/api/v1/assignments/reconcile",
    request_body = [TaskSelection],
    responses(
        (status = 200, description = "One outcome per task", body = [ReconciliationOutcome]),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "reconcileAssignments"
)]
#[post("/assignments/reconcile")]
pub async fn reconcile_many(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<Vec<TaskSelection>>,
) -> ApiResult<web::Json<Vec<ReconciliationOutcome>>> {
    let actor = session.require_actor(&state.members).await?;
    let outcomes = state
        .reconciler
        .reconcile_many(&actor, payload.into_inner())
        .await?;
    Ok(web::Json(outcomes))
}

/// Apply a ticked/unticked hour grid for one task.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}/time-slots",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    request_body = TimeSlotSubmission,
    responses(
        (status = 200, description = "Applied slot changes", body = AppliedTimeSlotPlan),
        (status = 400, description = "Hour or member outside the plan", body = Error),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "submitTimeSlots"
)]
#[put("/tasks/{task_id}/time-slots")]
pub async fn submit_time_slots(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
    payload: web::Json<TimeSlotSubmission>,
) -> ApiResult<web::Json<AppliedTimeSlotPlan>> {
    let actor = session.require_actor(&state.members).await?;
    let applied = state
        .time_slots
        .submit(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(applied))
}

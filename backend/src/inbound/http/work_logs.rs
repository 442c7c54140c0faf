//! Work log ("Leistung") endpoints.
//!
//! ```text
//! GET    /api/v1/members/me/work-logs
//! POST   /api/v1/work-logs
//! PUT    /api/v1/work-logs/{work_log_id}
//! DELETE /api/v1/work-logs/{work_log_id}
//! GET    /api/v1/work-logs/reviewable
//! PUT    /api/v1/work-logs/{work_log_id}/review
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{ApiResult, Error, WorkLog, WorkLogDraft, WorkLogId, WorkLogReview};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/v1/members/me/work-logs",
    responses(
        (status = 200, description = "The member's work logs, newest first", body = [WorkLog]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "listOwnWorkLogs"
)]
#[get("/members/me/work-logs")]
pub async fn list_own(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<WorkLog>>> {
    let actor = session.require_actor(&state.members).await?;
    Ok(web::Json(
        state.work_logs.list_for_member(actor.member_id).await?,
    ))
}

/// Report hours worked on a task. The log starts out open.
#[utoipa::path(
    post,
    path = "/api/v1/work-logs",
    request_body = WorkLogDraft,
    responses(
        (status = 201, description = "Recorded work log", body = WorkLog),
        (status = 400, description = "Invalid hours or unknown task", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "submitWorkLog"
)]
#[post("/work-logs")]
pub async fn submit(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<WorkLogDraft>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor(&state.members).await?;
    let log = state.work_logs.submit(&actor, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(log))
}

/// Edit an own, not yet accepted work log. Editing reopens it.
#[utoipa::path(
    put,
    path = "/api/v1/work-logs/{work_log_id}",
    params(("work_log_id" = WorkLogId, Path, description = "Work log identifier")),
    request_body = WorkLogDraft,
    responses(
        (status = 200, description = "Updated work log", body = WorkLog),
        (status = 400, description = "Invalid hours or already reviewed", body = Error),
        (status = 403, description = "Not the member's log", body = Error),
        (status = 404, description = "Unknown work log", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "updateWorkLog"
)]
#[put("/work-logs/{work_log_id}")]
pub async fn update_own(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<WorkLogId>,
    payload: web::Json<WorkLogDraft>,
) -> ApiResult<web::Json<WorkLog>> {
    let actor = session.require_actor(&state.members).await?;
    let log = state
        .work_logs
        .update_own(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(log))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-logs/{work_log_id}",
    params(("work_log_id" = WorkLogId, Path, description = "Work log identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Already reviewed", body = Error),
        (status = 403, description = "Not the member's log", body = Error),
        (status = 404, description = "Unknown work log", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "deleteWorkLog"
)]
#[delete("/work-logs/{work_log_id}")]
pub async fn delete_own(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<WorkLogId>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor(&state.members).await?;
    state.work_logs.delete_own(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Logs on tasks the member owns or leads; every log for the board.
#[utoipa::path(
    get,
    path = "/api/v1/work-logs/reviewable",
    responses(
        (status = 200, description = "Work logs awaiting a decision", body = [WorkLog]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "listReviewableWorkLogs"
)]
#[get("/work-logs/reviewable")]
pub async fn list_reviewable(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<WorkLog>>> {
    let actor = session.require_actor(&state.members).await?;
    Ok(web::Json(state.work_logs.list_reviewable(&actor).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-logs/{work_log_id}/review",
    params(("work_log_id" = WorkLogId, Path, description = "Work log identifier")),
    request_body = WorkLogReview,
    responses(
        (status = 200, description = "Reviewed work log", body = WorkLog),
        (status = 403, description = "Not allowed to review this log", body = Error),
        (status = 404, description = "Unknown work log", body = Error)
    ),
    tags = ["work-logs"],
    operation_id = "reviewWorkLog"
)]
#[put("/work-logs/{work_log_id}/review")]
pub async fn review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<WorkLogId>,
    payload: web::Json<WorkLogReview>,
) -> ApiResult<web::Json<WorkLog>> {
    let actor = session.require_actor(&state.members).await?;
    let log = state
        .work_logs
        .review(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(log))
}

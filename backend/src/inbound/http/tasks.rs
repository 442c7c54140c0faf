//! Task and task-group administration endpoints.
//!
//! ```text
//! GET    /api/v1/tasks
//! POST   /api/v1/tasks
//! GET    /api/v1/tasks/{task_id}
//! PUT    /api/v1/tasks/{task_id}
//! DELETE /api/v1/tasks/{task_id}
//! PUT    /api/v1/tasks/{task_id}/schedule
//! GET    /api/v1/tasks/{task_id}/staffing
//! GET    /api/v1/task-groups
//! POST   /api/v1/task-groups
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{
    ApiResult, Error, HourRequirement, Task, TaskDraft, TaskGroup, TaskGroupDraft, TaskId,
    TaskStaffing, TimeSlotRequirement,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// All tasks ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Tasks", body = [Task]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listTasks"
)]
#[get("/tasks")]
pub async fn list_tasks(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Task>>> {
    session.require_actor(&state.members).await?;
    Ok(web::Json(state.tasks.list_tasks().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task", body = Task),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "getTask"
)]
#[get("/tasks/{task_id}")]
pub async fn get_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
) -> ApiResult<web::Json<Task>> {
    session.require_actor(&state.members).await?;
    Ok(web::Json(state.tasks.find_task(path.into_inner()).await?))
}

/// Create a task. Board members only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = TaskDraft,
    responses(
        (status = 201, description = "Created task", body = Task),
        (status = 400, description = "Invalid draft", body = Error),
        (status = 403, description = "Not a board member", body = Error),
        (status = 409, description = "Name already taken", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "createTask"
)]
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TaskDraft>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor(&state.members).await?;
    let task = state.tasks.create_task(&actor, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    request_body = TaskDraft,
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 400, description = "Invalid draft", body = Error),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "updateTask"
)]
#[put("/tasks/{task_id}")]
pub async fn update_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
    payload: web::Json<TaskDraft>,
) -> ApiResult<web::Json<Task>> {
    let actor = session.require_actor(&state.members).await?;
    let task = state
        .tasks
        .update_task(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(task))
}

/// Delete a task. Refused while work logs reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{task_id}",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the task owner", body = Error),
        (status = 404, description = "Unknown task", body = Error),
        (status = 409, description = "Cannot delete, still in use", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "deleteTask"
)]
#[delete("/tasks/{task_id}")]
pub async fn delete_task(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor(&state.members).await?;
    state.tasks.delete_task(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace the per-hour headcount schedule of a task.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}/schedule",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    request_body = [HourRequirement],
    responses(
        (status = 200, description = "Stored schedule", body = [TimeSlotRequirement]),
        (status = 400, description = "Hour outside the schedule window", body = Error),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "replaceTaskSchedule"
)]
#[put("/tasks/{task_id}/schedule")]
pub async fn replace_schedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
    payload: web::Json<Vec<HourRequirement>>,
) -> ApiResult<web::Json<Vec<TimeSlotRequirement>>> {
    let actor = session.require_actor(&state.members).await?;
    let schedule = state
        .tasks
        .replace_schedule(&actor, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{task_id}/staffing",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Assigned vs. required headcount", body = TaskStaffing),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "getTaskStaffing"
)]
#[get("/tasks/{task_id}/staffing")]
pub async fn staffing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
) -> ApiResult<web::Json<TaskStaffing>> {
    session.require_actor(&state.members).await?;
    Ok(web::Json(state.tasks.staffing(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/task-groups",
    responses(
        (status = 200, description = "Task groups", body = [TaskGroup]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listTaskGroups"
)]
#[get("/task-groups")]
pub async fn list_groups(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TaskGroup>>> {
    session.require_actor(&state.members).await?;
    Ok(web::Json(state.tasks.list_groups().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/task-groups",
    request_body = TaskGroupDraft,
    responses(
        (status = 201, description = "Created group", body = TaskGroup),
        (status = 400, description = "Invalid draft", body = Error),
        (status = 403, description = "Not a board member", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "createTaskGroup"
)]
#[post("/task-groups")]
pub async fn create_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TaskGroupDraft>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_actor(&state.members).await?;
    let group = state.tasks.create_group(&actor, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(group))
}

//! Preference ("Meldung") endpoints.
//!
//! ```text
//! GET   /api/v1/members/me/preferences
//! POST  /api/v1/tasks/{task_id}/preference
//! POST  /api/v1/tasks/{task_id}/quick-preference
//! PATCH /api/v1/preferences/{preference_id}
//! PATCH /api/v1/preferences/{preference_id}/board
//! ```

use actix_web::{get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{ApiResult, Error, Preference, PreferenceId, PreferenceLevel, TaskId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Member-side changes; absent fields stay as they are.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberPreferenceRequest {
    pub member_level: Option<PreferenceLevel>,
    pub remarks: Option<String>,
}

/// Board-side changes; absent fields stay as they are.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardPreferenceRequest {
    pub board_level: Option<PreferenceLevel>,
    pub board_remarks: Option<String>,
}

fn empty_update_error(fields: [&str; 2]) -> Error {
    Error::invalid_request("request changes nothing").with_details(json!({
        "fields": fields,
        "code": "empty_update",
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/members/me/preferences",
    responses(
        (status = 200, description = "The member's preferences", body = [Preference]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["preferences"],
    operation_id = "listOwnPreferences"
)]
#[get("/members/me/preferences")]
pub async fn list_own(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Preference>>> {
    let actor = session.require_actor(&state.members).await?;
    Ok(web::Json(
        state.preferences.list_for_member(actor.member_id).await?,
    ))
}

/// Fetch the member's preference for a task, creating a default one.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/preference",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Existing or new preference", body = Preference),
        (status = 400, description = "Unknown task", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["preferences"],
    operation_id = "getOrCreatePreference"
)]
#[post("/tasks/{task_id}/preference")]
pub async fn get_or_create(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
) -> ApiResult<web::Json<Preference>> {
    let actor = session.require_actor(&state.members).await?;
    let preference = state
        .preferences
        .get_or_create(actor.member_id, path.into_inner())
        .await?;
    Ok(web::Json(preference))
}

/// One-click "count me in" for a task.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{task_id}/quick-preference",
    params(("task_id" = TaskId, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Preference rated gladly", body = Preference),
        (status = 400, description = "Task already took place", body = Error),
        (status = 404, description = "Unknown task", body = Error)
    ),
    tags = ["preferences"],
    operation_id = "quickPreference"
)]
#[post("/tasks/{task_id}/quick-preference")]
pub async fn quick(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TaskId>,
) -> ApiResult<web::Json<Preference>> {
    let actor = session.require_actor(&state.members).await?;
    let preference = state
        .preferences
        .quick_preference(&actor, path.into_inner())
        .await?;
    Ok(web::Json(preference))
}

/// Change the member's own rating and remark.
#[utoipa::path(
    patch,
    path = "/api/v1/preferences/{preference_id}",
    params(("preference_id" = PreferenceId, Path, description = "Preference identifier")),
    request_body = MemberPreferenceRequest,
    responses(
        (status = 200, description = "Updated preference", body = Preference),
        (status = 400, description = "Withdrawal while assigned", body = Error),
        (status = 403, description = "Not the member's preference", body = Error),
        (status = 404, description = "Unknown preference", body = Error)
    ),
    tags = ["preferences"],
    operation_id = "updateOwnPreference"
)]
#[patch("/preferences/{preference_id}")]
pub async fn update_own(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<PreferenceId>,
    payload: web::Json<MemberPreferenceRequest>,
) -> ApiResult<web::Json<Preference>> {
    let actor = session.require_actor(&state.members).await?;
    let id = path.into_inner();
    let MemberPreferenceRequest {
        member_level,
        remarks,
    } = payload.into_inner();

    let mut updated = None;
    if let Some(level) = member_level {
        updated = Some(
            state
                .preferences
                .update_member_preference(&actor, id, level)
                .await?,
        );
    }
    if let Some(remarks) = remarks {
        updated = Some(state.preferences.update_remarks(&actor, id, remarks).await?);
    }
    updated
        .map(web::Json)
        .ok_or_else(|| empty_update_error(["memberLevel", "remarks"]))
}

/// Set the board's counter-rating. Board members only.
#[utoipa::path(
    patch,
    path = "/api/v1/preferences/{preference_id}/board",
    params(("preference_id" = PreferenceId, Path, description = "Preference identifier")),
    request_body = BoardPreferenceRequest,
    responses(
        (status = 200, description = "Updated preference", body = Preference),
        (status = 403, description = "Not a board member", body = Error),
        (status = 404, description = "Unknown preference", body = Error)
    ),
    tags = ["preferences"],
    operation_id = "updateBoardPreference"
)]
#[patch("/preferences/{preference_id}/board")]
pub async fn update_board(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<PreferenceId>,
    payload: web::Json<BoardPreferenceRequest>,
) -> ApiResult<web::Json<Preference>> {
    let actor = session.require_actor(&state.members).await?;
    let id = path.into_inner();
    let BoardPreferenceRequest {
        board_level,
        board_remarks,
    } = payload.into_inner();

    let mut updated = None;
    if let Some(level) = board_level {
        updated = Some(
            state
                .preferences
                .update_board_preference(&actor, id, level)
                .await?,
        );
    }
    if let Some(remarks) = board_remarks {
        updated = Some(
            state
                .preferences
                .update_board_remarks(&actor, id, remarks)
                .await?,
        );
    }
    updated
        .map(web::Json)
        .ok_or_else(|| empty_update_error(["boardLevel", "boardRemarks"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;
    use rstest::rstest;

    use crate::domain::{Assignment, ErrorCode, QUICK_PREFERENCE_REMARK};
    use crate::inbound::http::test_utils::{api_app, http_state, login_request, session_cookie};
    use crate::test_support::InMemoryStore;
    use crate::test_support::fixtures::{board_member, date, group, member, task};

    #[rstest]
    #[actix_web::test]
    async fn repeated_get_or_create_returns_one_record() {
        let store = InMemoryStore::new();
        let chair = store.seed_member(board_member("Vera"));
        let helper = store.seed_member(member("Paul"));
        let mowing = store.seed_task(task("Rasen mähen", &store.seed_group(group(&chair))));
        let app = test::init_service(api_app(http_state(&store, date(2024, 5, 1)))).await;
        let cookie =
            session_cookie(&test::call_service(&app, login_request(helper.id).to_request()).await);

        let mut ids = Vec::new();
        for _ in 0..2 {
            let res = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(&format!("/api/v1/tasks/{}/preference", mowing.id))
                    .cookie(cookie.clone())
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
            let body: Preference = test::read_body_json(res).await;
            assert_eq!(body.member_level, PreferenceLevel::Ok);
            ids.push(body.id);
        }

        assert_eq!(ids[0], ids[1]);
        assert_eq!(store.preferences().len(), 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn withdrawal_while_assigned_is_rejected() {
        let store = InMemoryStore::new();
        let chair = store.seed_member(board_member("Vera"));
        let helper = store.seed_member(member("Paul"));
        let mowing = store.seed_task(task("Rasen mähen", &store.seed_group(group(&chair))));
        let preference = store.seed_preference(Preference::with_defaults(
            helper.id,
            mowing.id,
            Utc::now(),
        ));
        store.seed_assignment(Assignment::new(helper.id, mowing.id, Utc::now()));
        let app = test::init_service(api_app(http_state(&store, date(2024, 5, 1)))).await;
        let cookie =
            session_cookie(&test::call_service(&app, login_request(helper.id).to_request()).await);

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/v1/preferences/{}", preference.id))
                .cookie(cookie)
                .set_json(MemberPreferenceRequest {
                    member_level: Some(PreferenceLevel::Never),
                    remarks: None,
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Error = test::read_body_json(res).await;
        assert_eq!(body.code(), ErrorCode::InvalidRequest);
        assert_eq!(store.preferences()[0].member_level, PreferenceLevel::Ok);
    }

    #[rstest]
    #[actix_web::test]
    async fn empty_updates_are_rejected() {
        let store = InMemoryStore::new();
        let helper = store.seed_member(member("Paul"));
        let app = test::init_service(api_app(http_state(&store, date(2024, 5, 1)))).await;
        let cookie =
            session_cookie(&test::call_service(&app, login_request(helper.id).to_request()).await);

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/v1/preferences/{}", PreferenceId::random()))
                .cookie(cookie)
                .set_json(MemberPreferenceRequest::default())
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn quick_preference_marks_the_remark() {
        let store = InMemoryStore::new();
        let chair = store.seed_member(board_member("Vera"));
        let helper = store.seed_member(member("Paul"));
        let mowing = store.seed_task(task("Rasen mähen", &store.seed_group(group(&chair))));
        let app = test::init_service(api_app(http_state(&store, date(2024, 5, 1)))).await;
        let cookie =
            session_cookie(&test::call_service(&app, login_request(helper.id).to_request()).await);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/tasks/{}/quick-preference", mowing.id))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Preference = test::read_body_json(res).await;
        assert_eq!(body.member_level, PreferenceLevel::Gladly);
        assert_eq!(body.remarks, QUICK_PREFERENCE_REMARK);
    }

    #[rstest]
    #[actix_web::test]
    async fn members_cannot_set_the_board_rating() {
        let store = InMemoryStore::new();
        let chair = store.seed_member(board_member("Vera"));
        let helper = store.seed_member(member("Paul"));
        let mowing = store.seed_task(task("Rasen mähen", &store.seed_group(group(&chair))));
        let preference = store.seed_preference(Preference::with_defaults(
            helper.id,
            mowing.id,
            Utc::now(),
        ));
        let app = test::init_service(api_app(http_state(&store, date(2024, 5, 1)))).await;
        let cookie =
            session_cookie(&test::call_service(&app, login_request(helper.id).to_request()).await);

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/v1/preferences/{}/board", preference.id))
                .cookie(cookie)
                .set_json(BoardPreferenceRequest {
                    board_level: Some(PreferenceLevel::Gladly),
                    board_remarks: None,
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}

//! Workload ("Arbeitslast") endpoints.
//!
//! ```text
//! GET /api/v1/members/me/workload
//! GET /api/v1/members/{member_id}/workload
//! GET /api/v1/workload?standing=satisfiable
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Actor, ApiResult, Error, MemberId, QuotaStanding, WorkloadBalance};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// A member's hours together with their quota standing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadResponse {
    #[serde(flatten)]
    pub balance: WorkloadBalance,
    pub standing: QuotaStanding,
}

impl From<WorkloadBalance> for WorkloadResponse {
    fn from(balance: WorkloadBalance) -> Self {
        Self {
            standing: balance.standing(),
            balance,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WorkloadQuery {
    /// Only members with this standing.
    pub standing: Option<QuotaStanding>,
}

fn ensure_board_or_self(actor: &Actor, member: MemberId) -> Result<(), Error> {
    if actor.board || actor.member_id == member {
        Ok(())
    } else {
        Err(Error::forbidden("only board members may view other members' hours"))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/members/me/workload",
    responses(
        (status = 200, description = "The member's hours", body = WorkloadResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["workload"],
    operation_id = "getOwnWorkload"
)]
#[get("/members/me/workload")]
pub async fn own_balance(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<WorkloadResponse>> {
    let actor = session.require_actor(&state.members).await?;
    let balance = state.workload.balance(actor.member_id).await?;
    Ok(web::Json(balance.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/members/{member_id}/workload",
    params(("member_id" = MemberId, Path, description = "Member identifier")),
    responses(
        (status = 200, description = "The member's hours", body = WorkloadResponse),
        (status = 403, description = "Neither board nor the member", body = Error),
        (status = 404, description = "Unknown member", body = Error)
    ),
    tags = ["workload"],
    operation_id = "getMemberWorkload"
)]
#[get("/members/{member_id}/workload")]
pub async fn member_balance(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<MemberId>,
) -> ApiResult<web::Json<WorkloadResponse>> {
    let actor = session.require_actor(&state.members).await?;
    let member = path.into_inner();
    ensure_board_or_self(&actor, member)?;
    let balance = state.workload.balance(member).await?;
    Ok(web::Json(balance.into()))
}

/// Hours of every active member. Board members only.
#[utoipa::path(
    get,
    path = "/api/v1/workload",
    params(WorkloadQuery),
    responses(
        (status = 200, description = "Hours per active member", body = [WorkloadResponse]),
        (status = 403, description = "Not a board member", body = Error)
    ),
    tags = ["workload"],
    operation_id = "listWorkloads"
)]
#[get("/workload")]
pub async fn balances(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<WorkloadQuery>,
) -> ApiResult<web::Json<Vec<WorkloadResponse>>> {
    let actor = session.require_actor(&state.members).await?;
    if !actor.board {
        return Err(Error::forbidden("only board members may list workloads"));
    }
    let balances = state.workload.balances(query.into_inner().standing).await?;
    Ok(web::Json(
        balances.into_iter().map(WorkloadResponse::from).collect(),
    ))
}

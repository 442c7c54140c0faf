//! Member lookups for inbound adapters.

use serde_json::json;
use tracing::warn;

use super::ports::DomainPorts;
use super::port_errors::map_member_error;
use super::{Actor, Error, Member, MemberId};

/// Resolves session identities into [`Actor`]s.
#[derive(Clone)]
pub struct MemberDirectory {
    ports: DomainPorts,
}

impl MemberDirectory {
    pub fn new(ports: DomainPorts) -> Self {
        Self { ports }
    }

    /// Load a member by id.
    pub async fn find(&self, id: MemberId) -> Result<Member, Error> {
        self.ports
            .members
            .find_by_id(&id)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| {
                Error::not_found(format!("member {id} not found"))
                    .with_details(json!({ "memberId": id }))
            })
    }

    /// Turn a session member id into an actor.
    ///
    /// Unknown and inactive members are treated as logged out, and the board
    /// flag always comes from the stored record.
    pub async fn resolve_actor(&self, id: MemberId) -> Result<Actor, Error> {
        let member = self
            .ports
            .members
            .find_by_id(&id)
            .await
            .map_err(map_member_error)?;
        match member {
            Some(member) if member.active => Ok(Actor::from(&member)),
            Some(_) => {
                warn!(member_id = %id, "inactive member presented a session");
                Err(Error::unauthorized("login required"))
            }
            None => {
                warn!(member_id = %id, "session refers to an unknown member");
                Err(Error::unauthorized("login required"))
            }
        }
    }
}

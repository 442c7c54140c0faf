//! Port for reading members and maintaining their quota.

use async_trait::async_trait;

use crate::domain::{Hours, Member, MemberId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by member repository adapters.
    pub enum MemberRepositoryError {
        /// A member number is already taken.
        DuplicateMemberNumber { member_number: String } =>
            "member number {member_number} is already registered",
    }
}

/// Member persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find one member.
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, MemberRepositoryError>;

    /// Load several members; unknown ids are skipped.
    async fn find_many(&self, ids: &[MemberId]) -> Result<Vec<Member>, MemberRepositoryError>;

    /// All active members ordered by last name.
    async fn list_active(&self) -> Result<Vec<Member>, MemberRepositoryError>;

    /// Active board members.
    async fn list_board(&self) -> Result<Vec<Member>, MemberRepositoryError>;

    /// Register a member.
    async fn insert(&self, member: &Member) -> Result<(), MemberRepositoryError>;

    /// Overwrite a member's yearly quota.
    async fn update_quota(&self, id: &MemberId, quota: Hours)
    -> Result<(), MemberRepositoryError>;
}

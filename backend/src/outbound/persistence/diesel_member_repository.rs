//! PostgreSQL-backed member directory and notification flags.
//!
//! Both ports live on the `members` table; the notification flag is the
//! `notification_pending` column plus the time of the last summary mail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    MemberRepository, MemberRepositoryError, NotificationFlagError, NotificationFlagStore,
};
use crate::domain::{Hours, Member, MemberId};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{MemberRow, NewMemberRow, hours_column};
use super::pool::{DbPool, PoolError};
use super::schema::members;

/// Diesel-backed implementation of the member ports.
#[derive(Clone)]
pub struct DieselMemberRepository {
    pool: DbPool,
}

impl DieselMemberRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MemberRepositoryError {
    map_basic_pool_error(error, MemberRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MemberRepositoryError {
    map_basic_diesel_error(
        error,
        MemberRepositoryError::query,
        MemberRepositoryError::connection,
    )
}

fn map_flag_pool_error(error: PoolError) -> NotificationFlagError {
    map_basic_pool_error(error, NotificationFlagError::connection)
}

fn map_flag_diesel_error(error: diesel::result::Error) -> NotificationFlagError {
    map_basic_diesel_error(
        error,
        NotificationFlagError::query,
        NotificationFlagError::connection,
    )
}

fn uuids(ids: &[MemberId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

fn rows_to_members<E>(
    rows: Vec<MemberRow>,
    query: impl Fn(String) -> E,
) -> Result<Vec<Member>, E> {
    rows.into_iter()
        .map(|row| Member::try_from(row).map_err(|err| query(err.to_string())))
        .collect()
}

#[async_trait]
impl MemberRepository for DieselMemberRepository {
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = members::table
            .find(id.as_uuid())
            .select(MemberRow::as_select())
            .first::<MemberRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Member::try_from)
            .transpose()
            .map_err(|err| MemberRepositoryError::query(err.to_string()))
    }

    async fn find_many(&self, ids: &[MemberId]) -> Result<Vec<Member>, MemberRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MemberRow> = members::table
            .filter(members::id.eq_any(uuids(ids)))
            .order((members::last_name.asc(), members::first_name.asc()))
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_members(rows, MemberRepositoryError::query)
    }

    async fn list_active(&self) -> Result<Vec<Member>, MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MemberRow> = members::table
            .filter(members::active.eq(true))
            .order((members::last_name.asc(), members::first_name.asc()))
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_members(rows, MemberRepositoryError::query)
    }

    async fn list_board(&self) -> Result<Vec<Member>, MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MemberRow> = members::table
            .filter(members::active.eq(true).and(members::board.eq(true)))
            .order((members::last_name.asc(), members::first_name.asc()))
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_members(rows, MemberRepositoryError::query)
    }

    async fn insert(&self, member: &Member) -> Result<(), MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(members::table)
            .values(NewMemberRow::from(member))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| match classify_diesel_error(error) {
                DieselFailure::UniqueViolation { .. } => {
                    MemberRepositoryError::duplicate_member_number(member.member_number.clone())
                }
                DieselFailure::Connection(message) => MemberRepositoryError::connection(message),
                DieselFailure::ForeignKeyViolation { .. } => {
                    MemberRepositoryError::query("foreign key constraint violated")
                }
                DieselFailure::Query(message) => MemberRepositoryError::query(message),
            })
    }

    async fn update_quota(&self, id: &MemberId, quota: Hours) -> Result<(), MemberRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(members::table.find(id.as_uuid()))
            .set(members::quota_tenths.eq(hours_column(quota)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl NotificationFlagStore for DieselMemberRepository {
    async fn pending_members(&self) -> Result<Vec<Member>, NotificationFlagError> {
        let mut conn = self.pool.get().await.map_err(map_flag_pool_error)?;
        let rows: Vec<MemberRow> = members::table
            .filter(members::notification_pending.eq(true))
            .order((members::last_name.asc(), members::first_name.asc()))
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_flag_diesel_error)?;
        rows_to_members(rows, NotificationFlagError::query)
    }

    async fn mark_notified(
        &self,
        member: &MemberId,
        seen_revision: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, NotificationFlagError> {
        let mut conn = self.pool.get().await.map_err(map_flag_pool_error)?;
        let cleared = diesel::update(
            members::table
                .find(member.as_uuid())
                .filter(members::notification_revision.eq(seen_revision)),
        )
        .set((
            members::notification_pending.eq(false),
            members::last_notified_at.eq(at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_flag_diesel_error)?;
        if cleared > 0 {
            return Ok(true);
        }
        let exists: i64 = members::table
            .find(member.as_uuid())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_flag_diesel_error)?;
        if exists == 0 {
            return Err(NotificationFlagError::unknown_member(member.to_string()));
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool_error(PoolError::checkout("pool exhausted"));
        assert!(matches!(err, MemberRepositoryError::Connection { .. }));
        let err = map_flag_pool_error(PoolError::build("bad url"));
        assert!(matches!(err, NotificationFlagError::Connection { .. }));
    }

    #[rstest]
    fn missing_rows_map_to_query_errors() {
        let err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(err, MemberRepositoryError::Query { .. }));
    }
}

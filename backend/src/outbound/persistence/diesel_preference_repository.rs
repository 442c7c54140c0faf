//! PostgreSQL-backed `PreferenceRepository` implementation using Diesel ORM.
//!
//! `get_or_create` relies on the unique (member, task) index: the insert is
//! skipped on conflict and the surviving row is read back, so concurrent
//! callers observe the same record.

use async_trait::async_trait;
use diesel::dsl::{count_star, exists, not};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    DuplicatePreference, PreferenceRepository, PreferenceRepositoryError, StoredPreference,
};
use crate::domain::{MemberId, OutgoingMail, Preference, PreferenceId, TaskId};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_mail_outbox::insert_mail;
use super::models::{NewPreferenceRow, PreferenceRow, PreferenceUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{assignments, preferences};

/// Diesel-backed implementation of the preference repository port.
#[derive(Clone)]
pub struct DieselPreferenceRepository {
    pool: DbPool,
}

impl DieselPreferenceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PreferenceRepositoryError {
    map_basic_pool_error(error, PreferenceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PreferenceRepositoryError {
    map_basic_diesel_error(
        error,
        PreferenceRepositoryError::query,
        PreferenceRepositoryError::connection,
    )
}

fn map_insert_error(
    error: diesel::result::Error,
    defaults: &Preference,
) -> PreferenceRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::ForeignKeyViolation { .. } => {
            PreferenceRepositoryError::missing_reference(format!(
                "member {} / task {}",
                defaults.member_id, defaults.task_id
            ))
        }
        DieselFailure::Connection(message) => PreferenceRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => {
            PreferenceRepositoryError::query("preference id already taken")
        }
        DieselFailure::Query(message) => PreferenceRepositoryError::query(message),
    }
}

fn row_to_preference(row: PreferenceRow) -> Result<Preference, PreferenceRepositoryError> {
    Preference::try_from(row).map_err(|err| PreferenceRepositoryError::query(err.to_string()))
}

fn rows_to_preferences(
    rows: Vec<PreferenceRow>,
) -> Result<Vec<Preference>, PreferenceRepositoryError> {
    rows.into_iter().map(row_to_preference).collect()
}

#[async_trait]
impl PreferenceRepository for DieselPreferenceRepository {
    async fn get_or_create(
        &self,
        defaults: &Preference,
    ) -> Result<StoredPreference, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(preferences::table)
            .values(NewPreferenceRow::from(defaults))
            .on_conflict((preferences::member_id, preferences::task_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|error| map_insert_error(error, defaults))?;

        let row = preferences::table
            .filter(preferences::member_id.eq(defaults.member_id.as_uuid()))
            .filter(preferences::task_id.eq(defaults.task_id.as_uuid()))
            .select(PreferenceRow::as_select())
            .first::<PreferenceRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(StoredPreference {
            preference: row_to_preference(row)?,
            created: inserted > 0,
        })
    }

    async fn find_by_id(
        &self,
        id: &PreferenceId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = preferences::table
            .find(id.as_uuid())
            .select(PreferenceRow::as_select())
            .first::<PreferenceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_preference).transpose()
    }

    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = preferences::table
            .filter(preferences::member_id.eq(member.as_uuid()))
            .filter(preferences::task_id.eq(task.as_uuid()))
            .select(PreferenceRow::as_select())
            .first::<PreferenceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_preference).transpose()
    }

    async fn update(&self, preference: &Preference) -> Result<(), PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(preferences::table.find(preference.id.as_uuid()))
            .set(PreferenceUpdate::from(preference))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_and_notify(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<(), PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = PreferenceUpdate::from(preference);
        let id = *preference.id.as_uuid();
        conn.transaction(|conn| {
            async move {
                diesel::update(preferences::table.find(id))
                    .set(changes)
                    .execute(conn)
                    .await?;
                insert_mail(conn, notice).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update_unless_assigned(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<bool, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = PreferenceUpdate::from(preference);
        let id = *preference.id.as_uuid();
        let member = *preference.member_id.as_uuid();
        let task = *preference.task_id.as_uuid();
        conn.transaction(|conn| {
            async move {
                let assigned = assignments::table
                    .filter(assignments::member_id.eq(member))
                    .filter(assignments::task_id.eq(task));
                let updated = diesel::update(
                    preferences::table
                        .find(id)
                        .filter(not(exists(assigned))),
                )
                .set(changes)
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Ok(false);
                }
                insert_mail(conn, notice).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PreferenceRow> = preferences::table
            .filter(preferences::member_id.eq(member.as_uuid()))
            .order(preferences::created_at.asc())
            .select(PreferenceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_preferences(rows)
    }

    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PreferenceRow> = preferences::table
            .filter(preferences::task_id.eq(task.as_uuid()))
            .order(preferences::created_at.asc())
            .select(PreferenceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_preferences(rows)
    }

    async fn duplicate_pairs(&self) -> Result<Vec<DuplicatePreference>, PreferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, Uuid, i64)> = preferences::table
            .group_by((preferences::member_id, preferences::task_id))
            .having(count_star().gt(1))
            .select((preferences::member_id, preferences::task_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(member_id, task_id, count)| DuplicatePreference {
                member_id: MemberId::from_uuid(member_id),
                task_id: TaskId::from_uuid(task_id),
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect())
    }
}

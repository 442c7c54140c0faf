//! PostgreSQL-backed `WorkLogRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_distinct;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AcceptedWorkTotal, WorkLogRepository, WorkLogRepositoryError};
use crate::domain::{MemberId, OutgoingMail, TaskId, WorkLog, WorkLogId, WorkLogStatus};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_basic_diesel_error, map_basic_pool_error,
    violation_message,
};
use super::diesel_mail_outbox::insert_mail;
use super::models::{WorkLogRow, WorkLogWriteRow, decode_hours};
use super::pool::{DbPool, PoolError};
use super::schema::work_logs;

/// Diesel-backed implementation of the work log repository port.
#[derive(Clone)]
pub struct DieselWorkLogRepository {
    pool: DbPool,
}

impl DieselWorkLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> WorkLogRepositoryError {
    map_basic_pool_error(error, WorkLogRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> WorkLogRepositoryError {
    map_basic_diesel_error(
        error,
        WorkLogRepositoryError::query,
        WorkLogRepositoryError::connection,
    )
}

fn map_write_error(error: diesel::result::Error, log: &WorkLog) -> WorkLogRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::ForeignKeyViolation { .. } => WorkLogRepositoryError::missing_reference(
            format!("member {} / task {}", log.member_id, log.task_id),
        ),
        DieselFailure::Connection(message) => WorkLogRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint } => {
            WorkLogRepositoryError::query(violation_message("unique", constraint.as_deref()))
        }
        DieselFailure::Query(message) => WorkLogRepositoryError::query(message),
    }
}

fn rows_to_logs(rows: Vec<WorkLogRow>) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
    rows.into_iter()
        .map(|row| {
            WorkLog::try_from(row).map_err(|err| WorkLogRepositoryError::query(err.to_string()))
        })
        .collect()
}

fn open_codes() -> Vec<&'static str> {
    WorkLogStatus::ALL
        .into_iter()
        .filter(|status| !status.is_terminal())
        .map(WorkLogStatus::code)
        .collect()
}

#[async_trait]
impl WorkLogRepository for DieselWorkLogRepository {
    async fn insert(&self, log: &WorkLog) -> Result<(), WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(work_logs::table)
            .values(WorkLogWriteRow::from(log))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_write_error(error, log))
    }

    async fn find_by_id(&self, id: &WorkLogId) -> Result<Option<WorkLog>, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = work_logs::table
            .find(id.as_uuid())
            .select(WorkLogRow::as_select())
            .first::<WorkLogRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(WorkLog::try_from)
            .transpose()
            .map_err(|err| WorkLogRepositoryError::query(err.to_string()))
    }

    async fn update_open(&self, log: &WorkLog) -> Result<bool, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            work_logs::table
                .find(log.id.as_uuid())
                .filter(work_logs::status.eq_any(open_codes())),
        )
        .set(WorkLogWriteRow::from(log))
        .execute(&mut conn)
        .await
        .map(|rows| rows > 0)
        .map_err(|error| map_write_error(error, log))
    }

    async fn delete_open(&self, id: &WorkLogId) -> Result<bool, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            work_logs::table
                .find(id.as_uuid())
                .filter(work_logs::status.eq_any(open_codes())),
        )
        .execute(&mut conn)
        .await
        .map(|rows| rows > 0)
        .map_err(map_diesel_error)
    }

    async fn record_review(
        &self,
        log: &WorkLog,
        notice: &OutgoingMail,
    ) -> Result<(), WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = WorkLogWriteRow::from(log);
        let id = *log.id.as_uuid();
        let updated = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(work_logs::table.find(id))
                        .set(row)
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Err(diesel::result::Error::RollbackTransaction);
                    }
                    insert_mail(conn, notice).await?;
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await;
        match updated {
            Ok(_) => Ok(()),
            Err(diesel::result::Error::RollbackTransaction) => {
                Err(WorkLogRepositoryError::vanished(log.id.to_string()))
            }
            Err(error) => Err(map_write_error(error, log)),
        }
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<WorkLogRow> = work_logs::table
            .filter(work_logs::member_id.eq(member.as_uuid()))
            .order(work_logs::worked_on.desc())
            .select(WorkLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_logs(rows)
    }

    async fn list_for_tasks(
        &self,
        tasks: &[TaskId],
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = tasks.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<WorkLogRow> = work_logs::table
            .filter(work_logs::task_id.eq_any(&ids))
            .order((work_logs::worked_on.desc(), work_logs::created_at.desc()))
            .select(WorkLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_logs(rows)
    }

    async fn list_unreviewed_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<WorkLogRow> = work_logs::table
            .filter(work_logs::status.eq_any(open_codes()))
            .filter(work_logs::created_at.le(cutoff))
            .order(work_logs::created_at.asc())
            .select(WorkLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_logs(rows)
    }

    async fn accepted_totals(&self) -> Result<Vec<AcceptedWorkTotal>, WorkLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, Option<i64>, i64)> = work_logs::table
            .filter(work_logs::status.eq(WorkLogStatus::Accepted.code()))
            .group_by(work_logs::task_id)
            .select((
                work_logs::task_id,
                diesel::dsl::sum(work_logs::hours_tenths),
                count_distinct(work_logs::member_id),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(task_id, tenths, members)| {
                let tenths = i32::try_from(tenths.unwrap_or(0)).unwrap_or(i32::MAX);
                Ok(AcceptedWorkTotal {
                    task_id: TaskId::from_uuid(task_id),
                    hours: decode_hours("hours_tenths", tenths)
                        .map_err(|err| WorkLogRepositoryError::query(err.to_string()))?,
                    members: u32::try_from(members).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }
}

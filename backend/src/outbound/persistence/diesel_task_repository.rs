//! PostgreSQL-backed `TaskRepository` implementation using Diesel ORM.
//!
//! Deleting a task cascades to its preferences, assignments, slots and hour
//! schedule in the database; work logs reference tasks with `ON DELETE
//! RESTRICT`, which surfaces here as [`TaskRepositoryError::TaskInUse`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{TaskRepository, TaskRepositoryError};
use crate::domain::{Task, TaskGroup, TaskGroupId, TaskId, TimeSlotRequirement};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_basic_diesel_error, map_basic_pool_error,
    violation_message,
};
use super::models::{RequirementRow, TaskGroupRow, TaskRow, TaskWriteRow};
use super::pool::{DbPool, PoolError};
use super::schema::{task_groups, tasks, time_slot_requirements};

/// Diesel-backed implementation of the task repository port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TaskRepositoryError {
    map_basic_pool_error(error, TaskRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TaskRepositoryError {
    map_basic_diesel_error(
        error,
        TaskRepositoryError::query,
        TaskRepositoryError::connection,
    )
}

/// Translate constraint violations raised while writing `task`.
fn map_task_write_error(error: diesel::result::Error, task: &Task) -> TaskRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => {
            TaskRepositoryError::duplicate_name(task.name.to_string())
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            TaskRepositoryError::unknown_group(task.group_id.to_string())
        }
        DieselFailure::Connection(message) => TaskRepositoryError::connection(message),
        DieselFailure::Query(message) => TaskRepositoryError::query(message),
    }
}

fn map_group_write_error(error: diesel::result::Error) -> TaskRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { constraint } => {
            TaskRepositoryError::query(violation_message("unique", constraint.as_deref()))
        }
        DieselFailure::ForeignKeyViolation { constraint } => {
            TaskRepositoryError::query(violation_message("foreign key", constraint.as_deref()))
        }
        DieselFailure::Connection(message) => TaskRepositoryError::connection(message),
        DieselFailure::Query(message) => TaskRepositoryError::query(message),
    }
}

fn row_to_task(row: TaskRow) -> Result<Task, TaskRepositoryError> {
    Task::try_from(row).map_err(|err| TaskRepositoryError::query(err.to_string()))
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = tasks::table
            .find(id.as_uuid())
            .select(TaskRow::as_select())
            .first::<TaskRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_task).transpose()
    }

    async fn list(&self) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TaskRow> = tasks::table
            .order(tasks::name.asc())
            .select(TaskRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_task).collect()
    }

    async fn insert(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(tasks::table)
            .values(TaskWriteRow::from(task))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_task_write_error(error, task))
    }

    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(tasks::table.find(task.id.as_uuid()))
            .set(TaskWriteRow::from(task))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_task_write_error(error, task))
    }

    async fn delete(&self, id: &TaskId) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(tasks::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| match classify_diesel_error(error) {
                DieselFailure::ForeignKeyViolation { .. } => {
                    TaskRepositoryError::task_in_use(id.to_string())
                }
                DieselFailure::Connection(message) => TaskRepositoryError::connection(message),
                DieselFailure::UniqueViolation { constraint } => {
                    TaskRepositoryError::query(violation_message("unique", constraint.as_deref()))
                }
                DieselFailure::Query(message) => TaskRepositoryError::query(message),
            })
    }

    async fn find_group(&self, id: &TaskGroupId) -> Result<Option<TaskGroup>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = task_groups::table
            .find(id.as_uuid())
            .select(TaskGroupRow::as_select())
            .first::<TaskGroupRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(TaskGroup::from))
    }

    async fn list_groups(&self) -> Result<Vec<TaskGroup>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TaskGroupRow> = task_groups::table
            .order(task_groups::name.asc())
            .select(TaskGroupRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(TaskGroup::from).collect())
    }

    async fn insert_group(&self, group: &TaskGroup) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(task_groups::table)
            .values(TaskGroupRow::from(group))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_group_write_error)
    }

    async fn requirements(
        &self,
        task: &TaskId,
    ) -> Result<Vec<TimeSlotRequirement>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RequirementRow> = time_slot_requirements::table
            .filter(time_slot_requirements::task_id.eq(task.as_uuid()))
            .order(time_slot_requirements::hour.asc())
            .select(RequirementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                TimeSlotRequirement::try_from(row)
                    .map_err(|err| TaskRepositoryError::query(err.to_string()))
            })
            .collect()
    }

    async fn replace_requirements(
        &self,
        task: &TaskId,
        requirements: &[TimeSlotRequirement],
    ) -> Result<(), TaskRepositoryError> {
        let rows: Vec<RequirementRow> = requirements.iter().map(RequirementRow::from).collect();
        let task_id = *task.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    time_slot_requirements::table
                        .filter(time_slot_requirements::task_id.eq(task_id)),
                )
                .execute(conn)
                .await?;
                if !rows.is_empty() {
                    diesel::insert_into(time_slot_requirements::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use crate::test_support::fixtures::{board_member, group, task};

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new("constraint".to_owned()))
    }

    #[rstest]
    fn unique_violation_on_write_is_a_duplicate_name() {
        let task = task("Rasen mähen", &group(&board_member("Olaf")));
        let err = map_task_write_error(database_error(DatabaseErrorKind::UniqueViolation), &task);
        assert_eq!(err, TaskRepositoryError::duplicate_name("Rasen mähen"));
    }

    #[rstest]
    fn foreign_key_violation_on_write_is_an_unknown_group() {
        let task = task("Rasen mähen", &group(&board_member("Olaf")));
        let err =
            map_task_write_error(database_error(DatabaseErrorKind::ForeignKeyViolation), &task);
        assert_eq!(err, TaskRepositoryError::unknown_group(task.group_id.to_string()));
    }

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(err, TaskRepositoryError::Connection { .. }));
    }
}

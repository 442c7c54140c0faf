//! PostgreSQL-backed `AssignmentRepository` implementation using Diesel ORM.
//!
//! Plans are applied inside one transaction together with the notification
//! flags they raise. Hour slots reference assignments with `ON DELETE
//! CASCADE`, so removing an assignment also drops its slots.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{AssignmentRepository, AssignmentRepositoryError};
use crate::domain::{
    AppliedReconciliation, AppliedTimeSlotPlan, Assignment, AssignmentDetail, HourSlot, MemberId,
    ReconciliationPlan, Task, TaskId, TimeSlotPlan,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    AssignmentRow, RowEncodeError, SlotRow, TaskRow, decode_hour, helpers_column, hour_column,
};
use super::pool::{DbPool, PoolError};
use super::schema::{assignments, members, tasks, time_slot_assignments};

/// Diesel-backed implementation of the assignment repository port.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AssignmentRepositoryError {
    map_basic_pool_error(error, AssignmentRepositoryError::connection)
}

fn map_encode_error(error: RowEncodeError) -> AssignmentRepositoryError {
    AssignmentRepositoryError::query(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> AssignmentRepositoryError {
    map_basic_diesel_error(
        error,
        AssignmentRepositoryError::query,
        AssignmentRepositoryError::connection,
    )
}

/// Failure inside a plan transaction: either the database or a rejected plan.
#[derive(Debug)]
enum ApplyError {
    Database(diesel::result::Error),
    Rejected(AssignmentRepositoryError),
}

impl From<diesel::result::Error> for ApplyError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl From<ApplyError> for AssignmentRepositoryError {
    fn from(error: ApplyError) -> Self {
        match error {
            ApplyError::Database(error) => map_diesel_error(error),
            ApplyError::Rejected(error) => error,
        }
    }
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

fn member_uuids<'a>(ids: impl IntoIterator<Item = &'a MemberId>) -> Vec<Uuid> {
    ids.into_iter().map(|id| *id.as_uuid()).collect()
}

/// Join assignment and task rows with their booked hours.
async fn attach_slots(
    conn: &mut AsyncPgConnection,
    rows: Vec<(AssignmentRow, TaskRow)>,
) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
    let ids: Vec<Uuid> = rows.iter().map(|(assignment, _)| assignment.id).collect();
    let slot_rows: Vec<SlotRow> = if ids.is_empty() {
        Vec::new()
    } else {
        time_slot_assignments::table
            .filter(time_slot_assignments::assignment_id.eq_any(&ids))
            .select(SlotRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?
    };

    let mut slots: BTreeMap<Uuid, BTreeSet<HourSlot>> = BTreeMap::new();
    for row in slot_rows {
        let hour =
            decode_hour(row.hour).map_err(|err| AssignmentRepositoryError::query(err.to_string()))?;
        slots.entry(row.assignment_id).or_default().insert(hour);
    }

    rows.into_iter()
        .map(|(assignment_row, task_row)| {
            let booked = slots.remove(&assignment_row.id).unwrap_or_default();
            let assignment = Assignment::try_from(assignment_row)
                .map_err(|err| AssignmentRepositoryError::query(err.to_string()))?;
            let task = Task::try_from(task_row)
                .map_err(|err| AssignmentRepositoryError::query(err.to_string()))?;
            Ok(AssignmentDetail {
                assignment,
                task,
                slots: booked,
            })
        })
        .collect()
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Assignment>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = assignments::table
            .filter(assignments::member_id.eq(member.as_uuid()))
            .filter(assignments::task_id.eq(task.as_uuid()))
            .select(AssignmentRow::as_select())
            .first::<AssignmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Assignment::try_from)
            .transpose()
            .map_err(|err| AssignmentRepositoryError::query(err.to_string()))
    }

    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(AssignmentRow, TaskRow)> = assignments::table
            .inner_join(tasks::table)
            .filter(assignments::task_id.eq(task.as_uuid()))
            .order(assignments::created_at.asc())
            .select((AssignmentRow::as_select(), TaskRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_slots(&mut conn, rows).await
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(AssignmentRow, TaskRow)> = assignments::table
            .inner_join(tasks::table)
            .filter(assignments::member_id.eq(member.as_uuid()))
            .order((tasks::date.asc(), tasks::name.asc()))
            .select((AssignmentRow::as_select(), TaskRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_slots(&mut conn, rows).await
    }

    async fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(AssignmentRow, TaskRow)> = assignments::table
            .inner_join(tasks::table)
            .filter(tasks::date.eq(date))
            .order(tasks::name.asc())
            .select((AssignmentRow::as_select(), TaskRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_slots(&mut conn, rows).await
    }

    async fn apply_reconciliation(
        &self,
        plan: &ReconciliationPlan,
    ) -> Result<AppliedReconciliation, AssignmentRepositoryError> {
        let task_id = *plan.task_id.as_uuid();
        let new_rows = plan
            .to_create
            .iter()
            .map(|member| {
                AssignmentRow::try_from(&Assignment::new(*member, plan.task_id, plan.at))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_encode_error)?;
        let wanted = member_uuids(&plan.to_create);
        let removed = member_uuids(&plan.to_delete);
        let flagged = member_uuids(&plan.flag_members);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let applied = conn
            .transaction(|conn| {
                async move {
                    let task_exists = tasks::table
                        .find(task_id)
                        .select(tasks::id)
                        .first::<Uuid>(conn)
                        .await
                        .optional()?
                        .is_some();
                    if !task_exists {
                        return Err(ApplyError::Rejected(
                            AssignmentRepositoryError::missing_reference(format!("task {task_id}")),
                        ));
                    }

                    let known: BTreeSet<Uuid> = members::table
                        .filter(members::id.eq_any(&wanted))
                        .select(members::id)
                        .load::<Uuid>(conn)
                        .await?
                        .into_iter()
                        .collect();
                    if let Some(unknown) = wanted.iter().find(|id| !known.contains(id)) {
                        return Err(ApplyError::Rejected(
                            AssignmentRepositoryError::missing_reference(format!(
                                "member {unknown}"
                            )),
                        ));
                    }

                    let mut applied = AppliedReconciliation::default();
                    if !new_rows.is_empty() {
                        applied.created = affected(
                            diesel::insert_into(assignments::table)
                                .values(&new_rows)
                                .on_conflict((assignments::member_id, assignments::task_id))
                                .do_nothing()
                                .execute(conn)
                                .await?,
                        );
                    }
                    if !removed.is_empty() {
                        applied.deleted = affected(
                            diesel::delete(
                                assignments::table
                                    .filter(assignments::task_id.eq(task_id))
                                    .filter(assignments::member_id.eq_any(&removed)),
                            )
                            .execute(conn)
                            .await?,
                        );
                    }
                    if !flagged.is_empty() {
                        applied.flagged = affected(
                            diesel::update(members::table.filter(members::id.eq_any(&flagged)))
                                .set((
                                    members::notification_pending.eq(true),
                                    members::notification_revision
                                        .eq(members::notification_revision + 1),
                                ))
                                .execute(conn)
                                .await?,
                        );
                    }
                    Ok::<_, ApplyError>(applied)
                }
                .scope_boxed()
            })
            .await?;
        debug!(
            task_id = %plan.task_id,
            created = applied.created,
            deleted = applied.deleted,
            "reconciliation applied"
        );
        Ok(applied)
    }

    async fn apply_time_slot_plan(
        &self,
        plan: &TimeSlotPlan,
    ) -> Result<AppliedTimeSlotPlan, AssignmentRepositoryError> {
        let task_id = plan.task_id;
        let new_slots: Vec<SlotRow> = plan
            .to_create
            .iter()
            .map(|change| SlotRow {
                assignment_id: *change.assignment_id.as_uuid(),
                hour: hour_column(change.hour),
            })
            .collect();
        let parents: BTreeMap<Uuid, MemberId> = plan
            .to_create
            .iter()
            .map(|change| (*change.assignment_id.as_uuid(), change.member_id))
            .collect();
        let removed: Vec<SlotRow> = plan
            .to_delete
            .iter()
            .map(|change| SlotRow {
                assignment_id: *change.assignment_id.as_uuid(),
                hour: hour_column(change.hour),
            })
            .collect();
        let helpers = plan
            .helper_updates
            .iter()
            .map(|(id, count)| helpers_column(*count).map(|count| (*id.as_uuid(), count)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_encode_error)?;
        let flagged = member_uuids(&plan.flag_members);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let applied = conn
            .transaction(|conn| {
                async move {
                    let parent_ids: Vec<Uuid> = parents.keys().copied().collect();
                    let present: BTreeSet<Uuid> = assignments::table
                        .filter(assignments::id.eq_any(&parent_ids))
                        .filter(assignments::task_id.eq(task_id.as_uuid()))
                        .select(assignments::id)
                        .load::<Uuid>(conn)
                        .await?
                        .into_iter()
                        .collect();
                    if let Some(member) = parents
                        .iter()
                        .find(|(id, _)| !present.contains(*id))
                        .map(|(_, member)| member)
                    {
                        return Err(ApplyError::Rejected(
                            AssignmentRepositoryError::missing_assignment(
                                member.to_string(),
                                task_id.to_string(),
                            ),
                        ));
                    }

                    let mut applied = AppliedTimeSlotPlan::default();
                    if !new_slots.is_empty() {
                        applied.created = affected(
                            diesel::insert_into(time_slot_assignments::table)
                                .values(&new_slots)
                                .on_conflict_do_nothing()
                                .execute(conn)
                                .await?,
                        );
                    }
                    for slot in &removed {
                        applied.deleted += affected(
                            diesel::delete(
                                time_slot_assignments::table
                                    .filter(
                                        time_slot_assignments::assignment_id
                                            .eq(slot.assignment_id),
                                    )
                                    .filter(time_slot_assignments::hour.eq(slot.hour)),
                            )
                            .execute(conn)
                            .await?,
                        );
                    }
                    for (id, count) in &helpers {
                        applied.helpers_updated += affected(
                            diesel::update(assignments::table.find(id))
                                .set(assignments::extra_helpers.eq(count))
                                .execute(conn)
                                .await?,
                        );
                    }
                    if !flagged.is_empty() {
                        applied.flagged = affected(
                            diesel::update(members::table.filter(members::id.eq_any(&flagged)))
                                .set((
                                    members::notification_pending.eq(true),
                                    members::notification_revision
                                        .eq(members::notification_revision + 1),
                                ))
                                .execute(conn)
                                .await?,
                        );
                    }
                    Ok::<_, ApplyError>(applied)
                }
                .scope_boxed()
            })
            .await?;
        debug!(
            task_id = %plan.task_id,
            created = applied.created,
            deleted = applied.deleted,
            "time slot plan applied"
        );
        Ok(applied)
    }
}

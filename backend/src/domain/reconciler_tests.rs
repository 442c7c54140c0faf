//! Tests for assignment reconciliation.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    AssignmentRepositoryError, MockAssignmentRepository, MockTaskRepository,
};
use crate::domain::{Assignment, ErrorCode, HourSlot, Member, Task};
use crate::test_support::fixtures::{board_member, date, group, member, task};
use crate::test_support::{InMemoryStore, MutableClock};

struct Harness {
    store: Arc<InMemoryStore>,
    reconciler: AssignmentReconciler,
    board: Actor,
    task: Task,
    anna: Member,
    bert: Member,
    carl: Member,
}

#[fixture]
fn harness() -> Harness {
    let store = InMemoryStore::new();
    let chair = store.seed_member(board_member("Vera"));
    let group = store.seed_group(group(&chair));
    let task = store.seed_task(task("Steg streichen", &group));
    let anna = store.seed_member(member("Anna"));
    let bert = store.seed_member(member("Bert"));
    let carl = store.seed_member(member("Carl"));
    let clock = Arc::new(MutableClock::at_date(date(2024, 5, 1)));
    Harness {
        reconciler: AssignmentReconciler::new(store.ports(), clock),
        board: Actor::from(&chair),
        store,
        task,
        anna,
        bert,
        carl,
    }
}

fn selection(task: &Task, members: &[&Member]) -> TaskSelection {
    TaskSelection {
        task_id: task.id,
        desired_member_ids: members.iter().map(|m| m.id).collect(),
    }
}

#[rstest]
fn plan_is_the_pair_of_set_differences() {
    let (a, b, c) = (MemberId::random(), MemberId::random(), MemberId::random());
    let plan = plan_reconciliation(TaskId::random(), &BTreeSet::from([a, b]), [b, c], Utc::now());

    assert_eq!(plan.to_create, BTreeSet::from([a]));
    assert_eq!(plan.to_delete, BTreeSet::from([c]));
    assert_eq!(plan.flag_members, BTreeSet::from([a, c]));
}

#[rstest]
fn plan_for_matching_sets_is_empty() {
    let a = MemberId::random();
    let plan = plan_reconciliation(TaskId::random(), &BTreeSet::from([a]), [a], Utc::now());
    assert!(plan.is_empty());
    assert!(plan.flag_members.is_empty());
}

#[rstest]
#[tokio::test]
async fn creates_and_deletes_and_flags_touched_members(harness: Harness) {
    let Harness {
        store,
        reconciler,
        board,
        task,
        anna,
        bert,
        carl,
    } = harness;
    store.seed_assignment(Assignment::new(carl.id, task.id, Utc::now()));

    let outcome = reconciler
        .reconcile(&board, selection(&task, &[&anna, &bert]))
        .await
        .expect("reconcile");

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.deleted, vec![carl.id]);
    let assigned: BTreeSet<MemberId> = store.assignments().iter().map(|a| a.member_id).collect();
    assert_eq!(assigned, BTreeSet::from([anna.id, bert.id]));
    for id in [anna.id, bert.id, carl.id] {
        assert!(store.member(&id).expect("member").notification.pending);
    }
}

#[rstest]
#[tokio::test]
async fn second_identical_call_is_a_no_op(harness: Harness) {
    let desired = selection(&harness.task, &[&harness.anna, &harness.bert]);
    harness
        .reconciler
        .reconcile(&harness.board, desired.clone())
        .await
        .expect("first reconcile");
    let writes = harness.store.write_count();
    let raises = harness.store.flag_raise_count();

    let outcome = harness
        .reconciler
        .reconcile(&harness.board, desired)
        .await
        .expect("second reconcile");

    assert!(outcome.created.is_empty() && outcome.deleted.is_empty() && outcome.flagged.is_empty());
    assert_eq!(harness.store.write_count(), writes);
    assert_eq!(harness.store.flag_raise_count(), raises);
}

#[rstest]
#[tokio::test]
async fn removing_an_assignment_drops_its_slots(harness: Harness) {
    let assignment = harness
        .store
        .seed_assignment(Assignment::new(harness.anna.id, harness.task.id, Utc::now()));
    harness
        .store
        .seed_slot(assignment.id, HourSlot::new(10).expect("hour"));

    harness
        .reconciler
        .reconcile(&harness.board, selection(&harness.task, &[]))
        .await
        .expect("reconcile");

    assert!(harness.store.assignments().is_empty());
    assert!(harness.store.slots().is_empty());
}

#[rstest]
#[tokio::test]
async fn non_board_members_are_forbidden(harness: Harness) {
    let err = harness
        .reconciler
        .reconcile(
            &Actor::from(&harness.anna),
            selection(&harness.task, &[&harness.anna]),
        )
        .await
        .expect_err("must be rejected");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(harness.store.assignments().is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_task_is_not_found(harness: Harness) {
    let err = harness
        .reconciler
        .reconcile(
            &harness.board,
            TaskSelection {
                task_id: TaskId::random(),
                desired_member_ids: BTreeSet::new(),
            },
        )
        .await
        .expect_err("unknown task");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn unknown_member_rolls_back_the_whole_task(harness: Harness) {
    let ghost = MemberId::random();
    let err = harness
        .reconciler
        .reconcile(
            &harness.board,
            TaskSelection {
                task_id: harness.task.id,
                desired_member_ids: BTreeSet::from([harness.anna.id, ghost]),
            },
        )
        .await
        .expect_err("missing member");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(harness.store.assignments().is_empty());
    assert!(!harness.store.member(&harness.anna.id).expect("anna").notification.pending);
}

#[rstest]
#[tokio::test]
async fn reconcile_many_stops_at_the_failing_task(harness: Harness) {
    let missing = TaskId::random();
    let err = harness
        .reconciler
        .reconcile_many(
            &harness.board,
            vec![
                selection(&harness.task, &[&harness.anna]),
                TaskSelection {
                    task_id: missing,
                    desired_member_ids: BTreeSet::from([harness.bert.id]),
                },
            ],
        )
        .await
        .expect_err("second task fails");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(
        err.details().and_then(|d| d.get("taskId")).and_then(|v| v.as_str()),
        Some(missing.to_string().as_str())
    );
    assert_eq!(harness.store.assignments().len(), 1);
}

#[rstest]
#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let store = InMemoryStore::new();
    let mut ports = store.ports();
    let mut tasks = MockTaskRepository::new();
    let festival = task("Hafenfest", &group(&board_member("Olaf")));
    tasks
        .expect_find_by_id()
        .returning(move |_| Ok(Some(festival.clone())));
    let mut assignments = MockAssignmentRepository::new();
    assignments
        .expect_list_for_task()
        .returning(|_| Err(AssignmentRepositoryError::connection("pool timed out")));
    assignments.expect_apply_reconciliation().times(0);
    ports.tasks = Arc::new(tasks);
    ports.assignments = Arc::new(assignments);

    let reconciler =
        AssignmentReconciler::new(ports, Arc::new(MutableClock::at_date(date(2024, 5, 1))));
    let err = reconciler
        .reconcile(
            &Actor::board(MemberId::random()),
            TaskSelection {
                task_id: TaskId::random(),
                desired_member_ids: BTreeSet::from([MemberId::random()]),
            },
        )
        .await
        .expect_err("outage");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

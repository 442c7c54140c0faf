//! Diesel adapters exercised through the domain services against a real
//! PostgreSQL database.
//!
//! Set `ARBEITSPLAN_TEST_DATABASE_URL` to run; the suite skips otherwise.

mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use arbeitsplan::domain::ports::DomainPorts;
use arbeitsplan::domain::{
    Actor, AssignmentReconciler, ErrorCode, Hours, Member, PreferenceLevel, PreferenceRegistry,
    Task, TaskSelection, WorkLogDraft, WorkLogReview, WorkLogService, WorkLogStatus,
    WorkloadLedger,
};
use arbeitsplan::outbound::persistence::diesel_ports;
use arbeitsplan::test_support::MutableClock;
use arbeitsplan::test_support::fixtures::date;
use futures_util::future::join;
use mockable::Clock;
use rstest::rstest;
use support::{test_pool, unique_group, unique_member, unique_task};

struct Seeded {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
    chair: Member,
    anna: Member,
    bert: Member,
    task: Task,
}

async fn seeded() -> Option<Seeded> {
    let pool = test_pool().await?;
    let ports = diesel_ports(pool);
    let chair = Member {
        board: true,
        ..unique_member("Vera")
    };
    let anna = unique_member("Anna");
    let bert = unique_member("Bert");
    for member in [&chair, &anna, &bert] {
        ports.members.insert(member).await.expect("insert member");
    }
    let group = unique_group(&chair);
    ports.tasks.insert_group(&group).await.expect("insert group");
    let task = unique_task("Steg streichen", &group);
    ports.tasks.insert(&task).await.expect("insert task");
    Some(Seeded {
        ports,
        clock: Arc::new(MutableClock::at_date(date(2024, 5, 1))),
        chair,
        anna,
        bert,
        task,
    })
}

#[rstest]
#[tokio::test]
async fn reconciliation_persists_assignments_and_flags() {
    let Some(world) = seeded().await else {
        return;
    };
    let reconciler = AssignmentReconciler::new(world.ports.clone(), world.clock.clone());
    let board = Actor::from(&world.chair);

    let outcome = reconciler
        .reconcile(
            &board,
            TaskSelection {
                task_id: world.task.id,
                desired_member_ids: BTreeSet::from([world.anna.id, world.bert.id]),
            },
        )
        .await
        .expect("reconcile");
    assert_eq!(outcome.created.len(), 2);

    let again = reconciler
        .reconcile(
            &board,
            TaskSelection {
                task_id: world.task.id,
                desired_member_ids: BTreeSet::from([world.bert.id]),
            },
        )
        .await
        .expect("reconcile again");
    assert_eq!(again.deleted, vec![world.anna.id]);

    let assigned: Vec<_> = world
        .ports
        .assignments
        .list_for_task(&world.task.id)
        .await
        .expect("list assignments")
        .into_iter()
        .map(|detail| detail.assignment.member_id)
        .collect();
    assert_eq!(assigned, vec![world.bert.id]);

    let anna = world
        .ports
        .members
        .find_by_id(&world.anna.id)
        .await
        .expect("find member")
        .expect("stored member");
    assert!(anna.notification.pending);
}

#[rstest]
#[tokio::test]
async fn concurrent_get_or_create_yields_one_preference() {
    let Some(world) = seeded().await else {
        return;
    };
    let registry = PreferenceRegistry::new(world.ports.clone(), world.clock.clone());

    let (first, second) = join(
        registry.get_or_create(world.anna.id, world.task.id),
        registry.get_or_create(world.anna.id, world.task.id),
    )
    .await;

    let first = first.expect("first call");
    let second = second.expect("second call");
    assert_eq!(first.id, second.id);
    assert_eq!(first.member_level, PreferenceLevel::default());
    assert_eq!(
        world
            .ports
            .preferences
            .list_for_task(&world.task.id)
            .await
            .expect("list preferences")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn reviewed_work_logs_feed_the_workload() {
    let Some(world) = seeded().await else {
        return;
    };
    let work_logs = WorkLogService::new(world.ports.clone(), world.clock.clone());
    let workload = WorkloadLedger::new(world.ports.clone(), world.clock.clone());
    let anna = Actor::from(&world.anna);
    let board = Actor::from(&world.chair);

    let log = work_logs
        .submit(
            &anna,
            WorkLogDraft {
                task_id: world.task.id,
                worked_on: date(2024, 4, 27),
                hours: Hours::from_tenths(25),
                remark: "Zweiter Anstrich".to_owned(),
            },
        )
        .await
        .expect("submit");
    work_logs
        .review(
            &board,
            log.id,
            WorkLogReview {
                status: WorkLogStatus::Accepted,
                board_remark: String::new(),
            },
        )
        .await
        .expect("review");

    let balance = workload.balance(world.anna.id).await.expect("balance");
    assert_eq!(balance.accepted, Hours::from_tenths(25));
    assert_eq!(balance.open, Hours::ZERO);

    let err = work_logs
        .delete_own(&anna, log.id)
        .await
        .expect_err("accepted logs are locked");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn store_side_guards_hold_against_outdated_reads() {
    let Some(world) = seeded().await else {
        return;
    };
    let registry = PreferenceRegistry::new(world.ports.clone(), world.clock.clone());
    let reconciler = AssignmentReconciler::new(world.ports.clone(), world.clock.clone());
    let preference = registry
        .get_or_create(world.anna.id, world.task.id)
        .await
        .expect("preference");
    reconciler
        .reconcile(
            &Actor::from(&world.chair),
            TaskSelection {
                task_id: world.task.id,
                desired_member_ids: BTreeSet::from([world.anna.id]),
            },
        )
        .await
        .expect("assign anna");

    let err = registry
        .update_member_preference(&Actor::from(&world.anna), preference.id, PreferenceLevel::Never)
        .await
        .expect_err("assigned members cannot withdraw");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let anna = world
        .ports
        .members
        .find_by_id(&world.anna.id)
        .await
        .expect("find member")
        .expect("stored member");
    let outdated = anna.notification.revision - 1;
    let cleared = world
        .ports
        .notifications
        .mark_notified(&anna.id, outdated, world.clock.utc())
        .await
        .expect("mark notified");
    assert!(!cleared);
    let cleared = world
        .ports
        .notifications
        .mark_notified(&anna.id, anna.notification.revision, world.clock.utc())
        .await
        .expect("mark notified");
    assert!(cleared);
}

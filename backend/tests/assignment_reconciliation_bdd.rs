//! Behavioural tests for board assignment reconciliation and the nightly
//! assignment digest, run against the in-memory store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arbeitsplan::domain::{
    Actor, AssignmentReconciler, BatchJobs, Error, ErrorCode, JobSettings, MailTemplate, Member,
    MemberId, ReconciliationOutcome, Task, TaskSelection,
};
use arbeitsplan::test_support::fixtures::{board_member, date, group, member, task};
use arbeitsplan::test_support::{InMemoryStore, MutableClock};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

/// Wrapper for non-Clone types to enable storage in `Slot`.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Default, ScenarioState)]
struct ReconciliationWorld {
    runtime: Slot<RuntimeHandle>,
    store: Slot<Arc<InMemoryStore>>,
    reconciler: Slot<AssignmentReconciler>,
    jobs: Slot<BatchJobs>,
    chair: Slot<Member>,
    task: Slot<Task>,
    members: Slot<HashMap<String, Member>>,
    last_outcome: Slot<Result<ReconciliationOutcome, Error>>,
}

impl ReconciliationWorld {
    fn store(&self) -> Arc<InMemoryStore> {
        self.store.get().expect("store")
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.get().expect("runtime").0.block_on(fut)
    }

    fn member_named(&self, name: &str) -> Member {
        self.members
            .get()
            .expect("members")
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("unknown member {name}"))
    }

    fn member_ids(&self, names: &str) -> BTreeSet<MemberId> {
        split_names(names)
            .iter()
            .map(|name| self.member_named(name).id)
            .collect()
    }

    fn select(&self, actor: &Actor, names: &str) {
        let selection = TaskSelection {
            task_id: self.task.get().expect("task").id,
            desired_member_ids: self.member_ids(names),
        };
        let reconciler = self.reconciler.get().expect("reconciler");
        let outcome = self.block_on(reconciler.reconcile(actor, selection));
        self.last_outcome.set(outcome);
    }

    fn pending(&self, name: &str) -> bool {
        let id = self.member_named(name).id;
        self.store()
            .member(&id)
            .expect("stored member")
            .notification
            .pending
    }
}

fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

#[fixture]
fn world() -> ReconciliationWorld {
    ReconciliationWorld::default()
}

#[given("a club with members {names}")]
fn a_club_with_members(world: &ReconciliationWorld, names: String) {
    let store = InMemoryStore::new();
    let chair = store.seed_member(board_member("Vera"));
    let jetty = store.seed_task(task("Steg streichen", &store.seed_group(group(&chair))));
    let members = split_names(&names)
        .into_iter()
        .map(|name| {
            let seeded = store.seed_member(member(&name));
            (name, seeded)
        })
        .collect();
    let clock = Arc::new(MutableClock::at_date(date(2024, 5, 1)));

    world.runtime.set(RuntimeHandle(Arc::new(
        Runtime::new().expect("create runtime"),
    )));
    world
        .reconciler
        .set(AssignmentReconciler::new(store.ports(), clock.clone()));
    world
        .jobs
        .set(BatchJobs::new(store.ports(), clock, JobSettings::default()));
    world.chair.set(chair);
    world.task.set(jetty);
    world.members.set(members);
    world.store.set(store);
}

#[when("the board selects {names} for the task")]
fn the_board_selects(world: &ReconciliationWorld, names: String) {
    let actor = Actor::from(&world.chair.get().expect("chair"));
    world.select(&actor, &names);
}

#[when("member {name} selects {names} for the task")]
fn a_member_selects(world: &ReconciliationWorld, name: String, names: String) {
    let actor = Actor::from(&world.member_named(&name));
    world.select(&actor, &names);
}

#[when("the assignment notifier runs")]
fn the_assignment_notifier_runs(world: &ReconciliationWorld) {
    let jobs = world.jobs.get().expect("jobs");
    world
        .block_on(jobs.notify_assignments())
        .expect("notifier run");
}

#[then("the task has {count} assignments")]
fn the_task_has_assignments(world: &ReconciliationWorld, count: usize) {
    let task_id = world.task.get().expect("task").id;
    let assigned = world
        .store()
        .assignments()
        .into_iter()
        .filter(|assignment| assignment.task_id == task_id)
        .count();
    assert_eq!(assigned, count);
}

#[then("the last outcome created {created} and deleted {deleted}")]
fn the_last_outcome(world: &ReconciliationWorld, created: usize, deleted: usize) {
    let outcome = world
        .last_outcome
        .get()
        .expect("outcome")
        .expect("successful reconciliation");
    assert_eq!(outcome.created.len(), created);
    assert_eq!(outcome.deleted.len(), deleted);
}

#[then("the last reconciliation was forbidden")]
fn the_last_reconciliation_was_forbidden(world: &ReconciliationWorld) {
    let err = world
        .last_outcome
        .get()
        .expect("outcome")
        .expect_err("reconciliation should fail");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[then("{name} is pending notification")]
fn is_pending_notification(world: &ReconciliationWorld, name: String) {
    assert!(world.pending(&name), "{name} should be flagged");
}

#[then("{name} is not pending notification")]
fn is_not_pending_notification(world: &ReconciliationWorld, name: String) {
    assert!(!world.pending(&name), "{name} should not be flagged");
}

#[then("{count} assignment digests are queued")]
fn assignment_digests_are_queued(world: &ReconciliationWorld, count: usize) {
    assert_eq!(
        world.store().mails_with(MailTemplate::AssignmentDigest).len(),
        count
    );
}

#[scenario(
    path = "tests/features/assignment_reconciliation.feature",
    name = "Newly selected members are assigned and flagged"
)]
fn newly_selected_members_are_assigned(world: ReconciliationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/assignment_reconciliation.feature",
    name = "Resubmitting the same selection changes nothing"
)]
fn resubmitting_changes_nothing(world: ReconciliationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/assignment_reconciliation.feature",
    name = "Dropping a member deletes only their assignment"
)]
fn dropping_a_member(world: ReconciliationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/assignment_reconciliation.feature",
    name = "The nightly digest clears the flags"
)]
fn nightly_digest_clears_flags(world: ReconciliationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/assignment_reconciliation.feature",
    name = "Regular members cannot assign"
)]
fn regular_members_cannot_assign(world: ReconciliationWorld) {
    let _ = world;
}

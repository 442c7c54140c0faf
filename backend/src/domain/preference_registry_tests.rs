//! Tests for the preference registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    DuplicatePreference, MockMailQueue, PreferenceRepository, PreferenceRepositoryError,
    StoredPreference,
};
use crate::domain::{Assignment, ErrorCode, Member};
use crate::test_support::fixtures::{board_member, date, dated_task, group, member, task};
use crate::test_support::{InMemoryStore, MutableClock};

struct Harness {
    store: Arc<InMemoryStore>,
    registry: PreferenceRegistry,
    owner: Member,
    anna: Member,
    task: Task,
}

/// Preference store where the board assigns the member right after the
/// record was read, and whose next notifying write can be dropped.
struct Interleaved {
    store: Arc<InMemoryStore>,
    assign_after_read: AtomicBool,
    drop_next_write: AtomicBool,
}

impl Interleaved {
    fn new(store: &Arc<InMemoryStore>) -> Self {
        Self {
            store: store.clone(),
            assign_after_read: AtomicBool::new(false),
            drop_next_write: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PreferenceRepository for Interleaved {
    async fn get_or_create(
        &self,
        defaults: &Preference,
    ) -> Result<StoredPreference, PreferenceRepositoryError> {
        PreferenceRepository::get_or_create(self.store.as_ref(), defaults).await
    }

    async fn find_by_id(
        &self,
        id: &PreferenceId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        let found = PreferenceRepository::find_by_id(self.store.as_ref(), id).await?;
        if let Some(preference) = &found {
            if self.assign_after_read.swap(false, Ordering::SeqCst) {
                self.store.seed_assignment(Assignment::new(
                    preference.member_id,
                    preference.task_id,
                    Utc::now(),
                ));
            }
        }
        Ok(found)
    }

    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        PreferenceRepository::find(self.store.as_ref(), member, task).await
    }

    async fn update(&self, preference: &Preference) -> Result<(), PreferenceRepositoryError> {
        PreferenceRepository::update(self.store.as_ref(), preference).await
    }

    async fn update_and_notify(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<(), PreferenceRepositoryError> {
        if self.drop_next_write.swap(false, Ordering::SeqCst) {
            return Err(PreferenceRepositoryError::connection("connection reset"));
        }
        PreferenceRepository::update_and_notify(self.store.as_ref(), preference, notice).await
    }

    async fn update_unless_assigned(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<bool, PreferenceRepositoryError> {
        PreferenceRepository::update_unless_assigned(self.store.as_ref(), preference, notice).await
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        PreferenceRepository::list_for_member(self.store.as_ref(), member).await
    }

    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        PreferenceRepository::list_for_task(self.store.as_ref(), task).await
    }

    async fn duplicate_pairs(&self) -> Result<Vec<DuplicatePreference>, PreferenceRepositoryError> {
        PreferenceRepository::duplicate_pairs(self.store.as_ref()).await
    }
}

#[fixture]
fn harness() -> Harness {
    let store = InMemoryStore::new();
    let owner = store.seed_member(board_member("Olga"));
    let group = store.seed_group(group(&owner));
    let task = store.seed_task(dated_task("Kran bedienen", &group, date(2024, 9, 14)));
    let anna = store.seed_member(member("Anna"));
    let clock = Arc::new(MutableClock::at_date(date(2024, 6, 1)));
    Harness {
        registry: PreferenceRegistry::new(store.ports(), clock),
        store,
        owner,
        anna,
        task,
    }
}

impl Harness {
    fn actor(&self) -> Actor {
        Actor::from(&self.anna)
    }

    /// Registry over `preferences`; the plain mail queue must stay unused
    /// because owner notices are queued together with the record.
    fn registry_over(&self, preferences: Arc<Interleaved>) -> PreferenceRegistry {
        let mut ports = self.store.ports();
        ports.preferences = preferences;
        ports.mail = Arc::new(MockMailQueue::new());
        PreferenceRegistry::new(ports, Arc::new(MutableClock::at_date(date(2024, 6, 1))))
    }

    async fn preference(&self) -> Preference {
        self.registry
            .get_or_create(self.anna.id, self.task.id)
            .await
            .expect("get or create")
    }
}

#[rstest]
#[tokio::test]
async fn get_or_create_never_duplicates(harness: Harness) {
    let first = harness.preference().await;
    let second = harness.preference().await;

    assert_eq!(first.id, second.id);
    assert_eq!(first.member_level, PreferenceLevel::Ok);
    assert_eq!(first.board_level, PreferenceLevel::Ok);
    assert_eq!(harness.store.preferences().len(), 1);
}

#[rstest]
#[tokio::test]
async fn concurrent_get_or_create_yields_one_record(harness: Harness) {
    let (a, b) = tokio::join!(harness.preference(), harness.preference());
    assert_eq!(a.id, b.id);
    assert_eq!(harness.store.preferences().len(), 1);
}

#[rstest]
#[case(PreferenceLevel::Gladly, "Neue Meldung")]
#[case(PreferenceLevel::Reluctant, "Neue Meldung")]
#[case(PreferenceLevel::Never, "Meldung zurückgezogen")]
#[tokio::test]
async fn first_level_change_notifies_the_owner(
    harness: Harness,
    #[case] level: PreferenceLevel,
    #[case] comment: &str,
) {
    let preference = harness.preference().await;

    let updated = harness
        .registry
        .update_member_preference(&harness.actor(), preference.id, level)
        .await
        .expect("update");

    assert_eq!(updated.member_level, level);
    let mails = harness.store.mails_with(MailTemplate::PreferenceNotice);
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].recipients, vec![harness.owner.id]);
    assert_eq!(mails[0].context["comment"], comment);
}

#[rstest]
#[tokio::test]
async fn later_changes_are_reported_as_updates(harness: Harness) {
    let preference = harness.preference().await;
    let actor = harness.actor();
    harness
        .registry
        .update_member_preference(&actor, preference.id, PreferenceLevel::Gladly)
        .await
        .expect("first");
    harness
        .registry
        .update_member_preference(&actor, preference.id, PreferenceLevel::Reluctant)
        .await
        .expect("second");

    let mails = harness.store.mails_with(MailTemplate::PreferenceNotice);
    assert_eq!(mails.len(), 2);
    assert_eq!(mails[1].context["comment"], "Präferenz aktualisiert");
}

#[rstest]
#[tokio::test]
async fn unchanged_level_sends_nothing(harness: Harness) {
    let preference = harness.preference().await;
    harness
        .registry
        .update_member_preference(&harness.actor(), preference.id, PreferenceLevel::Ok)
        .await
        .expect("no-op update");
    assert!(harness.store.outbox().is_empty());
}

#[rstest]
#[tokio::test]
async fn withdrawal_is_blocked_while_assigned(harness: Harness) {
    let preference = harness.preference().await;
    harness
        .store
        .seed_assignment(Assignment::new(harness.anna.id, harness.task.id, Utc::now()));

    let err = harness
        .registry
        .update_member_preference(&harness.actor(), preference.id, PreferenceLevel::Never)
        .await
        .expect_err("assigned members cannot withdraw");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.store.preferences(), vec![preference]);
    assert!(harness.store.outbox().is_empty());
}

#[rstest]
#[tokio::test]
async fn assignment_landing_after_the_read_still_blocks_withdrawal(harness: Harness) {
    let preference = harness.preference().await;
    let interleaved = Arc::new(Interleaved::new(&harness.store));
    interleaved.assign_after_read.store(true, Ordering::SeqCst);
    let registry = harness.registry_over(interleaved);

    let err = registry
        .update_member_preference(&harness.actor(), preference.id, PreferenceLevel::Never)
        .await
        .expect_err("assigned meanwhile");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.store.assignments().len(), 1);
    assert_eq!(harness.store.preferences(), vec![preference]);
    assert!(harness.store.outbox().is_empty());
}

#[rstest]
#[tokio::test]
async fn failed_write_queues_no_notice_and_retry_sends_one(harness: Harness) {
    let preference = harness.preference().await;
    let interleaved = Arc::new(Interleaved::new(&harness.store));
    interleaved.drop_next_write.store(true, Ordering::SeqCst);
    let registry = harness.registry_over(interleaved);
    let actor = harness.actor();

    let err = registry
        .update_member_preference(&actor, preference.id, PreferenceLevel::Gladly)
        .await
        .expect_err("dropped write");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(harness.store.preferences(), vec![preference.clone()]);
    assert!(harness.store.outbox().is_empty());

    registry
        .update_member_preference(&actor, preference.id, PreferenceLevel::Gladly)
        .await
        .expect("retry");

    let mails = harness.store.mails_with(MailTemplate::PreferenceNotice);
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].context["comment"], "Neue Meldung");
}

#[rstest]
#[tokio::test]
async fn remarks_and_quick_preferences_queue_their_notice_with_the_record(harness: Harness) {
    let preference = harness.preference().await;
    let group = harness.store.seed_group(group(&harness.owner));
    let slipway = harness
        .store
        .seed_task(dated_task("Slipanlage", &group, date(2024, 9, 21)));
    let registry = harness.registry_over(Arc::new(Interleaved::new(&harness.store)));

    registry
        .update_remarks(&harness.actor(), preference.id, "Habe einen Kranschein".into())
        .await
        .expect("remark");
    registry
        .quick_preference(&harness.actor(), slipway.id)
        .await
        .expect("quick preference");

    let comments: Vec<_> = harness
        .store
        .mails_with(MailTemplate::PreferenceNotice)
        .iter()
        .map(|mail| mail.context["comment"].clone())
        .collect();
    assert_eq!(comments, vec!["Neue Bemerkung", "Neue Meldung"]);
}

#[rstest]
#[tokio::test]
async fn past_tasks_are_frozen(harness: Harness) {
    let group = group(&harness.owner);
    harness.store.seed_group(group.clone());
    let old = harness
        .store
        .seed_task(dated_task("Altes Fest", &group, date(2024, 5, 1)));
    let preference = harness
        .registry
        .get_or_create(harness.anna.id, old.id)
        .await
        .expect("create");

    let err = harness
        .registry
        .update_remarks(&harness.actor(), preference.id, "komme später".into())
        .await
        .expect_err("past task");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "task already took place");
}

#[rstest]
#[tokio::test]
async fn other_members_cannot_edit(harness: Harness) {
    let preference = harness.preference().await;
    let err = harness
        .registry
        .update_remarks(
            &Actor::member(MemberId::random()),
            preference.id,
            "hijack".into(),
        )
        .await
        .expect_err("not the owner");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn new_remark_is_reported(harness: Harness) {
    let preference = harness.preference().await;
    harness
        .registry
        .update_remarks(&harness.actor(), preference.id, "nur vormittags".into())
        .await
        .expect("remark");

    let mails = harness.store.mails_with(MailTemplate::PreferenceNotice);
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].context["comment"], "Neue Bemerkung");
}

#[rstest]
#[tokio::test]
async fn board_rating_requires_board_rights(harness: Harness) {
    let preference = harness.preference().await;
    let err = harness
        .registry
        .update_board_preference(&harness.actor(), preference.id, PreferenceLevel::Never)
        .await
        .expect_err("not board");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let updated = harness
        .registry
        .update_board_preference(
            &Actor::from(&harness.owner),
            preference.id,
            PreferenceLevel::Gladly,
        )
        .await
        .expect("board update");
    assert_eq!(updated.board_level, PreferenceLevel::Gladly);
    assert!(harness.store.outbox().is_empty());
}

#[rstest]
#[tokio::test]
async fn quick_preference_marks_gladly_once(harness: Harness) {
    let actor = harness.actor();
    let first = harness
        .registry
        .quick_preference(&actor, harness.task.id)
        .await
        .expect("quick");
    assert_eq!(first.member_level, PreferenceLevel::Gladly);
    assert_eq!(first.remarks, QUICK_PREFERENCE_REMARK);

    harness
        .registry
        .quick_preference(&actor, harness.task.id)
        .await
        .expect("repeat");
    assert_eq!(harness.store.mails_with(MailTemplate::PreferenceNotice).len(), 1);
    assert_eq!(harness.store.preferences().len(), 1);
}

#[rstest]
#[tokio::test]
async fn undated_tasks_accept_preferences(harness: Harness) {
    let group = harness.store.seed_group(group(&harness.owner));
    let undated = harness.store.seed_task(task("Bootshaus putzen", &group));
    let preference = harness
        .registry
        .get_or_create(harness.anna.id, undated.id)
        .await
        .expect("create");
    harness
        .registry
        .update_member_preference(&harness.actor(), preference.id, PreferenceLevel::Gladly)
        .await
        .expect("undated task is never past");
}

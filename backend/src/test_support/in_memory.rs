//! In-memory implementation of every domain port.
//!
//! Mirrors the constraints of the PostgreSQL schema closely enough for
//! service tests: unique (member, task) pairs, cascades from tasks and
//! assignments, the work-log restriction on task deletion and all-or-nothing
//! plan application.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::ports::{
    AcceptedWorkTotal, AssignmentRepository, AssignmentRepositoryError, DomainPorts,
    DuplicatePreference, MailQueue, MailQueueError, MaintenanceRepository,
    MaintenanceRepositoryError, MemberRepository, MemberRepositoryError, NotificationFlagError,
    NotificationFlagStore, PreferenceRepository, PreferenceRepositoryError, StoredPreference,
    TaskRepository, TaskRepositoryError, WorkLogRepository, WorkLogRepositoryError,
    YearEndSummary,
};
use crate::domain::{
    AppliedReconciliation, AppliedTimeSlotPlan, Assignment, AssignmentDetail, AssignmentId, Hours,
    HourSlot, MailTemplate, Member, MemberId, OutgoingMail, Preference, PreferenceId,
    ReconciliationPlan, Task, TaskGroup, TaskGroupId, TaskId, TimeSlotPlan, TimeSlotRequirement,
    WorkLog, WorkLogId, WorkLogStatus,
};

#[derive(Default)]
struct State {
    members: BTreeMap<MemberId, Member>,
    groups: BTreeMap<TaskGroupId, TaskGroup>,
    tasks: BTreeMap<TaskId, Task>,
    requirements: BTreeMap<(TaskId, HourSlot), u32>,
    preferences: Vec<Preference>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    slots: BTreeSet<(AssignmentId, HourSlot)>,
    work_logs: BTreeMap<WorkLogId, WorkLog>,
    outbox: Vec<OutgoingMail>,
    writes: u64,
    flag_raises: u64,
}

impl State {
    fn detail(&self, assignment: &Assignment) -> Option<AssignmentDetail> {
        let task = self.tasks.get(&assignment.task_id)?.clone();
        let slots = self
            .slots
            .iter()
            .filter(|(id, _)| *id == assignment.id)
            .map(|(_, hour)| *hour)
            .collect();
        Some(AssignmentDetail {
            assignment: assignment.clone(),
            task,
            slots,
        })
    }

    fn details_where(&self, keep: impl Fn(&Assignment, &Task) -> bool) -> Vec<AssignmentDetail> {
        self.assignments
            .values()
            .filter(|assignment| {
                self.tasks
                    .get(&assignment.task_id)
                    .is_some_and(|task| keep(assignment, task))
            })
            .filter_map(|assignment| self.detail(assignment))
            .collect()
    }

    fn assignment_of(&self, member: &MemberId, task: &TaskId) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.member_id == *member && a.task_id == *task)
    }

    fn remove_assignment(&mut self, id: &AssignmentId) {
        self.assignments.remove(id);
        self.slots.retain(|(assignment, _)| assignment != id);
    }

    fn raise_flags<'a>(&mut self, members: impl IntoIterator<Item = &'a MemberId>) -> u64 {
        let mut raised = 0;
        for id in members {
            if let Some(member) = self.members.get_mut(id) {
                member.notification.pending = true;
                member.notification.revision += 1;
                raised += 1;
            }
        }
        self.flag_raises += raised;
        raised
    }
}

/// Shared in-memory store; clone the `Arc` to hand it to several ports.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

macro_rules! ensure_online {
    ($self:ident, $err:ty) => {
        if $self.offline.load(Ordering::SeqCst) {
            return Err(<$err>::connection("store offline"));
        }
    };
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this store as every domain port.
    pub fn ports(self: &Arc<Self>) -> DomainPorts {
        DomainPorts {
            members: self.clone(),
            tasks: self.clone(),
            preferences: self.clone(),
            assignments: self.clone(),
            work_logs: self.clone(),
            notifications: self.clone(),
            maintenance: self.clone(),
            mail: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory store mutex"),
        }
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn seed_member(&self, member: Member) -> Member {
        self.lock().members.insert(member.id, member.clone());
        member
    }

    pub fn seed_group(&self, group: TaskGroup) -> TaskGroup {
        self.lock().groups.insert(group.id, group.clone());
        group
    }

    pub fn seed_task(&self, task: Task) -> Task {
        self.lock().tasks.insert(task.id, task.clone());
        task
    }

    pub fn seed_requirement(&self, task: TaskId, hour: HourSlot, headcount: u32) {
        self.lock().requirements.insert((task, hour), headcount);
    }

    pub fn seed_preference(&self, preference: Preference) -> Preference {
        self.lock().preferences.push(preference.clone());
        preference
    }

    pub fn seed_assignment(&self, assignment: Assignment) -> Assignment {
        self.lock()
            .assignments
            .insert(assignment.id, assignment.clone());
        assignment
    }

    pub fn seed_slot(&self, assignment: AssignmentId, hour: HourSlot) {
        self.lock().slots.insert((assignment, hour));
    }

    pub fn seed_work_log(&self, log: WorkLog) -> WorkLog {
        self.lock().work_logs.insert(log.id, log.clone());
        log
    }

    pub fn member(&self, id: &MemberId) -> Option<Member> {
        self.lock().members.get(id).cloned()
    }

    pub fn preferences(&self) -> Vec<Preference> {
        self.lock().preferences.clone()
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        self.lock().assignments.values().cloned().collect()
    }

    pub fn slots(&self) -> Vec<(AssignmentId, HourSlot)> {
        self.lock().slots.iter().copied().collect()
    }

    pub fn work_log(&self, id: &WorkLogId) -> Option<WorkLog> {
        self.lock().work_logs.get(id).cloned()
    }

    pub fn outbox(&self) -> Vec<OutgoingMail> {
        self.lock().outbox.clone()
    }

    pub fn mails_with(&self, template: MailTemplate) -> Vec<OutgoingMail> {
        self.lock()
            .outbox
            .iter()
            .filter(|mail| mail.template == template)
            .cloned()
            .collect()
    }

    /// Number of applied reconciliation and slot plans.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    /// Number of individual flag raises, counting repeats.
    pub fn flag_raise_count(&self) -> u64 {
        self.lock().flag_raises
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        Ok(self.lock().members.get(id).cloned())
    }

    async fn find_many(&self, ids: &[MemberId]) -> Result<Vec<Member>, MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.members.get(id).cloned())
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<Member>, MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        Ok(self
            .lock()
            .members
            .values()
            .filter(|member| member.active)
            .cloned()
            .collect())
    }

    async fn list_board(&self) -> Result<Vec<Member>, MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        Ok(self
            .lock()
            .members
            .values()
            .filter(|member| member.board && member.active)
            .cloned()
            .collect())
    }

    async fn insert(&self, member: &Member) -> Result<(), MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        let mut state = self.lock();
        if state
            .members
            .values()
            .any(|existing| existing.member_number == member.member_number)
        {
            return Err(MemberRepositoryError::duplicate_member_number(
                member.member_number.clone(),
            ));
        }
        state.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn update_quota(&self, id: &MemberId, quota: Hours) -> Result<(), MemberRepositoryError> {
        ensure_online!(self, MemberRepositoryError);
        if let Some(member) = self.lock().members.get_mut(id) {
            member.quota = quota;
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationFlagStore for InMemoryStore {
    async fn pending_members(&self) -> Result<Vec<Member>, NotificationFlagError> {
        ensure_online!(self, NotificationFlagError);
        Ok(self
            .lock()
            .members
            .values()
            .filter(|member| member.notification.pending)
            .cloned()
            .collect())
    }

    async fn mark_notified(
        &self,
        member: &MemberId,
        seen_revision: i64,
        at: DateTime<Utc>,
    ) -> Result<bool, NotificationFlagError> {
        ensure_online!(self, NotificationFlagError);
        let mut state = self.lock();
        let Some(record) = state.members.get_mut(member) else {
            return Err(NotificationFlagError::unknown_member(member.to_string()));
        };
        if record.notification.revision != seen_revision {
            return Ok(false);
        }
        record.notification.pending = false;
        record.notification.last_notified_at = at;
        Ok(true)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        Ok(self.lock().tasks.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>, TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        let mut tasks: Vec<Task> = self.lock().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.name.as_ref().cmp(b.name.as_ref()));
        Ok(tasks)
    }

    async fn insert(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        let mut state = self.lock();
        if !state.groups.contains_key(&task.group_id) {
            return Err(TaskRepositoryError::unknown_group(task.group_id.to_string()));
        }
        if state.tasks.values().any(|t| t.name == task.name) {
            return Err(TaskRepositoryError::duplicate_name(task.name.to_string()));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        let mut state = self.lock();
        if !state.groups.contains_key(&task.group_id) {
            return Err(TaskRepositoryError::unknown_group(task.group_id.to_string()));
        }
        if state
            .tasks
            .values()
            .any(|t| t.name == task.name && t.id != task.id)
        {
            return Err(TaskRepositoryError::duplicate_name(task.name.to_string()));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        let mut state = self.lock();
        if state.work_logs.values().any(|log| log.task_id == *id) {
            return Err(TaskRepositoryError::task_in_use(id.to_string()));
        }
        state.tasks.remove(id);
        state.preferences.retain(|p| p.task_id != *id);
        state.requirements.retain(|(task, _), _| task != id);
        let doomed: Vec<AssignmentId> = state
            .assignments
            .values()
            .filter(|a| a.task_id == *id)
            .map(|a| a.id)
            .collect();
        for assignment in doomed {
            state.remove_assignment(&assignment);
        }
        Ok(())
    }

    async fn find_group(&self, id: &TaskGroupId) -> Result<Option<TaskGroup>, TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        Ok(self.lock().groups.get(id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<TaskGroup>, TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        Ok(self.lock().groups.values().cloned().collect())
    }

    async fn insert_group(&self, group: &TaskGroup) -> Result<(), TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        self.lock().groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn requirements(
        &self,
        task: &TaskId,
    ) -> Result<Vec<TimeSlotRequirement>, TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        Ok(self
            .lock()
            .requirements
            .iter()
            .filter(|((id, _), _)| id == task)
            .map(|((task_id, hour), headcount)| TimeSlotRequirement {
                task_id: *task_id,
                hour: *hour,
                headcount: *headcount,
            })
            .collect())
    }

    async fn replace_requirements(
        &self,
        task: &TaskId,
        requirements: &[TimeSlotRequirement],
    ) -> Result<(), TaskRepositoryError> {
        ensure_online!(self, TaskRepositoryError);
        let mut state = self.lock();
        state.requirements.retain(|(id, _), _| id != task);
        for requirement in requirements.iter().filter(|r| r.headcount > 0) {
            state
                .requirements
                .insert((*task, requirement.hour), requirement.headcount);
        }
        Ok(())
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryStore {
    async fn get_or_create(
        &self,
        defaults: &Preference,
    ) -> Result<StoredPreference, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        let mut state = self.lock();
        if let Some(existing) = state
            .preferences
            .iter()
            .find(|p| p.member_id == defaults.member_id && p.task_id == defaults.task_id)
        {
            return Ok(StoredPreference {
                preference: existing.clone(),
                created: false,
            });
        }
        if !state.members.contains_key(&defaults.member_id)
            || !state.tasks.contains_key(&defaults.task_id)
        {
            return Err(PreferenceRepositoryError::missing_reference(format!(
                "member {} / task {}",
                defaults.member_id, defaults.task_id
            )));
        }
        state.preferences.push(defaults.clone());
        Ok(StoredPreference {
            preference: defaults.clone(),
            created: true,
        })
    }

    async fn find_by_id(
        &self,
        id: &PreferenceId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        Ok(self.lock().preferences.iter().find(|p| p.id == *id).cloned())
    }

    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Preference>, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        Ok(self
            .lock()
            .preferences
            .iter()
            .find(|p| p.member_id == *member && p.task_id == *task)
            .cloned())
    }

    async fn update(&self, preference: &Preference) -> Result<(), PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        let mut state = self.lock();
        if let Some(slot) = state.preferences.iter_mut().find(|p| p.id == preference.id) {
            *slot = preference.clone();
        }
        Ok(())
    }

    async fn update_and_notify(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<(), PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        let mut state = self.lock();
        if let Some(slot) = state.preferences.iter_mut().find(|p| p.id == preference.id) {
            *slot = preference.clone();
        }
        state.outbox.push(notice.clone());
        Ok(())
    }

    async fn update_unless_assigned(
        &self,
        preference: &Preference,
        notice: &OutgoingMail,
    ) -> Result<bool, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        let mut state = self.lock();
        let assigned = state
            .assignments
            .values()
            .any(|a| a.member_id == preference.member_id && a.task_id == preference.task_id);
        if assigned {
            return Ok(false);
        }
        let Some(slot) = state.preferences.iter_mut().find(|p| p.id == preference.id) else {
            return Ok(false);
        };
        *slot = preference.clone();
        state.outbox.push(notice.clone());
        Ok(true)
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        Ok(self
            .lock()
            .preferences
            .iter()
            .filter(|p| p.member_id == *member)
            .cloned()
            .collect())
    }

    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<Preference>, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        Ok(self
            .lock()
            .preferences
            .iter()
            .filter(|p| p.task_id == *task)
            .cloned()
            .collect())
    }

    async fn duplicate_pairs(&self) -> Result<Vec<DuplicatePreference>, PreferenceRepositoryError> {
        ensure_online!(self, PreferenceRepositoryError);
        let mut counts: BTreeMap<(MemberId, TaskId), u64> = BTreeMap::new();
        for preference in &self.lock().preferences {
            *counts
                .entry((preference.member_id, preference.task_id))
                .or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((member_id, task_id), count)| DuplicatePreference {
                member_id,
                task_id,
                count,
            })
            .collect())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn find(
        &self,
        member: &MemberId,
        task: &TaskId,
    ) -> Result<Option<Assignment>, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        Ok(self.lock().assignment_of(member, task).cloned())
    }

    async fn list_for_task(
        &self,
        task: &TaskId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        Ok(self.lock().details_where(|a, _| a.task_id == *task))
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        Ok(self.lock().details_where(|a, _| a.member_id == *member))
    }

    async fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AssignmentDetail>, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        Ok(self.lock().details_where(|_, task| task.date == Some(date)))
    }

    async fn apply_reconciliation(
        &self,
        plan: &ReconciliationPlan,
    ) -> Result<AppliedReconciliation, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        let mut state = self.lock();
        if !state.tasks.contains_key(&plan.task_id) {
            return Err(AssignmentRepositoryError::missing_reference(format!(
                "task {}",
                plan.task_id
            )));
        }
        if let Some(unknown) = plan
            .to_create
            .iter()
            .find(|member| !state.members.contains_key(member))
        {
            return Err(AssignmentRepositoryError::missing_reference(format!(
                "member {unknown}"
            )));
        }

        let mut applied = AppliedReconciliation::default();
        for member in &plan.to_create {
            if state.assignment_of(member, &plan.task_id).is_none() {
                let assignment = Assignment::new(*member, plan.task_id, plan.at);
                state.assignments.insert(assignment.id, assignment);
                applied.created += 1;
            }
        }
        for member in &plan.to_delete {
            if let Some(id) = state.assignment_of(member, &plan.task_id).map(|a| a.id) {
                state.remove_assignment(&id);
                applied.deleted += 1;
            }
        }
        applied.flagged = state.raise_flags(&plan.flag_members);
        state.writes += 1;
        Ok(applied)
    }

    async fn apply_time_slot_plan(
        &self,
        plan: &TimeSlotPlan,
    ) -> Result<AppliedTimeSlotPlan, AssignmentRepositoryError> {
        ensure_online!(self, AssignmentRepositoryError);
        let mut state = self.lock();
        if let Some(orphan) = plan
            .to_create
            .iter()
            .find(|change| !state.assignments.contains_key(&change.assignment_id))
        {
            return Err(AssignmentRepositoryError::missing_assignment(
                orphan.member_id.to_string(),
                plan.task_id.to_string(),
            ));
        }

        let mut applied = AppliedTimeSlotPlan::default();
        for change in &plan.to_create {
            if state.slots.insert((change.assignment_id, change.hour)) {
                applied.created += 1;
            }
        }
        for change in &plan.to_delete {
            if state.slots.remove(&(change.assignment_id, change.hour)) {
                applied.deleted += 1;
            }
        }
        for (id, helpers) in &plan.helper_updates {
            if let Some(assignment) = state.assignments.get_mut(id) {
                assignment.extra_helpers = *helpers;
                applied.helpers_updated += 1;
            }
        }
        applied.flagged = state.raise_flags(&plan.flag_members);
        state.writes += 1;
        Ok(applied)
    }
}

#[async_trait]
impl WorkLogRepository for InMemoryStore {
    async fn insert(&self, log: &WorkLog) -> Result<(), WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        let mut state = self.lock();
        if !state.tasks.contains_key(&log.task_id) || !state.members.contains_key(&log.member_id) {
            return Err(WorkLogRepositoryError::missing_reference(format!(
                "member {} / task {}",
                log.member_id, log.task_id
            )));
        }
        state.work_logs.insert(log.id, log.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &WorkLogId) -> Result<Option<WorkLog>, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        Ok(self.lock().work_logs.get(id).cloned())
    }

    async fn update_open(&self, log: &WorkLog) -> Result<bool, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        let mut state = self.lock();
        match state.work_logs.get_mut(&log.id) {
            Some(stored) if !stored.status.is_terminal() => {
                *stored = log.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_open(&self, id: &WorkLogId) -> Result<bool, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        let mut state = self.lock();
        if state.work_logs.get(id).is_some_and(|log| !log.status.is_terminal()) {
            state.work_logs.remove(id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn record_review(
        &self,
        log: &WorkLog,
        notice: &OutgoingMail,
    ) -> Result<(), WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        let mut state = self.lock();
        let Some(stored) = state.work_logs.get_mut(&log.id) else {
            return Err(WorkLogRepositoryError::vanished(log.id.to_string()));
        };
        *stored = log.clone();
        state.outbox.push(notice.clone());
        Ok(())
    }

    async fn list_for_member(
        &self,
        member: &MemberId,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        Ok(self
            .lock()
            .work_logs
            .values()
            .filter(|log| log.member_id == *member)
            .cloned()
            .collect())
    }

    async fn list_for_tasks(
        &self,
        tasks: &[TaskId],
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        Ok(self
            .lock()
            .work_logs
            .values()
            .filter(|log| tasks.contains(&log.task_id))
            .cloned()
            .collect())
    }

    async fn list_unreviewed_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WorkLog>, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        Ok(self
            .lock()
            .work_logs
            .values()
            .filter(|log| !log.status.is_terminal() && log.created_at <= cutoff)
            .cloned()
            .collect())
    }

    async fn accepted_totals(&self) -> Result<Vec<AcceptedWorkTotal>, WorkLogRepositoryError> {
        ensure_online!(self, WorkLogRepositoryError);
        let mut totals: BTreeMap<TaskId, (Hours, BTreeSet<MemberId>)> = BTreeMap::new();
        for log in self
            .lock()
            .work_logs
            .values()
            .filter(|log| log.status == WorkLogStatus::Accepted)
        {
            let entry = totals.entry(log.task_id).or_default();
            entry.0 += log.hours;
            entry.1.insert(log.member_id);
        }
        Ok(totals
            .into_iter()
            .map(|(task_id, (hours, members))| AcceptedWorkTotal {
                task_id,
                hours,
                members: u32::try_from(members.len()).unwrap_or(u32::MAX),
            })
            .collect())
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryStore {
    async fn reset_year_end(&self) -> Result<YearEndSummary, MaintenanceRepositoryError> {
        ensure_online!(self, MaintenanceRepositoryError);
        let mut state = self.lock();
        let summary = YearEndSummary {
            work_logs: state.work_logs.len() as u64,
            assignments: state.assignments.len() as u64,
            preferences: state.preferences.len() as u64,
        };
        state.work_logs.clear();
        state.assignments.clear();
        state.slots.clear();
        state.preferences.clear();
        Ok(summary)
    }
}

#[async_trait]
impl MailQueue for InMemoryStore {
    async fn enqueue(&self, mail: OutgoingMail) -> Result<(), MailQueueError> {
        ensure_online!(self, MailQueueError);
        self.lock().outbox.push(mail);
        Ok(())
    }
}

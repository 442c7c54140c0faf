//! Preference lifecycle ("Meldungen").
//!
//! One record exists per (member, task). Members rate tasks and leave
//! remarks until the task date has passed; board members add their own
//! rating. Member-side changes are reported to the task owner through the
//! mail queue.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use super::ports::DomainPorts;
use super::port_errors::{map_member_error, map_preference_error, map_task_error};
use super::{
    Actor, Error, MailTemplate, MemberId, OutgoingMail, Preference, PreferenceChange,
    PreferenceId, PreferenceLevel, QUICK_PREFERENCE_REMARK, Task, TaskId,
};

/// Command service for preferences.
#[derive(Clone)]
pub struct PreferenceRegistry {
    ports: DomainPorts,
    clock: Arc<dyn Clock>,
}

impl PreferenceRegistry {
    /// Create a registry over the given ports.
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Return the preference of `member` for `task`, creating it with default
    /// levels when missing. Concurrent callers observe the same record.
    pub async fn get_or_create(&self, member: MemberId, task: TaskId) -> Result<Preference, Error> {
        let defaults = Preference::with_defaults(member, task, self.clock.utc());
        let stored = self
            .ports
            .preferences
            .get_or_create(&defaults)
            .await
            .map_err(map_preference_error)?;
        if stored.created {
            debug!(member_id = %member, task_id = %task, "preference created");
        }
        Ok(stored.preference)
    }

    /// Preferences of one member.
    pub async fn list_for_member(&self, member: MemberId) -> Result<Vec<Preference>, Error> {
        self.ports
            .preferences
            .list_for_member(&member)
            .await
            .map_err(map_preference_error)
    }

    /// Change the member's own rating of a task.
    ///
    /// Withdrawing ([`PreferenceLevel::Never`]) is refused while the member
    /// is assigned to the task; the record stays unchanged in that case.
    pub async fn update_member_preference(
        &self,
        actor: &Actor,
        id: PreferenceId,
        level: PreferenceLevel,
    ) -> Result<Preference, Error> {
        let (mut preference, task) = self.load_own(actor, id).await?;
        let Some(change) = PreferenceChange::classify(preference.member_level, level) else {
            return Ok(preference);
        };

        preference.member_level = level;
        preference.updated_at = self.clock.utc();
        if level == PreferenceLevel::Never {
            self.withdraw(&task, &preference, change).await?;
        } else {
            self.save_and_notify(&task, &preference, change).await?;
        }
        Ok(preference)
    }

    /// Change the member's remark. A new non-empty remark is reported.
    pub async fn update_remarks(
        &self,
        actor: &Actor,
        id: PreferenceId,
        remarks: String,
    ) -> Result<Preference, Error> {
        let (mut preference, task) = self.load_own(actor, id).await?;
        if preference.remarks == remarks {
            return Ok(preference);
        }
        preference.remarks = remarks;
        preference.updated_at = self.clock.utc();
        if preference.remarks.trim().is_empty() {
            self.save(&preference).await?;
        } else {
            self.save_and_notify(&task, &preference, PreferenceChange::NewRemark)
                .await?;
        }
        Ok(preference)
    }

    /// Set the board's rating. Board members only; never reported.
    pub async fn update_board_preference(
        &self,
        actor: &Actor,
        id: PreferenceId,
        level: PreferenceLevel,
    ) -> Result<Preference, Error> {
        let mut preference = self.load_for_board(actor, id).await?;
        preference.board_level = level;
        preference.updated_at = self.clock.utc();
        self.save(&preference).await?;
        Ok(preference)
    }

    /// Set the board's remark. Board members only; never reported.
    pub async fn update_board_remarks(
        &self,
        actor: &Actor,
        id: PreferenceId,
        remarks: String,
    ) -> Result<Preference, Error> {
        let mut preference = self.load_for_board(actor, id).await?;
        preference.board_remarks = remarks;
        preference.updated_at = self.clock.utc();
        self.save(&preference).await?;
        Ok(preference)
    }

    /// One-click "count me in": rate the task GLADLY with a marker remark.
    ///
    /// Existing preferences that already carry a remark are left alone.
    pub async fn quick_preference(
        &self,
        actor: &Actor,
        task_id: TaskId,
    ) -> Result<Preference, Error> {
        let task = self.load_task(task_id).await?;
        self.ensure_not_past(&task)?;
        let defaults = Preference::with_defaults(actor.member_id, task_id, self.clock.utc());
        let stored = self
            .ports
            .preferences
            .get_or_create(&defaults)
            .await
            .map_err(map_preference_error)?;
        let mut preference = stored.preference;
        if !stored.created && !preference.remarks.is_empty() {
            return Ok(preference);
        }

        preference.member_level = PreferenceLevel::Gladly;
        preference.remarks = QUICK_PREFERENCE_REMARK.to_owned();
        preference.updated_at = self.clock.utc();
        self.save_and_notify(&task, &preference, PreferenceChange::NewSubmission)
            .await?;
        Ok(preference)
    }

    async fn load(&self, id: PreferenceId) -> Result<Preference, Error> {
        self.ports
            .preferences
            .find_by_id(&id)
            .await
            .map_err(map_preference_error)?
            .ok_or_else(|| {
                Error::not_found(format!("preference {id} not found"))
                    .with_details(json!({ "preferenceId": id }))
            })
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, Error> {
        self.ports
            .tasks
            .find_by_id(&id)
            .await
            .map_err(map_task_error)?
            .ok_or_else(|| {
                Error::not_found(format!("task {id} not found"))
                    .with_details(json!({ "taskId": id }))
            })
    }

    async fn load_own(&self, actor: &Actor, id: PreferenceId) -> Result<(Preference, Task), Error> {
        let preference = self.load(id).await?;
        if preference.member_id != actor.member_id {
            return Err(Error::forbidden("preferences can only be changed by their member"));
        }
        let task = self.load_task(preference.task_id).await?;
        self.ensure_not_past(&task)?;
        Ok((preference, task))
    }

    async fn load_for_board(&self, actor: &Actor, id: PreferenceId) -> Result<Preference, Error> {
        if !actor.board {
            return Err(Error::forbidden("only board members may rate preferences"));
        }
        self.load(id).await
    }

    fn ensure_not_past(&self, task: &Task) -> Result<(), Error> {
        if task.is_past(self.clock.utc().date_naive()) {
            return Err(Error::invalid_request("task already took place")
                .with_details(json!({ "taskId": task.id, "date": task.date })));
        }
        Ok(())
    }

    async fn save(&self, preference: &Preference) -> Result<(), Error> {
        self.ports
            .preferences
            .update(preference)
            .await
            .map_err(map_preference_error)
    }

    async fn save_and_notify(
        &self,
        task: &Task,
        preference: &Preference,
        change: PreferenceChange,
    ) -> Result<(), Error> {
        let notice = self.owner_notice(task, preference, change).await?;
        self.ports
            .preferences
            .update_and_notify(preference, &notice)
            .await
            .map_err(map_preference_error)?;
        log_notice(task, preference, change);
        Ok(())
    }

    /// Store a withdrawal unless the member got assigned in the meantime.
    async fn withdraw(
        &self,
        task: &Task,
        preference: &Preference,
        change: PreferenceChange,
    ) -> Result<(), Error> {
        let notice = self.owner_notice(task, preference, change).await?;
        let written = self
            .ports
            .preferences
            .update_unless_assigned(preference, &notice)
            .await
            .map_err(map_preference_error)?;
        if !written {
            return Err(Error::invalid_request(
                "preference cannot be withdrawn while the member is assigned",
            )
            .with_details(json!({
                "field": "memberLevel",
                "memberId": preference.member_id,
                "taskId": preference.task_id,
            })));
        }
        log_notice(task, preference, change);
        Ok(())
    }

    async fn owner_notice(
        &self,
        task: &Task,
        preference: &Preference,
        change: PreferenceChange,
    ) -> Result<OutgoingMail, Error> {
        let member = self
            .ports
            .members
            .find_by_id(&preference.member_id)
            .await
            .map_err(map_member_error)?;
        let member_name = member.as_ref().map(|m| m.full_name()).unwrap_or_default();
        let context = json!({
            "comment": change.comment(),
            "preference": {
                "id": preference.id,
                "memberLevel": preference.member_level.label(),
                "remarks": preference.remarks,
            },
            "member": { "id": preference.member_id, "name": member_name },
            "task": { "id": task.id, "name": task.name, "date": task.date },
        });
        Ok(OutgoingMail::to(
            task.owner_id,
            MailTemplate::PreferenceNotice,
            context,
            self.clock.utc(),
        ))
    }
}

fn log_notice(task: &Task, preference: &Preference, change: PreferenceChange) {
    info!(
        preference_id = %preference.id,
        task_id = %task.id,
        comment = change.comment(),
        "task owner notified"
    );
}

#[cfg(test)]
#[path = "preference_registry_tests.rs"]
mod tests;

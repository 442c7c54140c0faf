//! Builders for domain records used across tests.

use chrono::NaiveDate;

use crate::domain::{
    DEFAULT_QUOTA, Hours, Member, MemberId, NotificationState, Task, TaskGroup, TaskGroupId,
    TaskId, TaskName,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid fixture date {year}-{month}-{day}"),
    }
}

/// Active, non-board member with the default quota who joined in 2020.
pub fn member(first_name: &str) -> Member {
    Member {
        id: MemberId::random(),
        member_number: format!("M-{first_name}"),
        first_name: first_name.to_owned(),
        last_name: "Tester".to_owned(),
        email: Some(format!("{}@example.org", first_name.to_lowercase())),
        quota: DEFAULT_QUOTA,
        joined_on: date(2020, 3, 1),
        board: false,
        active: true,
        notification: NotificationState::default(),
    }
}

pub fn board_member(first_name: &str) -> Member {
    Member {
        board: true,
        ..member(first_name)
    }
}

pub fn group(owner: &Member) -> TaskGroup {
    TaskGroup {
        id: TaskGroupId::random(),
        name: "Gelände".to_owned(),
        owner_id: owner.id,
        remark: String::new(),
    }
}

/// Undated task in `group` owned by the group owner.
pub fn task(name: &str, group: &TaskGroup) -> Task {
    let name = match TaskName::new(name) {
        Ok(name) => name,
        Err(err) => panic!("invalid fixture task name {name}: {err}"),
    };
    Task {
        id: TaskId::random(),
        name,
        group_id: group.id,
        required_headcount: 2,
        hours_per_person: Hours::from_whole(3),
        date: None,
        owner_id: group.owner_id,
        team_lead_id: None,
        remark: String::new(),
    }
}

pub fn dated_task(name: &str, group: &TaskGroup, on: NaiveDate) -> Task {
    Task {
        date: Some(on),
        ..task(name, group)
    }
}

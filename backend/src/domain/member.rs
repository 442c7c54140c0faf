//! Club members and their notification state.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Hours, MemberId};

/// Default yearly quota ("Jahresstunden").
pub const DEFAULT_QUOTA: Hours = Hours::from_whole(12);

/// Quotas at or above this value encode special membership categories and
/// are never touched by the yearly quota reset.
pub const CODED_QUOTA_THRESHOLD: Hours = Hours::from_whole(100);

/// Timestamp used for members who were never notified.
#[must_use]
pub fn never_notified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Pending-notification state of a member.
///
/// The flag is raised whenever an assignment or hour slot of the member is
/// created or deleted and only cleared by the nightly notifier. Every raise
/// bumps `revision`; the notifier clears the flag only if the revision it
/// read is still current, so a change landing mid-run keeps it raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub pending: bool,
    pub revision: i64,
    pub last_notified_at: DateTime<Utc>,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            pending: false,
            revision: 0,
            last_notified_at: never_notified(),
        }
    }
}

/// A club member with a yearly work quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub member_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub quota: Hours,
    pub joined_on: NaiveDate,
    pub board: bool,
    pub active: bool,
    pub notification: NotificationState,
}

impl Member {
    /// "First Last", used in mail contexts.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Members without an e-mail address or member number cannot be
    /// notified or matched against the club register.
    #[must_use]
    pub fn profile_incomplete(&self) -> bool {
        self.email.as_deref().is_none_or(|mail| mail.trim().is_empty())
            || self.member_number.trim().is_empty()
    }

    /// Quota values that are neither the default nor a coded category.
    #[must_use]
    pub fn has_unusual_quota(&self) -> bool {
        self.quota < CODED_QUOTA_THRESHOLD && self.quota != DEFAULT_QUOTA
    }
}

/// The authenticated member on whose behalf a use case runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub member_id: MemberId,
    pub board: bool,
}

impl Actor {
    /// Regular member without board rights.
    #[must_use]
    pub const fn member(member_id: MemberId) -> Self {
        Self {
            member_id,
            board: false,
        }
    }

    /// Board member ("Vorstand").
    #[must_use]
    pub const fn board(member_id: MemberId) -> Self {
        Self {
            member_id,
            board: true,
        }
    }
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            board: member.board,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn member(email: Option<&str>, quota: Hours) -> Member {
        Member {
            id: MemberId::random(),
            member_number: "0815".to_owned(),
            first_name: "Erika".to_owned(),
            last_name: "Muster".to_owned(),
            email: email.map(str::to_owned),
            quota,
            joined_on: NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid date"),
            board: false,
            active: true,
            notification: NotificationState::default(),
        }
    }

    #[rstest]
    #[case(Some("erika@example.org"), false)]
    #[case(Some("  "), true)]
    #[case(None, true)]
    fn profile_requires_an_email(#[case] email: Option<&str>, #[case] incomplete: bool) {
        assert_eq!(member(email, DEFAULT_QUOTA).profile_incomplete(), incomplete);
    }

    #[rstest]
    #[case(Hours::from_whole(12), false)]
    #[case(Hours::from_whole(6), true)]
    #[case(Hours::from_whole(100), false)]
    fn flags_unusual_quotas(#[case] quota: Hours, #[case] unusual: bool) {
        assert_eq!(member(None, quota).has_unusual_quota(), unusual);
    }

    #[rstest]
    fn default_notification_state_is_idle() {
        let state = NotificationState::default();
        assert!(!state.pending);
        assert_eq!(state.revision, 0);
        assert_eq!(state.last_notified_at.date_naive().to_string(), "1900-01-01");
    }
}

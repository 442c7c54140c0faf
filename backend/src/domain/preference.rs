//! Member preferences for tasks ("Meldungen").
//!
//! A preference records how much a member wants to do a task and how the
//! board rates that member for it. There is exactly one record per
//! (member, task) pair; it is created lazily with neutral defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{MemberId, PreferenceId, TaskId};

/// Interest level, shared by the member's and the board's rating.
///
/// # Examples
///
/// ```
/// # use arbeitsplan::domain::PreferenceLevel;
/// assert_eq!(PreferenceLevel::default(), PreferenceLevel::Ok);
/// assert_eq!(PreferenceLevel::try_from(-1), Ok(PreferenceLevel::Never));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceLevel {
    /// "Nein": the member will not do this task.
    Never,
    /// "Wenn es sein muss".
    Reluctant,
    /// "Ok".
    #[default]
    Ok,
    /// "Gerne!".
    Gladly,
}

impl PreferenceLevel {
    /// Stored numeric code (-1..=2).
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Never => -1,
            Self::Reluctant => 0,
            Self::Ok => 1,
            Self::Gladly => 2,
        }
    }

    /// Label shown to members.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "Nein",
            Self::Reluctant => "Wenn es sein muss",
            Self::Ok => "Ok",
            Self::Gladly => "Gerne!",
        }
    }
}

impl std::fmt::Display for PreferenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned for an unknown stored preference code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown preference code: {code}")]
pub struct ParsePreferenceLevelError {
    pub code: i16,
}

impl TryFrom<i16> for PreferenceLevel {
    type Error = ParsePreferenceLevelError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Self::Never),
            0 => Ok(Self::Reluctant),
            1 => Ok(Self::Ok),
            2 => Ok(Self::Gladly),
            _ => Err(ParsePreferenceLevelError { code }),
        }
    }
}

/// Remark set by the quick preference shortcut.
pub const QUICK_PREFERENCE_REMARK: &str = "QUICKMELDUNG";

/// A member's stated interest in a task plus the board's counter-rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub id: PreferenceId,
    pub member_id: MemberId,
    pub task_id: TaskId,
    pub member_level: PreferenceLevel,
    pub board_level: PreferenceLevel,
    pub remarks: String,
    pub board_remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Preference {
    /// Fresh record with default levels and empty remarks.
    #[must_use]
    pub fn with_defaults(member_id: MemberId, task_id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id: PreferenceId::random(),
            member_id,
            task_id,
            member_level: PreferenceLevel::default(),
            board_level: PreferenceLevel::default(),
            remarks: String::new(),
            board_remarks: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True unless the member declined the task.
    #[must_use]
    pub fn counts_as_submission(&self) -> bool {
        self.member_level != PreferenceLevel::Never
    }
}

/// Why a preference change is reported to the task owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceChange {
    NewRemark,
    NewSubmission,
    Withdrawn,
    LevelUpdated,
}

impl PreferenceChange {
    /// Classify a member level change; `None` when nothing changed.
    #[must_use]
    pub fn classify(previous: PreferenceLevel, next: PreferenceLevel) -> Option<Self> {
        if previous == next {
            None
        } else if next == PreferenceLevel::Never {
            Some(Self::Withdrawn)
        } else if previous == PreferenceLevel::default() {
            Some(Self::NewSubmission)
        } else {
            Some(Self::LevelUpdated)
        }
    }

    /// Comment line used in the owner notification.
    #[must_use]
    pub const fn comment(self) -> &'static str {
        match self {
            Self::NewRemark => "Neue Bemerkung",
            Self::NewSubmission => "Neue Meldung",
            Self::Withdrawn => "Meldung zurückgezogen",
            Self::LevelUpdated => "Präferenz aktualisiert",
        }
    }
}

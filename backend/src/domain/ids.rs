//! Strongly typed identifiers.
//!
//! Every aggregate is keyed by a UUID. Wrapping each in its own newtype keeps
//! member ids from being passed where a task id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a club member ("Mitglied").
    MemberId
);
define_id!(
    /// Identifier of a task ("Aufgabe").
    TaskId
);
define_id!(
    /// Identifier of a task group ("Aufgabengruppe").
    TaskGroupId
);
define_id!(
    /// Identifier of a preference record ("Meldung").
    PreferenceId
);
define_id!(
    /// Identifier of an assignment ("Zuteilung").
    AssignmentId
);
define_id!(
    /// Identifier of a work log entry ("Leistung").
    WorkLogId
);

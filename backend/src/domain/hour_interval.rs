//! Hour slots and their compression into consecutive intervals.
//!
//! An hour marker `h` stands for the one-hour slot `[h, h+1)`. Assignment
//! slots are stored one row per marker; for display they are folded into
//! maximal runs, so `{14, 15, 16}` reads as "14 Uhr - 17 Uhr". Hour totals
//! never use the compressed form: every slot counts as one hour.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// First hour offered by task hour schedules.
pub const SCHEDULE_FIRST_HOUR: u8 = 8;
/// Last hour offered by task hour schedules.
pub const SCHEDULE_LAST_HOUR: u8 = 23;

/// Errors raised for hour markers outside the valid range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HourIntervalError {
    #[error("hour marker {marker} is outside 0..=23")]
    OutOfRange { marker: i64 },
    #[error("hour {hour} is outside the schedule window {first}..={last}")]
    OutsideSchedule { hour: u8, first: u8, last: u8 },
}

/// Start of a one-hour slot, `0..=23`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct HourSlot(u8);

impl HourSlot {
    /// Validate a raw marker.
    pub fn new(marker: i64) -> Result<Self, HourIntervalError> {
        u8::try_from(marker)
            .ok()
            .filter(|hour| *hour <= 23)
            .map(Self)
            .ok_or(HourIntervalError::OutOfRange { marker })
    }

    /// Validate a marker that must also lie in the task schedule window.
    pub fn scheduled(marker: i64) -> Result<Self, HourIntervalError> {
        let slot = Self::new(marker)?;
        slot.ensure_scheduled()?;
        Ok(slot)
    }

    /// Reject slots outside [`SCHEDULE_FIRST_HOUR`]..=[`SCHEDULE_LAST_HOUR`].
    pub fn ensure_scheduled(self) -> Result<(), HourIntervalError> {
        if (SCHEDULE_FIRST_HOUR..=SCHEDULE_LAST_HOUR).contains(&self.0) {
            Ok(())
        } else {
            Err(HourIntervalError::OutsideSchedule {
                hour: self.0,
                first: SCHEDULE_FIRST_HOUR,
                last: SCHEDULE_LAST_HOUR,
            })
        }
    }

    /// All slots of the schedule window in ascending order.
    pub fn schedule_window() -> impl Iterator<Item = Self> {
        (SCHEDULE_FIRST_HOUR..=SCHEDULE_LAST_HOUR).map(Self)
    }

    /// The raw hour.
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for HourSlot {
    type Error = HourIntervalError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HourSlot> for u8 {
    fn from(value: HourSlot) -> Self {
        value.0
    }
}

impl fmt::Display for HourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed-open run of consecutive hours, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HourInterval {
    pub start: u8,
    pub end: u8,
}

impl HourInterval {
    /// Number of one-hour slots covered.
    #[must_use]
    pub const fn len(self) -> u8 {
        self.end.saturating_sub(self.start)
    }

    /// True when the interval covers no slot.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for HourInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Uhr - {} Uhr", self.start, self.end)
    }
}

/// Fold slots into maximal runs of consecutive hours.
///
/// The input order is irrelevant and duplicates collapse.
///
/// # Examples
/// ```
/// use arbeitsplan::domain::{compress, HourInterval, HourSlot};
///
/// let slots = [16, 14, 15].map(|h| HourSlot::new(h).unwrap());
/// assert_eq!(compress(slots), vec![HourInterval { start: 14, end: 17 }]);
/// ```
pub fn compress(slots: impl IntoIterator<Item = HourSlot>) -> Vec<HourInterval> {
    let ordered: BTreeSet<u8> = slots.into_iter().map(HourSlot::hour).collect();
    let mut intervals: Vec<HourInterval> = Vec::new();
    for hour in ordered {
        match intervals.last_mut() {
            Some(current) if current.end == hour => current.end = hour + 1,
            _ => intervals.push(HourInterval {
                start: hour,
                end: hour + 1,
            }),
        }
    }
    intervals
}

/// Validate raw markers and compress them.
///
/// Fails on the first marker outside `0..=23` instead of dropping it.
pub fn compress_markers(
    markers: impl IntoIterator<Item = i64>,
) -> Result<Vec<HourInterval>, HourIntervalError> {
    let slots = markers
        .into_iter()
        .map(HourSlot::new)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(compress(slots))
}

/// Render intervals as `"8 Uhr - 10 Uhr, 14 Uhr - 15 Uhr"`.
#[must_use]
pub fn format_intervals(intervals: &[HourInterval]) -> String {
    intervals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn range(start: u8, end: u8) -> HourInterval {
        HourInterval { start, end }
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![9], vec![range(9, 10)])]
    #[case(vec![14, 15, 16], vec![range(14, 17)])]
    #[case(vec![14, 16], vec![range(14, 15), range(16, 17)])]
    #[case(vec![23, 8, 9, 22], vec![range(8, 10), range(22, 24)])]
    #[case(vec![10, 10, 11], vec![range(10, 12)])]
    fn compresses_markers(#[case] markers: Vec<i64>, #[case] expected: Vec<HourInterval>) {
        assert_eq!(compress_markers(markers).expect("valid markers"), expected);
    }

    #[rstest]
    fn result_is_independent_of_input_order() {
        let forward = compress_markers([8, 9, 10, 13, 14]).expect("valid markers");
        let shuffled = compress_markers([14, 10, 8, 13, 9]).expect("valid markers");
        assert_eq!(forward, shuffled);
    }

    #[rstest]
    #[case(-1)]
    #[case(24)]
    fn rejects_markers_outside_the_day(#[case] marker: i64) {
        assert_eq!(
            compress_markers([10, marker]),
            Err(HourIntervalError::OutOfRange { marker })
        );
    }

    #[rstest]
    #[case(7, false)]
    #[case(8, true)]
    #[case(23, true)]
    fn schedule_window_is_eight_to_twenty_three(#[case] hour: i64, #[case] accepted: bool) {
        assert_eq!(HourSlot::scheduled(hour).is_ok(), accepted);
    }

    #[rstest]
    fn renders_german_hour_ranges() {
        let rendered = format_intervals(&[range(8, 10), range(14, 15)]);
        assert_eq!(rendered, "8 Uhr - 10 Uhr, 14 Uhr - 15 Uhr");
    }
}

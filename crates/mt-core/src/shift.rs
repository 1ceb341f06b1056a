//! Working shifts and the UTC windows reports are scanned over.
//!
//! Weekdays and Saturdays each have three shifts with fixed start hours and a
//! common duration; Sunday has none. Shift hours are local to the plant, so
//! every conversion takes the plant's UTC offset.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// One of the three daily shifts, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Shift(u8);

impl Shift {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(3);

    /// Returns the shift numbered `n`, if it exists.
    pub const fn new(n: u8) -> Option<Self> {
        if n >= Self::FIRST.0 && n <= Self::LAST.0 {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Pulls any number into the valid shift range.
    pub fn clamped(n: i64) -> Self {
        let n = n.clamp(i64::from(Self::FIRST.0), i64::from(Self::LAST.0));
        Self(u8::try_from(n).unwrap_or(Self::FIRST.0))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Shift {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| format!("shift must be between 1 and 3, got {n}"))
    }
}

impl From<Shift> for u8 {
    fn from(shift: Shift) -> Self {
        shift.0
    }
}

/// Shift start hours and duration for one kind of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDay {
    /// Local start hour of shifts 1, 2 and 3.
    pub starts: [u32; 3],
    pub duration_hours: u32,
}

impl ShiftDay {
    /// Whether a local time of day falls inside `shift`, wrapping past midnight.
    fn covers(&self, shift: Shift, time: NaiveTime) -> bool {
        let start = self.starts[shift.index()];
        let begin = (start % 24) * 3600;
        let end = ((start + self.duration_hours) % 24) * 3600;
        let t = time.num_seconds_from_midnight();
        if begin < end {
            t >= begin && t < end
        } else {
            t >= begin || t < end
        }
    }
}

/// The plant's shift schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTable {
    /// Monday through Friday.
    pub weekday: ShiftDay,
    pub saturday: ShiftDay,
}

impl Default for ShiftTable {
    fn default() -> Self {
        Self {
            weekday: ShiftDay {
                starts: [7, 15, 23],
                duration_hours: 8,
            },
            saturday: ShiftDay {
                starts: [7, 12, 17],
                duration_hours: 5,
            },
        }
    }
}

/// A half-open UTC range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ShiftWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at < self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }
}

impl ShiftTable {
    /// The schedule for a date's weekday; `None` on Sunday.
    pub fn day(&self, weekday: Weekday) -> Option<&ShiftDay> {
        match weekday {
            Weekday::Sun => None,
            Weekday::Sat => Some(&self.saturday),
            _ => Some(&self.weekday),
        }
    }

    /// UTC window of one shift on a local date.
    ///
    /// Sunday yields an empty window at local midnight.
    pub fn shift_window(&self, date: NaiveDate, shift: Shift, offset: FixedOffset) -> ShiftWindow {
        let midnight = date.and_time(NaiveTime::MIN);
        let Some(day) = self.day(date.weekday()) else {
            let at = local_to_utc(midnight, offset);
            return ShiftWindow { from: at, to: at };
        };
        let from = midnight + Duration::hours(i64::from(day.starts[shift.index()]));
        let to = from + Duration::hours(i64::from(day.duration_hours));
        ShiftWindow {
            from: local_to_utc(from, offset),
            to: local_to_utc(to, offset),
        }
    }

    /// Shift a local date and time falls in; `None` on Sunday or between shifts.
    pub fn shift_of(&self, local: NaiveDateTime) -> Option<Shift> {
        let day = self.day(local.weekday())?;
        (Shift::FIRST.0..=Shift::LAST.0)
            .map(Shift)
            .find(|shift| day.covers(*shift, local.time()))
    }
}

/// Converts a plant-local time to UTC.
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, Utc)
}

/// A report request: from one shift on one date to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRange {
    pub date_from: NaiveDate,
    pub shift_from: Shift,
    pub date_to: NaiveDate,
    pub shift_to: Shift,
}

impl ReportRange {
    /// Fills in and repairs a partially specified range.
    ///
    /// Missing dates are taken from the other end or from `today`; missing
    /// shifts default to the first and last shift. Out-of-range shifts are
    /// clamped. Reversed dates are swapped; on a single date, reversed shifts
    /// are swapped.
    pub fn normalize(
        date_from: Option<NaiveDate>,
        shift_from: Option<i64>,
        date_to: Option<NaiveDate>,
        shift_to: Option<i64>,
        today: NaiveDate,
    ) -> Self {
        let (mut date_from, mut date_to) = match (date_from, date_to) {
            (None, None) => (today, today),
            (Some(from), None) => (from, from),
            (None, Some(to)) => (to, to),
            (Some(from), Some(to)) => (from, to),
        };
        let mut shift_from = shift_from.map_or(Shift::FIRST, Shift::clamped);
        let mut shift_to = shift_to.map_or(Shift::LAST, Shift::clamped);

        if date_to < date_from {
            std::mem::swap(&mut date_from, &mut date_to);
        } else if date_to == date_from && shift_to < shift_from {
            std::mem::swap(&mut shift_from, &mut shift_to);
        }

        Self {
            date_from,
            shift_from,
            date_to,
            shift_to,
        }
    }

    /// From the start of the first shift to the end of the last.
    pub fn window(&self, table: &ShiftTable, offset: FixedOffset) -> ShiftWindow {
        ShiftWindow {
            from: table.shift_window(self.date_from, self.shift_from, offset).from,
            to: table.shift_window(self.date_to, self.shift_to, offset).to,
        }
    }
}

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{clock, recurrence::RecurrenceRule};

/// Store-assigned schedule identifier. `ScheduleId::UNSAVED` (0) until inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub i64);

impl ScheduleId {
    pub const UNSAVED: ScheduleId = ScheduleId(0);

    pub fn is_unsaved(self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScheduleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// User-facing importance of a schedule. Persisted as 0/1/2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Moderate,
    Important,
}

impl Priority {
    pub fn as_i64(self) -> i64 {
        match self {
            Priority::Normal => 0,
            Priority::Moderate => 1,
            Priority::Important => 2,
        }
    }

    /// Decode a stored level; out-of-range values read as `Normal`.
    pub fn from_i64(level: i64) -> Self {
        match level {
            0 => Priority::Normal,
            1 => Priority::Moderate,
            2 => Priority::Important,
            other => {
                warn!(level = other, "unknown priority level in storage, using normal");
                Priority::Normal
            }
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Normal => "normal",
            Priority::Moderate => "moderate",
            Priority::Important => "important",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" | "0" => Ok(Priority::Normal),
            "moderate" | "1" => Ok(Priority::Moderate),
            "important" | "2" => Ok(Priority::Important),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A persisted schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Primary key; `UNSAVED` before insertion.
    pub id: ScheduleId,
    pub title: String,
    pub description: Option<String>,
    /// Day the schedule was created for; origin of every recurrence.
    pub anchor_date: NaiveDate,
    /// Local start time on `anchor_date`. Only the time of day carries over
    /// to later occurrences.
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub is_all_day: bool,
    pub recurrence: Option<RecurrenceRule>,
    /// Minutes before `start_time` to remind; `None` means no reminder.
    pub reminder_offset_minutes: Option<i32>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleRecord {
    /// Unsaved one-off schedule on `anchor_date` with no time window.
    pub fn new(title: impl Into<String>, anchor_date: NaiveDate) -> Self {
        let now = clock::now_millis_precision();
        Self {
            id: ScheduleId::UNSAVED,
            title: title.into(),
            description: None,
            anchor_date,
            start_time: None,
            end_time: None,
            is_all_day: false,
            recurrence: None,
            reminder_offset_minutes: None,
            priority: Priority::Normal,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_times(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self.is_all_day = false;
        self
    }

    /// Mark as all-day; clears any time window.
    pub fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self.start_time = None;
        self.end_time = None;
        self
    }

    pub fn repeating(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_reminder(mut self, minutes: i32) -> Self {
        self.reminder_offset_minutes = Some(minutes);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Start time used for ordering; all-day schedules have none.
    pub fn effective_start(&self) -> Option<NaiveDateTime> {
        if self.is_all_day {
            None
        } else {
            self.start_time
        }
    }

    /// Is this schedule active on the local day `target`?
    ///
    /// One-off schedules are active only on their anchor date. Recurring ones
    /// are active from the anchor date onward wherever the rule matches.
    pub fn is_active_on(&self, target: NaiveDate) -> bool {
        match self.recurrence {
            None => self.anchor_date == target,
            Some(rule) => rule.matches(self.anchor_date, target),
        }
    }
}

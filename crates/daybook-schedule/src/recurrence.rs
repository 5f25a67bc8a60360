use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScheduleError;

/// How a schedule repeats relative to its anchor date.
///
/// Every rule is anchored on the day the schedule was created for: a weekly
/// schedule anchored on a Monday recurs every Monday, a monthly one anchored
/// on the 15th recurs on every 15th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceRule {
    /// Every day from the anchor onward.
    Daily,
    /// Same ISO weekday as the anchor.
    Weekly,
    /// Same day of month as the anchor. Months without that day are skipped.
    Monthly,
    /// Same month and day as the anchor. A Feb 29 anchor only recurs in leap years.
    Yearly,
}

impl RecurrenceRule {
    pub const ALL: [RecurrenceRule; 4] = [
        RecurrenceRule::Daily,
        RecurrenceRule::Weekly,
        RecurrenceRule::Monthly,
        RecurrenceRule::Yearly,
    ];

    /// Does a schedule anchored on `origin` occur on `target`?
    ///
    /// Dates before the origin never match.
    pub fn matches(self, origin: NaiveDate, target: NaiveDate) -> bool {
        if target < origin {
            return false;
        }
        match self {
            RecurrenceRule::Daily => true,
            RecurrenceRule::Weekly => {
                origin.weekday().number_from_monday() == target.weekday().number_from_monday()
            }
            RecurrenceRule::Monthly => origin.day() == target.day(),
            RecurrenceRule::Yearly => origin.month() == target.month() && origin.day() == target.day(),
        }
    }

    /// Tag persisted in the `schedules.recurrence` column.
    pub fn as_token(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "DAILY",
            RecurrenceRule::Weekly => "WEEKLY",
            RecurrenceRule::Monthly => "MONTHLY",
            RecurrenceRule::Yearly => "YEARLY",
        }
    }

    /// Decode a stored tag. Unknown tags read as "no recurrence" so a corrupt
    /// row still shows up on its anchor date instead of failing the query.
    pub fn decode(token: Option<&str>) -> Option<Self> {
        let token = token?;
        match token.parse() {
            Ok(rule) => Some(rule),
            Err(_) => {
                warn!(%token, "unknown recurrence tag in storage, treating as non-recurring");
                None
            }
        }
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

impl std::str::FromStr for RecurrenceRule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(RecurrenceRule::Daily),
            "WEEKLY" => Ok(RecurrenceRule::Weekly),
            "MONTHLY" => Ok(RecurrenceRule::Monthly),
            "YEARLY" => Ok(RecurrenceRule::Yearly),
            other => Err(ScheduleError::InvalidRecurrenceToken {
                token: other.to_string(),
            }),
        }
    }
}

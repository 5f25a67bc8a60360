use chrono::{Days, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use daybook_schedule::{clock, Priority, RecurrenceRule, ScheduleRecord};

#[derive(Debug, Parser)]
#[command(name = "daybook", version, about = "Personal schedule book")]
pub struct Cli {
    /// Config file (default: $DAYBOOK_CONFIG, then ~/.daybook/daybook.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Print records as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a schedule and print its id.
    Add(AddArgs),
    /// Print one schedule.
    Show { id: i64 },
    /// Schedules active on a day.
    List {
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// Change fields of an existing schedule.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: EditArgs,
    },
    /// Remove a schedule.
    Delete { id: i64 },
    /// Follow a day live; type a date on stdin to switch.
    Watch {
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, value_parser = parse_day)]
    pub date: NaiveDate,
    #[arg(long, value_parser = parse_clock)]
    pub start: Option<NaiveTime>,
    #[arg(long, value_parser = parse_clock)]
    pub end: Option<NaiveTime>,
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub all_day: bool,
    #[arg(long, value_parser = parse_rule)]
    pub repeat: Option<RecurrenceRule>,
    /// Minutes before the start to remind.
    #[arg(long)]
    pub remind: Option<i32>,
    #[arg(long, default_value_t = Priority::Normal)]
    pub priority: Priority,
    #[arg(long)]
    pub description: Option<String>,
}

impl AddArgs {
    pub fn into_record(self) -> ScheduleRecord {
        let mut record = ScheduleRecord::new(self.title, self.date).with_priority(self.priority);
        if self.all_day {
            record = record.all_day();
        } else {
            record = record.with_times(
                self.start.map(|t| self.date.and_time(t)),
                self.end.map(|t| self.date.and_time(t)),
            );
        }
        record.recurrence = self.repeat;
        record.reminder_offset_minutes = self.remind;
        record.description = self.description;
        record
    }
}

#[derive(Debug, Default, Args)]
pub struct EditArgs {
    #[arg(long)]
    pub title: Option<String>,
    /// Move the schedule; times keep their time of day.
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_clock)]
    pub start: Option<NaiveTime>,
    #[arg(long, value_parser = parse_clock)]
    pub end: Option<NaiveTime>,
    #[arg(long, conflicts_with_all = ["start", "end", "timed"])]
    pub all_day: bool,
    /// Clear the all-day flag.
    #[arg(long)]
    pub timed: bool,
    #[arg(long, value_parser = parse_rule, conflicts_with = "no_repeat")]
    pub repeat: Option<RecurrenceRule>,
    #[arg(long)]
    pub no_repeat: bool,
    #[arg(long, conflicts_with = "no_remind")]
    pub remind: Option<i32>,
    #[arg(long)]
    pub no_remind: bool,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub description: Option<String>,
}

impl EditArgs {
    pub fn apply(self, mut record: ScheduleRecord) -> ScheduleRecord {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(date) = self.date {
            record.anchor_date = date;
        }
        let day = record.anchor_date;
        if let Some(start) = self.start {
            record.start_time = Some(day.and_time(start));
        }
        if let Some(end) = self.end {
            record.end_time = Some(day.and_time(end));
        }
        // Start and end always sit on the anchor day.
        record.start_time = record.start_time.map(|t| day.and_time(t.time()));
        record.end_time = record.end_time.map(|t| day.and_time(t.time()));

        if self.all_day {
            record = record.all_day();
        } else if self.timed || self.start.is_some() || self.end.is_some() {
            record.is_all_day = false;
        }

        if self.no_repeat {
            record.recurrence = None;
        } else if let Some(rule) = self.repeat {
            record.recurrence = Some(rule);
        }
        if self.no_remind {
            record.reminder_offset_minutes = None;
        } else if let Some(minutes) = self.remind {
            record.reminder_offset_minutes = Some(minutes);
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(description) = self.description {
            record.description = if description.is_empty() { None } else { Some(description) };
        }
        record
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    parse_day_from(s, clock::today())
}

/// `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday`, or `+N` / `-N` days from `base`.
pub fn parse_day_from(s: &str, base: NaiveDate) -> Result<NaiveDate, String> {
    let s = s.trim();
    let offset = match s {
        "today" => Some(0),
        "tomorrow" => Some(1),
        "yesterday" => Some(-1),
        _ if s.starts_with('+') || s.starts_with('-') => Some(
            s.parse::<i64>()
                .map_err(|_| format!("bad day offset: {s}"))?,
        ),
        _ => None,
    };
    match offset {
        Some(days) => shift(base, days).ok_or_else(|| format!("day offset out of range: {s}")),
        None => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad date {s:?}: {e}")),
    }
}

fn shift(base: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        base.checked_add_days(magnitude)
    } else {
        base.checked_sub_days(magnitude)
    }
}

fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("bad time {s:?} (want HH:MM): {e}"))
}

fn parse_rule(s: &str) -> Result<RecurrenceRule, String> {
    s.to_ascii_uppercase().parse().map_err(|_| {
        format!("unknown repeat rule {s:?} (want daily, weekly, monthly or yearly)")
    })
}

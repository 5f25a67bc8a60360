use chrono::NaiveDate;
use daybook_schedule::{Priority, ScheduleRecord};

/// One-line summary: `#id  when  [marks] title (rule)`.
pub fn line(record: &ScheduleRecord) -> String {
    let when = if record.is_all_day {
        "all day    ".to_string()
    } else {
        match (record.start_time, record.end_time) {
            (Some(start), Some(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
            (Some(start), None) => format!("{}      ", start.format("%H:%M")),
            (None, Some(end)) => format!("     -{}", end.format("%H:%M")),
            (None, None) => "--:--      ".to_string(),
        }
    };
    let marks = match record.priority {
        Priority::Normal => "  ",
        Priority::Moderate => "! ",
        Priority::Important => "!!",
    };
    let mut out = format!("#{:<4} {when} {marks} {}", record.id.0, record.title);
    if let Some(rule) = record.recurrence {
        out.push_str(&format!(" ({})", rule.as_token().to_ascii_lowercase()));
    }
    if let Some(minutes) = record.reminder_offset_minutes {
        out.push_str(&format!(" [remind {minutes}m]"));
    }
    out
}

/// Multi-line view of a single record.
pub fn detail(record: &ScheduleRecord) -> String {
    let mut out = line(record);
    out.push_str(&format!("\n  anchored {}", record.anchor_date));
    if let Some(description) = &record.description {
        out.push_str(&format!("\n  {description}"));
    }
    out.push_str(&format!(
        "\n  created {}  updated {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out
}

/// Heading plus one line per record, or a placeholder for an empty day.
pub fn day(date: NaiveDate, records: &[ScheduleRecord]) -> String {
    let mut out = format!("{} {}", date.format("%a"), date);
    if records.is_empty() {
        out.push_str("\n  (nothing scheduled)");
    }
    for record in records {
        out.push_str("\n  ");
        out.push_str(&line(record));
    }
    out
}

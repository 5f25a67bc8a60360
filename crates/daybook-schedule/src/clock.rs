//! Local-clock conversions between calendar values and persisted epoch milliseconds.
//!
//! Every timestamp column in the `schedules` table is an INTEGER holding epoch
//! milliseconds. Anchor dates are stored as the instant of local midnight, so
//! their numeric order matches calendar order and the coarse query can compare
//! them directly.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Today's date on the local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Epoch milliseconds of a local wall-clock time.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times that
/// do not exist locally (DST spring-forward gap) are read as UTC.
pub fn local_millis(at: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&at) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => at.and_utc().timestamp_millis(),
    }
}

/// Local wall-clock time of an epoch-millisecond instant.
pub fn from_local_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&Local).naive_local())
}

/// Epoch milliseconds of local midnight on `day`.
pub fn day_millis(day: NaiveDate) -> i64 {
    local_millis(day.and_time(NaiveTime::MIN))
}

/// Local calendar day containing the instant `ms`.
pub fn day_from_millis(ms: i64) -> Option<NaiveDate> {
    from_local_millis(ms).map(|dt| dt.date())
}

/// Current UTC time at the millisecond precision the store persists.
pub fn now_millis_precision() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

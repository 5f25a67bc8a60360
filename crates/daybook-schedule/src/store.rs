use std::sync::{Arc, Mutex, MutexGuard};

use async_stream::stream;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use daybook_core::DaybookConfig;
use futures_util::Stream;
use rusqlite::{Connection, OptionalExtension, Row};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, instrument, warn};

use crate::{
    clock,
    db::init_db,
    error::{Result, ScheduleError},
    recurrence::RecurrenceRule,
    types::{Priority, ScheduleId, ScheduleRecord},
};

const SELECT_RECORD: &str = "SELECT id, title, description, anchor_date, start_time, end_time,
        is_all_day, recurrence, reminder_minutes, priority, created_at, updated_at
 FROM schedules";

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// The part of a record the coarse query keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub anchor_date: NaiveDate,
    pub recurring: bool,
}

impl Footprint {
    pub fn of(record: &ScheduleRecord) -> Self {
        Self {
            anchor_date: record.anchor_date,
            recurring: record.recurrence.is_some(),
        }
    }

    /// Would a record with this footprint appear in the coarse result for `target`?
    pub fn in_coarse_range(self, target: NaiveDate) -> bool {
        self.anchor_date == target || (self.recurring && self.anchor_date <= target)
    }
}

/// Invalidation signal published after every committed mutation.
///
/// Updates carry both the old and the new footprint, so a record moved off a
/// date still invalidates that date's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub id: ScheduleId,
    pub footprints: Vec<Footprint>,
}

impl StoreChange {
    pub fn affects(&self, target: NaiveDate) -> bool {
        self.footprints.iter().any(|f| f.in_coarse_range(target))
    }
}

/// Process-wide schedule storage.
///
/// A cheap `Clone` handle over one SQLite connection. The connection sits
/// behind a `Mutex`, so writes are serialized and every query reads a
/// consistent snapshot. All public operations run on tokio's blocking pool.
#[derive(Clone)]
pub struct ScheduleStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    db: Mutex<Connection>,
    changes: broadcast::Sender<StoreChange>,
}

impl ScheduleStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection, change_buffer: usize) -> Result<Self> {
        init_db(&conn)?;
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Ok(Self {
            inner: Arc::new(StoreInner {
                db: Mutex::new(conn),
                changes,
            }),
        })
    }

    /// Open (or create) the database file named in `config`.
    pub fn open(config: &DaybookConfig) -> Result<Self> {
        info!(path = %config.database.path, "opening SQLite database");
        let conn = Connection::open(&config.database.path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(conn, config.stream.change_buffer)
    }

    /// Fresh private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(
            Connection::open_in_memory()?,
            daybook_core::config::DEFAULT_CHANGE_BUFFER,
        )
    }

    /// Persist `record` under a newly assigned id. Any id already set on the
    /// record is ignored.
    pub async fn insert(&self, record: ScheduleRecord) -> Result<ScheduleId> {
        self.blocking(move |store| store.insert(&record)).await
    }

    /// Replace every field of the stored record with `record.id` except
    /// `created_at`; `updated_at` is bumped. Returns the stored version.
    pub async fn update(&self, record: ScheduleRecord) -> Result<ScheduleRecord> {
        self.blocking(move |store| store.update(&record)).await
    }

    /// Remove the record with `id`. Returns `false` when there was nothing to remove.
    pub async fn delete_by_id(&self, id: ScheduleId) -> Result<bool> {
        self.blocking(move |store| store.delete_by_id(id)).await
    }

    pub async fn delete(&self, record: &ScheduleRecord) -> Result<bool> {
        self.delete_by_id(record.id).await
    }

    pub async fn get_by_id(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>> {
        self.blocking(move |store| store.get_by_id(id)).await
    }

    /// One snapshot of every candidate for `target`: schedules anchored on it
    /// plus every recurring schedule anchored on or before it.
    ///
    /// Over-inclusive; callers apply
    /// [`ScheduleRecord::is_active_on`] to get the exact answer. Ordered by
    /// time of day with all-day and untimed schedules first, then by id.
    pub async fn coarse_query(&self, target: NaiveDate) -> Result<Vec<ScheduleRecord>> {
        self.blocking(move |store| store.coarse_query(target)).await
    }

    /// Continuous version of [`coarse_query`](Self::coarse_query).
    ///
    /// Emits the current snapshot immediately, then a fresh one after each
    /// committed change that touches `target`'s coarse range. Storage errors
    /// are emitted as `Err` items and the subscription stays alive. Dropping
    /// the stream ends the subscription.
    pub fn observe_coarse(
        &self,
        target: NaiveDate,
    ) -> impl Stream<Item = Result<Vec<ScheduleRecord>>> + Send + 'static {
        let store = self.clone();
        // Subscribe before the first snapshot so no commit falls in between.
        let mut changes = self.subscribe_changes();
        stream! {
            yield store.coarse_query(target).await;
            loop {
                match changes.recv().await {
                    Ok(change) if change.affects(target) => {
                        debug!(%target, id = %change.id, kind = ?change.kind, "coarse view invalidated");
                        yield store.coarse_query(target).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%target, skipped, "change subscriber lagged, re-querying");
                        yield store.coarse_query(target).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    /// Raw invalidation feed, in commit order.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }

    /// Number of live change subscriptions (streams not yet dropped).
    pub fn active_subscriptions(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&StoreInner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner)).await?
    }
}

impl StoreInner {
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| ScheduleError::StorageLock)
    }

    /// Called with the connection lock held so notifications follow commit order.
    fn publish(&self, change: StoreChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }

    #[instrument(skip(self, record), fields(title = %record.title, anchor = %record.anchor_date))]
    fn insert(&self, record: &ScheduleRecord) -> Result<ScheduleId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO schedules
             (title, description, anchor_date, start_time, end_time, is_all_day,
              recurrence, reminder_minutes, priority, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            rusqlite::params![
                record.title,
                record.description,
                clock::day_millis(record.anchor_date),
                record.start_time.map(clock::local_millis),
                record.end_time.map(clock::local_millis),
                record.is_all_day,
                record.recurrence.map(RecurrenceRule::as_token),
                record.reminder_offset_minutes,
                record.priority.as_i64(),
                record.created_at.timestamp_millis(),
                record.updated_at.timestamp_millis(),
            ],
        )?;
        let id = ScheduleId(conn.last_insert_rowid());
        info!(schedule_id = %id, "schedule inserted");
        self.publish(StoreChange {
            kind: ChangeKind::Inserted,
            id,
            footprints: vec![Footprint::of(record)],
        });
        Ok(id)
    }

    #[instrument(skip(self, record), fields(schedule_id = %record.id))]
    fn update(&self, record: &ScheduleRecord) -> Result<ScheduleRecord> {
        let conn = self.lock()?;
        let old = fetch(&conn, record.id)?.ok_or(ScheduleError::NotFound { id: record.id })?;

        // updated_at strictly increases even when two edits land in the same millisecond.
        let updated_at = clock::now_millis_precision().max(old.updated_at + Duration::milliseconds(1));
        let stored = ScheduleRecord {
            created_at: old.created_at,
            updated_at,
            ..record.clone()
        };

        let n = conn.execute(
            "UPDATE schedules SET title=?1, description=?2, anchor_date=?3, start_time=?4,
              end_time=?5, is_all_day=?6, recurrence=?7, reminder_minutes=?8, priority=?9,
              updated_at=?10
             WHERE id=?11",
            rusqlite::params![
                stored.title,
                stored.description,
                clock::day_millis(stored.anchor_date),
                stored.start_time.map(clock::local_millis),
                stored.end_time.map(clock::local_millis),
                stored.is_all_day,
                stored.recurrence.map(RecurrenceRule::as_token),
                stored.reminder_offset_minutes,
                stored.priority.as_i64(),
                stored.updated_at.timestamp_millis(),
                stored.id.0,
            ],
        )?;
        if n == 0 {
            return Err(ScheduleError::NotFound { id: record.id });
        }

        info!("schedule updated");
        self.publish(StoreChange {
            kind: ChangeKind::Updated,
            id: stored.id,
            footprints: vec![Footprint::of(&old), Footprint::of(&stored)],
        });
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn delete_by_id(&self, id: ScheduleId) -> Result<bool> {
        let conn = self.lock()?;
        let Some(old) = fetch(&conn, id)? else {
            debug!("delete of unknown schedule ignored");
            return Ok(false);
        };
        conn.execute("DELETE FROM schedules WHERE id = ?1", [id.0])?;
        info!("schedule deleted");
        self.publish(StoreChange {
            kind: ChangeKind::Deleted,
            id,
            footprints: vec![Footprint::of(&old)],
        });
        Ok(true)
    }

    fn get_by_id(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>> {
        let conn = self.lock()?;
        fetch(&conn, id)
    }

    fn coarse_query(&self, target: NaiveDate) -> Result<Vec<ScheduleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_RECORD}
             WHERE anchor_date = ?1
                OR (recurrence IS NOT NULL AND anchor_date <= ?1)
             ORDER BY id ASC"
        ))?;
        let mut records = stmt
            .query_map([clock::day_millis(target)], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        sort_by_time_of_day(&mut records);
        debug!(%target, candidates = records.len(), "coarse query");
        Ok(records)
    }
}

/// Untimed and all-day schedules first, then by wall-clock start time.
///
/// Compares the decoded local time rather than stored millis, so a recurring
/// schedule sorts by its time of day whatever its origin date and whatever
/// DST offset applied on that date. Stable, so ties keep id order.
pub(crate) fn sort_by_time_of_day(records: &mut [ScheduleRecord]) {
    records.sort_by_key(|record| record.effective_start().map(|start| start.time()));
}

fn fetch(conn: &Connection, id: ScheduleId) -> Result<Option<ScheduleRecord>> {
    let record = conn
        .query_row(
            &format!("{SELECT_RECORD} WHERE id = ?1"),
            [id.0],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

/// Map a SQLite row to a `ScheduleRecord`.
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ScheduleRecord> {
    let anchor_ms: i64 = row.get(3)?;
    let anchor_date =
        clock::day_from_millis(anchor_ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(3, anchor_ms))?;
    let recurrence: Option<String> = row.get(7)?;

    Ok(ScheduleRecord {
        id: ScheduleId(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        anchor_date,
        start_time: local_time_column(row, 4)?,
        end_time: local_time_column(row, 5)?,
        is_all_day: row.get(6)?,
        recurrence: RecurrenceRule::decode(recurrence.as_deref()),
        reminder_offset_minutes: row.get(8)?,
        priority: Priority::from_i64(row.get(9)?),
        created_at: utc_column(row, 10)?,
        updated_at: utc_column(row, 11)?,
    })
}

fn local_time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<i64>>(idx)? {
        None => Ok(None),
        Some(ms) => clock::from_local_millis(ms)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms)),
    }
}

fn utc_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use futures_util::{pin_mut, StreamExt};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate, h: u32, m: u32) -> Option<NaiveDateTime> {
        day.and_hms_opt(h, m, 0)
    }

    fn titles(records: &[ScheduleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn insert_then_get_roundtrips_everything_but_id() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 2);
        let record = ScheduleRecord::new("gym", day)
            .with_description("leg day")
            .with_times(at(day, 18, 0), at(day, 19, 30))
            .repeating(RecurrenceRule::Weekly)
            .with_reminder(15)
            .with_priority(Priority::Important);

        let id = store.insert(record.clone()).await.unwrap();
        assert!(!id.is_unsaved());

        let loaded = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(ScheduleRecord { id: ScheduleId::UNSAVED, ..loaded }, record);
    }

    #[tokio::test]
    async fn update_preserves_id_and_created_at_and_bumps_updated_at() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 2);
        let id = store.insert(ScheduleRecord::new("draft", day)).await.unwrap();
        let original = store.get_by_id(id).await.unwrap().unwrap();

        let mut edit = original.clone();
        edit.title = "final".to_string();
        edit.anchor_date = date(2026, 2, 3);
        edit.recurrence = Some(RecurrenceRule::Monthly);
        edit.priority = Priority::Moderate;
        edit.created_at = DateTime::from_timestamp_millis(0).unwrap();

        let stored = store.update(edit).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.created_at, original.created_at);
        assert!(stored.updated_at > original.updated_at);

        let loaded = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.title, "final");
        assert_eq!(loaded.anchor_date, date(2026, 2, 3));
        assert_eq!(loaded.recurrence, Some(RecurrenceRule::Monthly));
        assert_eq!(loaded.priority, Priority::Moderate);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let mut ghost = ScheduleRecord::new("ghost", date(2026, 2, 2));
        ghost.id = ScheduleId(42);
        let err = store.update(ghost).await.unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound { id } if id == ScheduleId(42)));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_leaves_others_alone() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 2);
        let keep = store.insert(ScheduleRecord::new("keep", day)).await.unwrap();
        let drop = store.insert(ScheduleRecord::new("drop", day)).await.unwrap();

        assert!(store.delete_by_id(drop).await.unwrap());
        assert!(store.get_by_id(drop).await.unwrap().is_none());
        assert!(!store.delete_by_id(drop).await.unwrap());
        assert!(!store.delete_by_id(ScheduleId(9999)).await.unwrap());

        assert_eq!(store.get_by_id(keep).await.unwrap().unwrap().title, "keep");
    }

    #[tokio::test]
    async fn delete_by_record_uses_its_id() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let id = store.insert(ScheduleRecord::new("x", date(2026, 2, 2))).await.unwrap();
        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert!(store.delete(&record).await.unwrap());
        assert!(store.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 2);
        let first = store.insert(ScheduleRecord::new("a", day)).await.unwrap();
        let second = store.insert(ScheduleRecord::new("b", day)).await.unwrap();
        store.delete_by_id(second).await.unwrap();
        let third = store.insert(ScheduleRecord::new("c", day)).await.unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn coarse_query_is_over_inclusive() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let target = date(2026, 2, 9);
        store.insert(ScheduleRecord::new("birthday", target)).await.unwrap();
        store
            .insert(ScheduleRecord::new("gym", date(2026, 2, 2)).repeating(RecurrenceRule::Weekly))
            .await
            .unwrap();
        store
            .insert(ScheduleRecord::new("payday", date(2026, 2, 1)).repeating(RecurrenceRule::Monthly))
            .await
            .unwrap();
        store.insert(ScheduleRecord::new("yesterday", date(2026, 2, 8))).await.unwrap();
        store
            .insert(ScheduleRecord::new("future", date(2026, 2, 10)).repeating(RecurrenceRule::Daily))
            .await
            .unwrap();

        let mut got = titles(&store.coarse_query(target).await.unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        got.sort();
        assert_eq!(got, vec!["birthday", "gym", "payday"]);
    }

    #[tokio::test]
    async fn coarse_query_orders_untimed_first_then_by_time_of_day() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 9);
        store
            .insert(ScheduleRecord::new("ten", day).with_times(at(day, 10, 0), None))
            .await
            .unwrap();
        store
            .insert(ScheduleRecord::new("eight", day).with_times(at(day, 8, 0), None))
            .await
            .unwrap();
        store.insert(ScheduleRecord::new("untimed", day)).await.unwrap();
        store.insert(ScheduleRecord::new("all-day", day).all_day()).await.unwrap();
        // Anchored a week earlier at 09:00; sorts by time of day, not by origin.
        let origin = date(2026, 2, 2);
        store
            .insert(
                ScheduleRecord::new("nine-weekly", origin)
                    .with_times(at(origin, 9, 0), None)
                    .repeating(RecurrenceRule::Weekly),
            )
            .await
            .unwrap();

        let records = store.coarse_query(day).await.unwrap();
        assert_eq!(titles(&records), vec!["untimed", "all-day", "eight", "nine-weekly", "ten"]);
    }

    #[test]
    fn time_of_day_ordering_ignores_origin_offsets() {
        // Origins on either side of the US spring-forward change.
        let before = date(2026, 3, 8);
        let after = date(2026, 3, 9);
        let mut records = vec![
            ScheduleRecord::new("nine", before)
                .with_times(at(before, 9, 0), None)
                .repeating(RecurrenceRule::Daily),
            ScheduleRecord::new("eight-thirty", after)
                .with_times(at(after, 8, 30), None)
                .repeating(RecurrenceRule::Daily),
            ScheduleRecord::new("whenever", after).repeating(RecurrenceRule::Daily),
        ];
        sort_by_time_of_day(&mut records);
        assert_eq!(titles(&records), vec!["whenever", "eight-thirty", "nine"]);
    }

    #[tokio::test]
    async fn recurring_schedules_across_a_dst_change_sort_by_wall_clock() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let before = date(2026, 3, 8);
        let after = date(2026, 3, 9);
        store
            .insert(
                ScheduleRecord::new("nine", before)
                    .with_times(at(before, 9, 0), None)
                    .repeating(RecurrenceRule::Daily),
            )
            .await
            .unwrap();
        store
            .insert(
                ScheduleRecord::new("eight-thirty", after)
                    .with_times(at(after, 8, 30), None)
                    .repeating(RecurrenceRule::Daily),
            )
            .await
            .unwrap();

        let records = store.coarse_query(date(2026, 3, 10)).await.unwrap();
        assert_eq!(titles(&records), vec!["eight-thirty", "nine"]);
    }

    #[tokio::test]
    async fn unknown_recurrence_tag_reads_as_none() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let day = date(2026, 2, 2);
        let id = store
            .insert(ScheduleRecord::new("odd", day).repeating(RecurrenceRule::Weekly))
            .await
            .unwrap();
        {
            let conn = store.inner.lock().unwrap();
            conn.execute("UPDATE schedules SET recurrence = 'FORTNIGHTLY' WHERE id = ?1", [id.0])
                .unwrap();
        }
        let loaded = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.recurrence, None);
    }

    #[tokio::test]
    async fn changes_arrive_in_commit_order_with_footprints() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let mut changes = store.subscribe_changes();
        let day = date(2026, 2, 2);

        let id = store.insert(ScheduleRecord::new("a", day)).await.unwrap();
        let mut moved = store.get_by_id(id).await.unwrap().unwrap();
        moved.anchor_date = date(2026, 3, 1);
        store.update(moved).await.unwrap();
        store.delete_by_id(id).await.unwrap();

        let inserted = changes.recv().await.unwrap();
        assert_eq!(inserted.kind, ChangeKind::Inserted);
        let updated = changes.recv().await.unwrap();
        assert_eq!(updated.kind, ChangeKind::Updated);
        assert!(updated.affects(day));
        assert!(updated.affects(date(2026, 3, 1)));
        assert!(!updated.affects(date(2026, 2, 15)));
        let deleted = changes.recv().await.unwrap();
        assert_eq!(deleted.kind, ChangeKind::Deleted);
        assert_eq!(deleted.id, id);
    }

    #[tokio::test]
    async fn observe_coarse_re_emits_only_for_relevant_changes() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let target = date(2026, 2, 9);
        let stream = store.observe_coarse(target);
        pin_mut!(stream);

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.insert(ScheduleRecord::new("today", target)).await.unwrap();
        assert_eq!(titles(&stream.next().await.unwrap().unwrap()), vec!["today"]);

        // Neither a one-off on another day nor a recurring one starting later
        // can appear on the target date.
        store.insert(ScheduleRecord::new("other", date(2026, 2, 10))).await.unwrap();
        store
            .insert(ScheduleRecord::new("later", date(2026, 2, 10)).repeating(RecurrenceRule::Daily))
            .await
            .unwrap();
        let quiet = tokio::time::timeout(StdDuration::from_millis(100), stream.next()).await;
        assert!(quiet.is_err(), "unexpected emission for unrelated change");

        store
            .insert(ScheduleRecord::new("earlier", date(2026, 2, 1)).repeating(RecurrenceRule::Daily))
            .await
            .unwrap();
        let mut got = titles(&stream.next().await.unwrap().unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        got.sort();
        assert_eq!(got, vec!["earlier", "today"]);
    }

    #[tokio::test]
    async fn storage_failure_is_an_error_item_not_an_empty_list() {
        let store = ScheduleStore::open_in_memory().unwrap();
        let target = date(2026, 2, 9);
        let stream = store.observe_coarse(target);
        pin_mut!(stream);
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.insert(ScheduleRecord::new("doomed", target)).await.unwrap();
        {
            let conn = store.inner.lock().unwrap();
            conn.execute_batch("DROP TABLE schedules;").unwrap();
        }
        // The insert's invalidation re-queries against the dropped table.
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.code(), "STORAGE_UNAVAILABLE");
        assert!(store.get_by_id(ScheduleId(1)).await.is_err());
    }
}

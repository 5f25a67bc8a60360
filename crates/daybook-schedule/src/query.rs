use chrono::NaiveDate;
use futures_util::{stream::BoxStream, Stream, StreamExt};
use tracing::debug;

use crate::{
    error::{Result, ScheduleError},
    store::ScheduleStore,
    types::ScheduleRecord,
};

/// Source of continuously-updating per-day schedule lists.
///
/// Implemented by [`ScheduleQueryService`]; the selection controller only
/// depends on this trait.
pub trait ScheduleFeed: Send + Sync {
    /// Schedules active on `date`, re-emitted whenever they may have changed.
    fn schedules_on_date(&self, date: NaiveDate) -> BoxStream<'static, Result<Vec<ScheduleRecord>>>;
}

/// Keep the records of `candidates` that are active on `target`, preserving order.
///
/// A record whose stored recurrence tag failed to decode arrives here with no
/// rule, so it is kept only on its anchor date even when the coarse query's
/// recurring branch returned it.
pub fn retain_active(mut candidates: Vec<ScheduleRecord>, target: NaiveDate) -> Vec<ScheduleRecord> {
    candidates.retain(|record| record.is_active_on(target));
    candidates
}

/// Two-phase resolution: the store's indexed coarse query, then the precise
/// recurrence match in memory.
#[derive(Clone)]
pub struct ScheduleQueryService {
    store: ScheduleStore,
}

impl ScheduleQueryService {
    pub fn new(store: ScheduleStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    /// Schedules active on `target`, ordered as the store orders them.
    ///
    /// Emits once per upstream snapshot. Upstream errors pass through as `Err`
    /// items; an empty day is an empty list, never an error.
    pub fn observe(
        &self,
        target: NaiveDate,
    ) -> impl Stream<Item = Result<Vec<ScheduleRecord>>> + Send + 'static {
        self.store.observe_coarse(target).then(move |snapshot| async move {
            let candidates = snapshot?;
            let total = candidates.len();
            // Pure CPU work; keep it off the async workers.
            let active = tokio::task::spawn_blocking(move || retain_active(candidates, target)).await?;
            debug!(%target, total, active = active.len(), "schedules resolved");
            Ok::<_, ScheduleError>(active)
        })
    }

    /// Current snapshot of the schedules active on `target`.
    pub async fn schedules_on(&self, target: NaiveDate) -> Result<Vec<ScheduleRecord>> {
        let candidates = self.store.coarse_query(target).await?;
        let active = tokio::task::spawn_blocking(move || retain_active(candidates, target)).await?;
        Ok(active)
    }
}

impl ScheduleFeed for ScheduleQueryService {
    fn schedules_on_date(&self, date: NaiveDate) -> BoxStream<'static, Result<Vec<ScheduleRecord>>> {
        self.observe(date).boxed()
    }
}

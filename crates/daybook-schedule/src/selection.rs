use std::sync::Arc;

use async_stream::stream;
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::debug;

use crate::{clock, error::Result, query::ScheduleFeed, types::ScheduleRecord};

/// Holds the currently selected day and follows it with a live schedule list.
pub struct SelectionController<F: ?Sized> {
    feed: Arc<F>,
    selected: watch::Sender<NaiveDate>,
}

enum Step {
    Emit(Result<Vec<ScheduleRecord>>),
    Reselect,
    Idle,
    Stop,
}

impl<F: ScheduleFeed + ?Sized + 'static> SelectionController<F> {
    /// Start with today's local date selected.
    pub fn new(feed: Arc<F>) -> Self {
        Self::with_date(feed, clock::today())
    }

    pub fn with_date(feed: Arc<F>, date: NaiveDate) -> Self {
        let (selected, _) = watch::channel(date);
        Self { feed, selected }
    }

    pub fn feed(&self) -> &Arc<F> {
        &self.feed
    }

    /// Select `date`. Returns `false` (and notifies nobody) if it was already selected.
    pub fn select_date(&self, date: NaiveDate) -> bool {
        let changed = self.selected.send_if_modified(|current| {
            if *current == date {
                false
            } else {
                *current = date;
                true
            }
        });
        if changed {
            debug!(%date, "selected date changed");
        }
        changed
    }

    pub fn current_date(&self) -> NaiveDate {
        *self.selected.borrow()
    }

    /// Schedules for whichever date is selected, following every change.
    ///
    /// Each new selection drops the subscription for the previous date before
    /// subscribing to the new one, so a slow result for an old date is never
    /// emitted after a newer selection has been observed. Selections made in
    /// quick succession collapse to the latest. The stream ends when the
    /// controller is dropped.
    pub fn schedules_for_selected_date(
        &self,
    ) -> impl Stream<Item = Result<Vec<ScheduleRecord>>> + Send + 'static {
        let feed = Arc::clone(&self.feed);
        let mut dates = self.selected.subscribe();
        stream! {
            'select: loop {
                let date = *dates.borrow_and_update();
                debug!(%date, "subscribing to schedules for selected date");
                let mut schedules = feed.schedules_on_date(date);
                loop {
                    // Biased towards the date: a pending reselection beats a
                    // result that is ready for the old date.
                    let step = tokio::select! {
                        biased;
                        changed = dates.changed() => match changed {
                            Ok(()) => Step::Reselect,
                            Err(_) => Step::Stop,
                        },
                        item = schedules.next() => match item {
                            Some(batch) => Step::Emit(batch),
                            None => Step::Idle,
                        },
                    };
                    match step {
                        Step::Emit(batch) => yield batch,
                        Step::Reselect => continue 'select,
                        Step::Idle => {
                            // Feed ended for this date; wait for the next selection.
                            if dates.changed().await.is_err() {
                                break 'select;
                            }
                            continue 'select;
                        }
                        Step::Stop => break 'select,
                    }
                }
            }
        }
    }
}

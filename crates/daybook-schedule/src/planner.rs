use std::sync::Arc;

use chrono::NaiveDate;
use daybook_core::DaybookConfig;
use futures_util::Stream;
use tracing::info;

use crate::{
    error::Result,
    query::ScheduleQueryService,
    selection::SelectionController,
    store::ScheduleStore,
    types::{ScheduleId, ScheduleRecord},
};

/// Entry point for front ends: CRUD on schedules plus the selected-date view.
///
/// Storage work runs on tokio's blocking pool, so none of these calls block
/// the caller's task.
pub struct Planner {
    store: ScheduleStore,
    selection: SelectionController<ScheduleQueryService>,
}

impl Planner {
    pub fn new(store: ScheduleStore) -> Self {
        let query = Arc::new(ScheduleQueryService::new(store.clone()));
        Self {
            store,
            selection: SelectionController::new(query),
        }
    }

    /// Open the database named in `config`, creating its directory if needed.
    pub fn open(config: &DaybookConfig) -> Result<Self> {
        config.ensure_database_dir()?;
        let store = ScheduleStore::open(config)?;
        info!("planner ready");
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub async fn insert_schedule(&self, record: ScheduleRecord) -> Result<ScheduleId> {
        self.store.insert(record).await
    }

    pub async fn update_schedule(&self, record: ScheduleRecord) -> Result<ScheduleRecord> {
        self.store.update(record).await
    }

    pub async fn delete_schedule(&self, record: &ScheduleRecord) -> Result<bool> {
        self.store.delete(record).await
    }

    pub async fn delete_schedule_by_id(&self, id: ScheduleId) -> Result<bool> {
        self.store.delete_by_id(id).await
    }

    pub async fn get_schedule_by_id(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>> {
        self.store.get_by_id(id).await
    }

    pub fn select_date(&self, date: NaiveDate) -> bool {
        self.selection.select_date(date)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selection.current_date()
    }

    /// Live schedules for one fixed date.
    pub fn schedules_on_date(
        &self,
        date: NaiveDate,
    ) -> impl Stream<Item = Result<Vec<ScheduleRecord>>> + Send + 'static {
        self.selection.feed().observe(date)
    }

    /// Current snapshot for one date.
    pub async fn schedules_on(&self, date: NaiveDate) -> Result<Vec<ScheduleRecord>> {
        self.selection.feed().schedules_on(date).await
    }

    /// Live schedules for the selected date, switching whenever it changes.
    pub fn subscribe_schedules_for_selected_date(
        &self,
    ) -> impl Stream<Item = Result<Vec<ScheduleRecord>>> + Send + 'static {
        self.selection.schedules_for_selected_date()
    }
}

use thiserror::Error;

use crate::types::ScheduleId;

/// Errors that can occur within the schedule subsystem.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// No schedule with the given ID exists in the store.
    #[error("schedule not found: {id}")]
    NotFound { id: ScheduleId },

    /// A recurrence tag did not name any known rule.
    ///
    /// Only raised by explicit parsing; rows read back from storage fall back
    /// to "no recurrence" instead.
    #[error("invalid recurrence token: {token:?}")]
    InvalidRecurrenceToken { token: String },

    /// Underlying SQLite / rusqlite error (disk full, locked, corrupt file, ...).
    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A writer panicked while holding the connection lock.
    #[error("storage unavailable: connection lock poisoned")]
    StorageLock,

    /// Configuration or filesystem setup failed before the store opened.
    #[error(transparent)]
    Core(#[from] daybook_core::CoreError),

    /// A blocking-pool task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ScheduleError {
    /// Short error code string for front ends.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::NotFound { .. } => "NOT_FOUND",
            ScheduleError::InvalidRecurrenceToken { .. } => "INVALID_RECURRENCE_TOKEN",
            ScheduleError::Storage(_) | ScheduleError::StorageLock => "STORAGE_UNAVAILABLE",
            ScheduleError::Core(e) => e.code(),
            ScheduleError::Task(_) => "TASK_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

//! `daybook-schedule`: recurring-schedule resolution on top of SQLite.
//!
//! # Overview
//!
//! Schedules live in a SQLite `schedules` table indexed on `anchor_date`.
//! Answering "what is on day D" is done in two phases: the
//! [`store::ScheduleStore`] runs an indexed coarse query (everything anchored
//! on D plus every recurring schedule anchored on or before D), then
//! [`query::ScheduleQueryService`] keeps only the records whose
//! [`RecurrenceRule`] actually lands on D. Both phases are also available as
//! streams that re-emit after every relevant change to the store.
//!
//! # Recurrence rules
//!
//! | Rule      | Active on                                    |
//! |-----------|----------------------------------------------|
//! | none      | the anchor date only                         |
//! | `Daily`   | every day from the anchor on                 |
//! | `Weekly`  | the anchor's weekday                         |
//! | `Monthly` | the anchor's day of month (short months skip)|
//! | `Yearly`  | the anchor's month and day                   |

pub mod clock;
pub mod db;
pub mod error;
pub mod planner;
pub mod query;
pub mod recurrence;
pub mod selection;
pub mod store;
pub mod types;

pub use error::{Result, ScheduleError};
pub use planner::Planner;
pub use query::{ScheduleFeed, ScheduleQueryService};
pub use recurrence::RecurrenceRule;
pub use selection::SelectionController;
pub use store::{ChangeKind, ScheduleStore, StoreChange};
pub use types::{Priority, ScheduleId, ScheduleRecord};

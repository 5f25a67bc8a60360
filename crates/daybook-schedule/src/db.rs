use rusqlite::Connection;

use crate::error::Result;

/// Initialise the schedule schema in `conn`.
///
/// Creates the `schedules` table (idempotent) and an index on `anchor_date`
/// so the per-day coarse query stays an index range scan.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
            title            TEXT    NOT NULL,
            description      TEXT,
            anchor_date      INTEGER NOT NULL,   -- epoch ms of local midnight
            start_time       INTEGER,            -- epoch ms or NULL
            end_time         INTEGER,            -- epoch ms or NULL
            is_all_day       INTEGER NOT NULL DEFAULT 0,
            recurrence       TEXT,               -- DAILY/WEEKLY/MONTHLY/YEARLY or NULL
            reminder_minutes INTEGER,            -- NULL means no reminder
            priority         INTEGER NOT NULL DEFAULT 0,
            created_at       INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL
        ) STRICT;

        -- Coarse query: WHERE anchor_date = ? OR (recurrence IS NOT NULL AND anchor_date <= ?)
        CREATE INDEX IF NOT EXISTS idx_schedules_anchor_date ON schedules (anchor_date);
        ",
    )?;
    Ok(())
}

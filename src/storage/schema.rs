use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sleep_entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            date TEXT NOT NULL,
            sleep_type TEXT NOT NULL,
            bed_time TEXT NOT NULL,
            wake_time TEXT NOT NULL,
            sleep_quality INTEGER NOT NULL CHECK (sleep_quality BETWEEN 1 AND 5),
            wake_quality INTEGER NOT NULL CHECK (wake_quality BETWEEN 1 AND 5),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS sleep_entries_date ON sleep_entries(date);
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use super::{new_record_id, now_utc, schema, SleepStore};
use crate::config::{StorageBackend, StorageOptions};
use crate::model::{self, Quality, SleepDraft, SleepPatch, SleepRecord, SleepType};

const SELECT_COLUMNS: &str = "id, date, sleep_type, bed_time, wake_time, sleep_quality, \
                              wake_quality, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteStore {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl SqliteStore {
    pub fn open(options: &StorageOptions) -> Result<Self> {
        let db_path = &options.database_path;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        prepare_connection(&conn, options)?;
        schema::apply(&conn)?;
        Ok(Self {
            db_path: Arc::new(db_path.clone()),
            options: Arc::new(options.clone()),
        })
    }

    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

impl SleepStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    fn all(&self) -> Result<Vec<SleepRecord>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {SELECT_COLUMNS} FROM sleep_entries ORDER BY seq");
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map([], record_from_row)?
                .collect::<Result<Vec<_>, _>>()
                .context("loading sleep entries")?;
            Ok(records)
        })
    }

    fn get(&self, id: &str) -> Result<Option<SleepRecord>> {
        self.with_connection(|conn| fetch_by_id(conn, id))
    }

    fn insert(&self, draft: SleepDraft) -> Result<SleepRecord> {
        let record = draft.into_record(new_record_id(), now_utc());
        self.with_connection(|conn| {
            insert_record(conn, &record)?;
            Ok(())
        })?;
        tracing::debug!(id = %record.id, date = %record.date, "inserted sleep entry");
        Ok(record)
    }

    fn insert_many(&self, drafts: Vec<SleepDraft>) -> Result<Vec<SleepRecord>> {
        let now = now_utc();
        let records: Vec<SleepRecord> = drafts
            .into_iter()
            .map(|draft| draft.into_record(new_record_id(), now))
            .collect();
        self.with_connection(|conn| {
            let tx = conn
                .unchecked_transaction()
                .context("starting bulk insert")?;
            for record in &records {
                insert_record(&tx, record)?;
            }
            tx.commit().context("committing bulk insert")?;
            Ok(())
        })?;
        Ok(records)
    }

    fn import(&self, records: Vec<SleepRecord>) -> Result<usize> {
        self.with_connection(|conn| {
            let tx = conn.unchecked_transaction().context("starting import")?;
            let mut added = 0;
            for record in &records {
                added += insert_record(&tx, record)?;
            }
            tx.commit().context("committing import")?;
            Ok(added)
        })
    }

    fn update(&self, id: &str, patch: &SleepPatch) -> Result<Option<SleepRecord>> {
        self.with_connection(|conn| {
            let tx = conn.unchecked_transaction().context("starting update")?;
            let Some(mut record) = fetch_by_id(&tx, id)? else {
                return Ok(None);
            };
            patch.apply(&mut record, now_utc());
            let updated_at = format_timestamp(record.updated_at)?;
            tx.execute(
                "UPDATE sleep_entries
                 SET date = ?1,
                     sleep_type = ?2,
                     bed_time = ?3,
                     wake_time = ?4,
                     sleep_quality = ?5,
                     wake_quality = ?6,
                     updated_at = ?7
                 WHERE id = ?8",
                params![
                    model::format_date(record.date),
                    record.sleep_type.as_str(),
                    model::format_clock(record.bed_time),
                    model::format_clock(record.wake_time),
                    record.sleep_quality.get(),
                    record.wake_quality.get(),
                    updated_at,
                    record.id,
                ],
            )
            .context("updating sleep entry")?;
            tx.commit().context("committing update")?;
            Ok(Some(record))
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn
                .execute("DELETE FROM sleep_entries WHERE id = ?1", params![id])
                .context("deleting sleep entry")?;
            Ok(removed > 0)
        })
    }

    fn delete_all(&self) -> Result<usize> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM sleep_entries", [])
                .context("clearing sleep entries")
        })
    }

    fn by_date_range(&self, start: Date, end: Date) -> Result<Vec<SleepRecord>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {SELECT_COLUMNS}
                 FROM sleep_entries
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY seq"
            );
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(
                    params![model::format_date(start), model::format_date(end)],
                    record_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()
                .context("querying sleep entries by date")?;
            Ok(records)
        })
    }
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn fetch_by_id(conn: &Connection, id: &str) -> Result<Option<SleepRecord>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM sleep_entries WHERE id = ?1");
    conn.query_row(&sql, params![id], record_from_row)
        .optional()
        .with_context(|| format!("loading sleep entry {id}"))
}

/// Returns 1 when the row was written, 0 when the id already existed.
fn insert_record(conn: &Connection, record: &SleepRecord) -> Result<usize> {
    let created_at = format_timestamp(record.created_at)?;
    let updated_at = format_timestamp(record.updated_at)?;
    conn.execute(
        "INSERT OR IGNORE INTO sleep_entries
             (id, date, sleep_type, bed_time, wake_time, sleep_quality, wake_quality,
              created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id,
            model::format_date(record.date),
            record.sleep_type.as_str(),
            model::format_clock(record.bed_time),
            model::format_clock(record.wake_time),
            record.sleep_quality.get(),
            record.wake_quality.get(),
            created_at,
            updated_at,
        ],
    )
    .with_context(|| format!("inserting sleep entry {}", record.id))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SleepRecord> {
    let date: String = row.get(1)?;
    let sleep_type: String = row.get(2)?;
    let bed_time: String = row.get(3)?;
    let wake_time: String = row.get(4)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(SleepRecord {
        id: row.get(0)?,
        date: model::parse_date(&date).map_err(|err| conversion_error(1, Type::Text, err))?,
        sleep_type: sleep_type
            .parse::<SleepType>()
            .map_err(|err| conversion_error(2, Type::Text, err))?,
        bed_time: model::parse_clock(&bed_time)
            .map_err(|err| conversion_error(3, Type::Text, err))?,
        wake_time: model::parse_clock(&wake_time)
            .map_err(|err| conversion_error(4, Type::Text, err))?,
        sleep_quality: Quality::new(row.get(5)?)
            .map_err(|err| conversion_error(5, Type::Integer, err))?,
        wake_quality: Quality::new(row.get(6)?)
            .map_err(|err| conversion_error(6, Type::Integer, err))?,
        created_at: OffsetDateTime::parse(&created_at, &Rfc3339)
            .map_err(|err| conversion_error(7, Type::Text, err))?,
        updated_at: OffsetDateTime::parse(&updated_at, &Rfc3339)
            .map_err(|err| conversion_error(8, Type::Text, err))?,
    })
}

fn format_timestamp(at: OffsetDateTime) -> Result<String> {
    at.format(&Rfc3339)
        .with_context(|| format!("formatting timestamp {at}"))
}

fn conversion_error<E>(column: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(err))
}

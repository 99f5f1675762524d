use std::sync::Arc;

use anyhow::{bail, Result};
use time::{Date, OffsetDateTime};

use crate::config::{ConfigPaths, StorageBackend, StorageOptions};
use crate::model::{SleepDraft, SleepPatch, SleepRecord};

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreHandle = Arc<dyn SleepStore>;

/// Durable keyed storage for sleep records.
///
/// Implementations return records in insertion order and never interpret
/// night buckets: `by_date_range` filters on the literal stored date.
pub trait SleepStore: Send + Sync {
    fn backend(&self) -> StorageBackend;

    fn all(&self) -> Result<Vec<SleepRecord>>;

    fn get(&self, id: &str) -> Result<Option<SleepRecord>>;

    fn insert(&self, draft: SleepDraft) -> Result<SleepRecord>;

    fn insert_many(&self, drafts: Vec<SleepDraft>) -> Result<Vec<SleepRecord>> {
        drafts.into_iter().map(|draft| self.insert(draft)).collect()
    }

    /// Stores complete records as given, keeping their ids and timestamps.
    /// Records whose id already exists are skipped; returns how many were added.
    fn import(&self, records: Vec<SleepRecord>) -> Result<usize>;

    /// Returns `None` when no record has this id.
    fn update(&self, id: &str, patch: &SleepPatch) -> Result<Option<SleepRecord>>;

    fn delete(&self, id: &str) -> Result<bool>;

    fn delete_all(&self) -> Result<usize>;

    /// Records whose stored `date` lies in `start..=end`.
    fn by_date_range(&self, start: Date, end: Date) -> Result<Vec<SleepRecord>>;
}

pub fn init(paths: &ConfigPaths, options: &StorageOptions) -> Result<StoreHandle> {
    match options.backend {
        StorageBackend::Sqlite => {
            let mut options = options.clone();
            if options.database_path.as_os_str().is_empty() {
                options.database_path = paths.database_path.clone();
            }
            let store = SqliteStore::open(&options)?;
            tracing::debug!(path = %store.database_path().display(), "opened sqlite store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::info!("using in-memory store, entries are discarded on exit");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

/// Finds a record by full id or unique id prefix.
pub fn find_by_prefix(store: &dyn SleepStore, prefix: &str) -> Result<SleepRecord> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("entry id cannot be empty");
    }
    if let Some(record) = store.get(prefix)? {
        return Ok(record);
    }
    let mut matches = store
        .all()?
        .into_iter()
        .filter(|record| record.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (Some(_), Some(_)) => bail!("entry id '{prefix}' is ambiguous"),
        (None, _) => bail!("entry '{prefix}' not found"),
    }
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC time at millisecond precision, the resolution of legacy exports.
fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Quality, SleepType};
    use tempfile::TempDir;
    use time::macros::{date, datetime, time};

    fn draft(date: Date, sleep_type: SleepType) -> SleepDraft {
        SleepDraft {
            date,
            sleep_type,
            bed_time: time!(23:00),
            wake_time: time!(06:30),
            sleep_quality: Quality::new(4).unwrap(),
            wake_quality: Quality::new(3).unwrap(),
        }
    }

    fn sqlite_store() -> Result<(TempDir, StoreHandle)> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        let options = StorageOptions {
            database_path: paths.database_path.clone(),
            ..StorageOptions::default()
        };
        let store = init(&paths, &options)?;
        Ok((temp, store))
    }

    fn memory_store() -> StoreHandle {
        Arc::new(MemoryStore::default())
    }

    fn crud_round_trip(store: &dyn SleepStore) -> Result<()> {
        let first = store.insert(draft(date!(2025 - 12 - 21), SleepType::Nocturnal))?;
        let second = store.insert(draft(date!(2025 - 12 - 22), SleepType::Nap))?;
        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, first.updated_at);

        let all = store.all()?;
        assert_eq!(all, vec![first.clone(), second.clone()]);
        assert_eq!(store.get(&second.id)?, Some(second.clone()));

        let patch = SleepPatch {
            sleep_type: Some(SleepType::Catchup),
            wake_quality: Some(Quality::new(5).unwrap()),
            ..SleepPatch::default()
        };
        let updated = store.update(&second.id, &patch)?.expect("record present");
        assert_eq!(updated.sleep_type, SleepType::Catchup);
        assert_eq!(updated.wake_quality.get(), 5);
        assert_eq!(updated.bed_time, second.bed_time);
        assert!(updated.updated_at >= second.updated_at);
        assert_eq!(store.get(&second.id)?, Some(updated));

        assert!(store.update("missing", &patch)?.is_none());
        assert!(store.delete(&first.id)?);
        assert!(!store.delete(&first.id)?);
        assert_eq!(store.all()?.len(), 1);
        Ok(())
    }

    fn range_uses_literal_dates(store: &dyn SleepStore) -> Result<()> {
        // Recorded on the 22nd but belongs to the night of the 21st.
        let early = store.insert(SleepDraft {
            bed_time: time!(02:00),
            ..draft(date!(2025 - 12 - 22), SleepType::Nocturnal)
        })?;
        store.insert(draft(date!(2025 - 12 - 20), SleepType::Nocturnal))?;
        let late = store.insert(draft(date!(2025 - 12 - 23), SleepType::Nap))?;
        store.insert(draft(date!(2025 - 12 - 24), SleepType::Nap))?;

        let hits = store.by_date_range(date!(2025 - 12 - 22), date!(2025 - 12 - 23))?;
        let ids: Vec<&str> = hits.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec![early.id.as_str(), late.id.as_str()]);

        assert!(store
            .by_date_range(date!(2025 - 12 - 25), date!(2025 - 12 - 31))?
            .is_empty());
        Ok(())
    }

    fn bulk_insert_import_and_clear(store: &dyn SleepStore) -> Result<()> {
        let inserted = store.insert_many(vec![
            draft(date!(2025 - 12 - 01), SleepType::Nocturnal),
            draft(date!(2025 - 12 - 02), SleepType::Drowsiness),
        ])?;
        assert_eq!(inserted.len(), 2);

        let mut foreign = inserted[0].clone();
        foreign.id = "legacy-0001".into();
        let added = store.import(vec![inserted[1].clone(), foreign.clone()])?;
        assert_eq!(added, 1);
        assert_eq!(store.get("legacy-0001")?, Some(foreign));

        assert_eq!(store.delete_all()?, 3);
        assert!(store.all()?.is_empty());
        Ok(())
    }

    #[test]
    fn sqlite_store_crud() -> Result<()> {
        let (_temp, store) = sqlite_store()?;
        assert_eq!(store.backend(), StorageBackend::Sqlite);
        crud_round_trip(store.as_ref())
    }

    #[test]
    fn memory_store_crud() -> Result<()> {
        let store = memory_store();
        assert_eq!(store.backend(), StorageBackend::Memory);
        crud_round_trip(store.as_ref())
    }

    #[test]
    fn sqlite_range_query_is_not_night_aware() -> Result<()> {
        let (_temp, store) = sqlite_store()?;
        range_uses_literal_dates(store.as_ref())
    }

    #[test]
    fn memory_range_query_is_not_night_aware() -> Result<()> {
        range_uses_literal_dates(memory_store().as_ref())
    }

    #[test]
    fn sqlite_bulk_operations() -> Result<()> {
        let (_temp, store) = sqlite_store()?;
        bulk_insert_import_and_clear(store.as_ref())
    }

    #[test]
    fn memory_bulk_operations() -> Result<()> {
        bulk_insert_import_and_clear(memory_store().as_ref())
    }

    #[test]
    fn sqlite_store_persists_across_handles() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        let options = StorageOptions {
            database_path: paths.database_path.clone(),
            ..StorageOptions::default()
        };
        let record = init(&paths, &options)?.insert(draft(date!(2025 - 06 - 01), SleepType::Nap))?;

        let reopened = init(&paths, &options)?;
        assert_eq!(reopened.all()?, vec![record]);
        Ok(())
    }

    fn imported_timestamps_survive_unchanged(store: &dyn SleepStore) -> Result<()> {
        let mut legacy = draft(date!(2025 - 11 - 30), SleepType::Nocturnal)
            .into_record("legacy-ms".into(), datetime!(2025-11-30 09:12:44.120 UTC));
        legacy.updated_at = datetime!(2025-12-01 18:00:00.000456 +01:00);
        assert_eq!(store.import(vec![legacy.clone()])?, 1);

        let stored = store.get("legacy-ms")?.expect("imported record");
        assert_eq!(stored.created_at, legacy.created_at);
        assert_eq!(stored.updated_at, legacy.updated_at);
        assert_eq!(stored.updated_at.offset(), legacy.updated_at.offset());
        Ok(())
    }

    #[test]
    fn sqlite_keeps_subsecond_timestamps() -> Result<()> {
        let (_temp, store) = sqlite_store()?;
        imported_timestamps_survive_unchanged(store.as_ref())
    }

    #[test]
    fn memory_keeps_subsecond_timestamps() -> Result<()> {
        imported_timestamps_survive_unchanged(memory_store().as_ref())
    }

    #[test]
    fn prefix_lookup_requires_unique_match() -> Result<()> {
        let store = memory_store();
        store.import(vec![
            draft(date!(2025 - 12 - 01), SleepType::Nap).into_record("abc-1".into(), now_utc()),
            draft(date!(2025 - 12 - 02), SleepType::Nap).into_record("abd-2".into(), now_utc()),
        ])?;

        assert_eq!(find_by_prefix(store.as_ref(), "abc")?.id, "abc-1");
        assert_eq!(find_by_prefix(store.as_ref(), "abd-2")?.id, "abd-2");
        let ambiguous = find_by_prefix(store.as_ref(), "ab").unwrap_err();
        assert!(ambiguous.to_string().contains("ambiguous"));
        assert!(find_by_prefix(store.as_ref(), "zz").is_err());
        assert!(find_by_prefix(store.as_ref(), "  ").is_err());
        Ok(())
    }
}

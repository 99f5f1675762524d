use anyhow::Result;
use parking_lot::RwLock;
use time::Date;

use super::{new_record_id, now_utc, SleepStore};
use crate::config::StorageBackend;
use crate::model::{SleepDraft, SleepPatch, SleepRecord};

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<SleepRecord>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SleepStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn all(&self) -> Result<Vec<SleepRecord>> {
        Ok(self.entries.read().clone())
    }

    fn get(&self, id: &str) -> Result<Option<SleepRecord>> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    fn insert(&self, draft: SleepDraft) -> Result<SleepRecord> {
        let record = draft.into_record(new_record_id(), now_utc());
        self.entries.write().push(record.clone());
        Ok(record)
    }

    fn import(&self, records: Vec<SleepRecord>) -> Result<usize> {
        let mut entries = self.entries.write();
        let mut added = 0;
        for record in records {
            if entries.iter().any(|existing| existing.id == record.id) {
                continue;
            }
            entries.push(record);
            added += 1;
        }
        Ok(added)
    }

    fn update(&self, id: &str, patch: &SleepPatch) -> Result<Option<SleepRecord>> {
        let mut entries = self.entries.write();
        let Some(record) = entries.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        patch.apply(record, now_utc());
        Ok(Some(record.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|record| record.id != id);
        Ok(entries.len() != before)
    }

    fn delete_all(&self) -> Result<usize> {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    fn by_date_range(&self, start: Date, end: Date) -> Result<Vec<SleepRecord>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|record| record.date >= start && record.date <= end)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Quality, SleepType};
    use std::sync::Arc;
    use std::thread;
    use time::macros::{date, time};

    #[test]
    fn concurrent_inserts_are_all_kept() -> Result<()> {
        let store = Arc::new(MemoryStore::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || -> Result<()> {
                    for _ in 0..25 {
                        store.insert(SleepDraft {
                            date: date!(2025 - 12 - 22),
                            sleep_type: SleepType::Drowsiness,
                            bed_time: time!(15:00),
                            wake_time: time!(15:20),
                            sleep_quality: Quality::default(),
                            wake_quality: Quality::default(),
                        })?;
                    }
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("insert thread panicked")?;
        }
        assert_eq!(store.len(), 100);
        assert!(!store.is_empty());
        Ok(())
    }
}

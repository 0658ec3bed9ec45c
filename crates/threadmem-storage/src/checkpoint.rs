//! Checkpoint storage - byte-level API for agent state snapshot persistence.
//!
//! Checkpoints are upserted by id. A time index keyed by
//! `{thread_id}:{padded created_at}:{checkpoint_id}` realizes per-thread
//! chronological ordering, so "latest", "oldest N" and reverse-chronological
//! listings are prefix range scans.
//!
//! # Tables
//!
//! - `checkpoints`: checkpoint_id -> serialized checkpoint
//! - `checkpoint_time_idx`: thread_id:padded_ms:checkpoint_id -> checkpoint_id

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::keys::{before_bound, prefix_range, thread_prefix, time_index_key};

const CHECKPOINT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("checkpoints");

const CHECKPOINT_TIME_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("checkpoint_time_idx");

/// Whether a save inserted a new row or overwrote an existing one in place.
///
/// An in-place overwrite keeps the row's original index position: re-saving
/// an id never changes its place in the thread's chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Low-level checkpoint storage with byte-level API.
#[derive(Clone)]
pub struct CheckpointStorage {
    db: Arc<Database>,
}

impl CheckpointStorage {
    /// Create a new CheckpointStorage instance and initialize tables.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHECKPOINT_TABLE)?;
        write_txn.open_table(CHECKPOINT_TIME_INDEX)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Upsert a checkpoint.
    ///
    /// A new id gets a primary row plus a time-index entry at
    /// `created_at_ms`. An existing id has only its payload replaced; the
    /// index entry (and with it the creation order) is left untouched, so
    /// `created_at_ms` is ignored for updates.
    pub fn save(
        &self,
        id: &str,
        thread_id: &str,
        created_at_ms: i64,
        data: &[u8],
    ) -> Result<SaveOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(CHECKPOINT_TABLE)?;
            let existed = table.get(id)?.is_some();
            table.insert(id, data)?;

            if existed {
                SaveOutcome::Updated
            } else {
                let mut time_idx = write_txn.open_table(CHECKPOINT_TIME_INDEX)?;
                let key = time_index_key(thread_id, created_at_ms, id);
                time_idx.insert(key.as_str(), id)?;
                SaveOutcome::Inserted
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Load a checkpoint by ID.
    pub fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHECKPOINT_TABLE)?;
        Ok(table.get(id)?.map(|v| v.value().to_vec()))
    }

    /// Load the most recently created checkpoint for a thread.
    pub fn latest(&self, thread_id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let time_idx = read_txn.open_table(CHECKPOINT_TIME_INDEX)?;

        let (start, end) = prefix_range(&thread_prefix(thread_id));

        // The index is ordered oldest-first; the last entry is the newest.
        let mut last_id: Option<String> = None;
        for entry in time_idx.range(start.as_str()..end.as_str())? {
            let entry = entry?;
            last_id = Some(entry.1.value().to_string());
        }

        if let Some(id) = last_id {
            let table = read_txn.open_table(CHECKPOINT_TABLE)?;
            Ok(table.get(id.as_str())?.map(|v| v.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List checkpoint payloads for a thread, newest first.
    ///
    /// `before_ms` restricts the scan to rows created strictly earlier;
    /// `limit` caps the result length.
    pub fn list(
        &self,
        thread_id: &str,
        before_ms: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let time_idx = read_txn.open_table(CHECKPOINT_TIME_INDEX)?;
        let table = read_txn.open_table(CHECKPOINT_TABLE)?;

        let start = thread_prefix(thread_id);
        let end = match before_ms {
            Some(ms) => before_bound(thread_id, ms),
            None => crate::keys::prefix_end_bound(&start),
        };

        let mut ids = Vec::new();
        for entry in time_idx.range(start.as_str()..end.as_str())? {
            let entry = entry?;
            ids.push(entry.1.value().to_string());
        }
        ids.reverse();
        if let Some(limit) = limit {
            ids.truncate(limit);
        }

        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(data) = table.get(id.as_str())? {
                out.push(data.value().to_vec());
            }
        }
        Ok(out)
    }

    /// Count checkpoints for a thread.
    pub fn count(&self, thread_id: &str) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let time_idx = read_txn.open_table(CHECKPOINT_TIME_INDEX)?;

        let (start, end) = prefix_range(&thread_prefix(thread_id));
        let mut count = 0usize;
        for entry in time_idx.range(start.as_str()..end.as_str())? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Delete the `count` oldest checkpoints of a thread.
    ///
    /// Victim selection orders by creation timestamp ascending; ids never
    /// influence the order. Returns the number of rows actually deleted.
    pub fn delete_oldest(&self, thread_id: &str, count: usize) -> Result<usize> {
        if count == 0 {
            return Ok(0);
        }

        let victims = {
            let read_txn = self.db.begin_read()?;
            let time_idx = read_txn.open_table(CHECKPOINT_TIME_INDEX)?;
            let (start, end) = prefix_range(&thread_prefix(thread_id));

            let mut victims: Vec<(String, String)> = Vec::with_capacity(count);
            for entry in time_idx.range(start.as_str()..end.as_str())? {
                let entry = entry?;
                victims.push((entry.0.value().to_string(), entry.1.value().to_string()));
                if victims.len() == count {
                    break;
                }
            }
            victims
        };

        if victims.is_empty() {
            return Ok(0);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHECKPOINT_TABLE)?;
            let mut time_idx = write_txn.open_table(CHECKPOINT_TIME_INDEX)?;
            for (key, id) in &victims {
                table.remove(id.as_str())?;
                time_idx.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(thread_id, deleted = victims.len(), "Trimmed oldest checkpoints");
        Ok(victims.len())
    }

    /// Delete every checkpoint of a thread. Returns the number deleted.
    pub fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        let victims = {
            let read_txn = self.db.begin_read()?;
            let time_idx = read_txn.open_table(CHECKPOINT_TIME_INDEX)?;
            let (start, end) = prefix_range(&thread_prefix(thread_id));

            let mut victims: Vec<(String, String)> = Vec::new();
            for entry in time_idx.range(start.as_str()..end.as_str())? {
                let entry = entry?;
                victims.push((entry.0.value().to_string(), entry.1.value().to_string()));
            }
            victims
        };

        if victims.is_empty() {
            return Ok(0);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHECKPOINT_TABLE)?;
            let mut time_idx = write_txn.open_table(CHECKPOINT_TIME_INDEX)?;
            for (key, id) in &victims {
                table.remove(id.as_str())?;
                time_idx.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(victims.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Arc<Database> {
        Arc::new(
            Database::builder()
                .create_with_backend(redb::backends::InMemoryBackend::new())
                .unwrap(),
        )
    }

    #[test]
    fn test_save_and_load() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        let data = br#"{"id":"cp-1","step":3}"#;
        let outcome = storage.save("cp-1", "thread-1", 1_000, data).unwrap();
        assert_eq!(outcome, SaveOutcome::Inserted);

        let loaded = storage.load("cp-1").unwrap();
        assert_eq!(loaded.unwrap(), data.to_vec());
    }

    #[test]
    fn test_load_missing() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        assert!(storage.load("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_resave_overwrites_in_place() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        storage.save("cp-1", "thread-1", 1_000, b"first").unwrap();
        let outcome = storage.save("cp-1", "thread-1", 9_999, b"second").unwrap();
        assert_eq!(outcome, SaveOutcome::Updated);

        assert_eq!(storage.load("cp-1").unwrap().unwrap(), b"second");
        assert_eq!(storage.count("thread-1").unwrap(), 1);

        // Creation order is unchanged: still the single (and oldest) entry.
        let listed = storage.list("thread-1", None, None).unwrap();
        assert_eq!(listed, vec![b"second".to_vec()]);
    }

    #[test]
    fn test_latest_follows_creation_time() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        storage.save("cp-a", "thread-1", 1_000, b"oldest").unwrap();
        storage.save("cp-b", "thread-1", 3_000, b"newest").unwrap();
        storage.save("cp-c", "thread-1", 2_000, b"middle").unwrap();
        storage.save("cp-x", "thread-2", 9_000, b"other").unwrap();

        assert_eq!(storage.latest("thread-1").unwrap().unwrap(), b"newest");
        assert_eq!(storage.latest("thread-2").unwrap().unwrap(), b"other");
        assert!(storage.latest("thread-404").unwrap().is_none());
    }

    #[test]
    fn test_list_reverse_chronological() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        storage.save("cp-a", "thread-1", 1_000, b"a").unwrap();
        storage.save("cp-b", "thread-1", 2_000, b"b").unwrap();
        storage.save("cp-c", "thread-1", 3_000, b"c").unwrap();

        let all = storage.list("thread-1", None, None).unwrap();
        assert_eq!(all, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);

        let limited = storage.list("thread-1", None, Some(2)).unwrap();
        assert_eq!(limited, vec![b"c".to_vec(), b"b".to_vec()]);

        // before is exclusive: entries created at exactly 2_000 drop out.
        let before = storage.list("thread-1", Some(2_000), None).unwrap();
        assert_eq!(before, vec![b"a".to_vec()]);
    }

    #[test]
    fn test_delete_oldest_ignores_id_order() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        // Ids sort opposite to creation time on purpose.
        storage.save("cp-z", "thread-1", 1_000, b"oldest").unwrap();
        storage.save("cp-m", "thread-1", 2_000, b"middle").unwrap();
        storage.save("cp-a", "thread-1", 3_000, b"newest").unwrap();

        let deleted = storage.delete_oldest("thread-1", 2).unwrap();
        assert_eq!(deleted, 2);

        assert!(storage.load("cp-z").unwrap().is_none());
        assert!(storage.load("cp-m").unwrap().is_none());
        assert_eq!(storage.load("cp-a").unwrap().unwrap(), b"newest");
        assert_eq!(storage.count("thread-1").unwrap(), 1);
    }

    #[test]
    fn test_delete_oldest_more_than_present() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        storage.save("cp-1", "thread-1", 1_000, b"only").unwrap();

        assert_eq!(storage.delete_oldest("thread-1", 5).unwrap(), 1);
        assert_eq!(storage.delete_oldest("thread-1", 5).unwrap(), 0);
        assert_eq!(storage.delete_oldest("thread-1", 0).unwrap(), 0);
    }

    #[test]
    fn test_delete_thread() {
        let db = setup_db();
        let storage = CheckpointStorage::new(db).unwrap();

        storage.save("cp-1", "thread-1", 1_000, b"a").unwrap();
        storage.save("cp-2", "thread-1", 2_000, b"b").unwrap();
        storage.save("cp-3", "thread-2", 3_000, b"c").unwrap();

        let deleted = storage.delete_thread("thread-1").unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(storage.count("thread-1").unwrap(), 0);
        assert!(storage.latest("thread-1").unwrap().is_none());
        assert_eq!(storage.count("thread-2").unwrap(), 1);
    }
}

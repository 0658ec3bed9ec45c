//! Message storage - byte-level API for conversation turn persistence.
//!
//! Messages are written once per turn and only ever rewritten by the
//! embedding backfill, which replaces the payload in place. A time index
//! gives per-thread chronological order for listings and trims.
//!
//! # Tables
//!
//! - `messages`: message_id -> serialized message
//! - `message_time_idx`: thread_id:padded_ms:message_id -> message_id

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::keys::{prefix_range, thread_prefix, time_index_key};

const MESSAGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

const MESSAGE_TIME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("message_time_idx");

/// Low-level message storage with byte-level API.
#[derive(Clone)]
pub struct MessageStorage {
    db: Arc<Database>,
}

impl MessageStorage {
    /// Create a new MessageStorage instance and initialize tables.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGE_TABLE)?;
        write_txn.open_table(MESSAGE_TIME_INDEX)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store a message with its time-index entry.
    pub fn put(&self, id: &str, thread_id: &str, created_at_ms: i64, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MESSAGE_TABLE)?;
            table.insert(id, data)?;

            let mut time_idx = write_txn.open_table(MESSAGE_TIME_INDEX)?;
            let key = time_index_key(thread_id, created_at_ms, id);
            time_idx.insert(key.as_str(), id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Replace an existing message payload in place, leaving its index
    /// position untouched. Returns false if the id is unknown.
    pub fn update_payload(&self, id: &str, data: &[u8]) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(MESSAGE_TABLE)?;
            let existed = table.get(id)?.is_some();
            if existed {
                table.insert(id, data)?;
            }
            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Get raw message data by ID
    pub fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGE_TABLE)?;
        Ok(table.get(id)?.map(|v| v.value().to_vec()))
    }

    /// List message payloads for a thread in chronological order.
    pub fn list(&self, thread_id: &str) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let time_idx = read_txn.open_table(MESSAGE_TIME_INDEX)?;
        let table = read_txn.open_table(MESSAGE_TABLE)?;

        let (start, end) = prefix_range(&thread_prefix(thread_id));

        let mut out = Vec::new();
        for entry in time_idx.range(start.as_str()..end.as_str())? {
            let entry = entry?;
            let id = entry.1.value();
            if let Some(data) = table.get(id)? {
                out.push(data.value().to_vec());
            }
        }
        Ok(out)
    }

    /// List the newest message payloads for a thread, newest first.
    ///
    /// Per-thread history stays small through the trim paths, so collecting
    /// the ascending scan and reversing it is fine.
    pub fn list_recent(&self, thread_id: &str, limit: usize) -> Result<Vec<Vec<u8>>> {
        let mut all = self.list(thread_id)?;
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }

    /// Count messages for a thread.
    pub fn count(&self, thread_id: &str) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let time_idx = read_txn.open_table(MESSAGE_TIME_INDEX)?;

        let (start, end) = prefix_range(&thread_prefix(thread_id));
        let mut count = 0usize;
        for entry in time_idx.range(start.as_str()..end.as_str())? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Delete everything but the `keep` most recent messages of a thread in
    /// one batch. Returns the number of deleted rows.
    pub fn delete_oldest_keeping(&self, thread_id: &str, keep: usize) -> Result<usize> {
        let victims = {
            let read_txn = self.db.begin_read()?;
            let time_idx = read_txn.open_table(MESSAGE_TIME_INDEX)?;
            let (start, end) = prefix_range(&thread_prefix(thread_id));

            let mut entries: Vec<(String, String)> = Vec::new();
            for entry in time_idx.range(start.as_str()..end.as_str())? {
                let entry = entry?;
                entries.push((entry.0.value().to_string(), entry.1.value().to_string()));
            }

            if entries.len() <= keep {
                return Ok(0);
            }
            let cut = entries.len() - keep;
            entries.truncate(cut);
            entries
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MESSAGE_TABLE)?;
            let mut time_idx = write_txn.open_table(MESSAGE_TIME_INDEX)?;
            for (key, id) in &victims {
                table.remove(id.as_str())?;
                time_idx.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(thread_id, kept = keep, deleted = victims.len(), "Trimmed old messages");
        Ok(victims.len())
    }

    /// Delete every message of a thread. Returns the number deleted.
    pub fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        self.delete_oldest_keeping(thread_id, 0)
    }
}

//! Thread storage - byte-level API for conversation thread persistence.
//!
//! Threads are keyed by their stable identity string; payloads are opaque
//! serialized bytes owned by the typed layer.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const THREAD_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("conversation_threads");

/// Low-level thread storage with byte-level API
#[derive(Debug, Clone)]
pub struct ThreadStorage {
    db: Arc<Database>,
}

impl ThreadStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(THREAD_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store raw thread data, overwriting any existing row for the id.
    pub fn put_raw(&self, id: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(THREAD_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw thread data by ID
    pub fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THREAD_TABLE)?;

        if let Some(data) = table.get(id)? {
            Ok(Some(data.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all raw thread data
    pub fn list_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THREAD_TABLE)?;

        let mut threads = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            threads.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(threads)
    }

    /// Check if a thread exists
    pub fn exists(&self, id: &str) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THREAD_TABLE)?;
        Ok(table.get(id)?.is_some())
    }

    /// Delete a thread row by ID. Associated checkpoints and messages are
    /// managed by their own storages.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(THREAD_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Count all threads
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THREAD_TABLE)?;

        let mut count = 0usize;
        for item in table.iter()? {
            item?;
            count += 1;
        }

        Ok(count)
    }
}

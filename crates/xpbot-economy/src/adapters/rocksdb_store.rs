//! # RocksDB Storage Adapter
//!
//! Production `KeyValueStore` for deployments whose ledger outgrows the
//! file-backed store. Uses `WriteBatch` for the atomic batch path and
//! write-ahead logging with fsync for durability.
//!
//! `fetch_update` is atomic here because the service serializes mutations
//! (`&mut self`) and this process holds the database exclusively - RocksDB
//! itself enforces single-process access via its LOCK file.

use crate::domain::errors::KvStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    sync_writes: bool,
}

impl RocksDbStore {
    /// Open (or create) a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KvStoreError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path).map_err(|e| KvStoreError::Io {
            message: e.to_string(),
        })?;
        Ok(Self {
            db,
            sync_writes: true,
        })
    }

    /// Disable fsync-per-write (faster, loses the last writes on a crash).
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn io_err(e: rocksdb::Error) -> KvStoreError {
        KvStoreError::Io {
            message: e.to_string(),
        }
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        self.db.get(key).map_err(Self::io_err)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(Self::io_err)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError> {
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(Self::io_err)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KvStoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvStoreError> {
        let mut results = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(Self::io_err)?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(key, value),
                BatchOperation::Delete { key } => batch.delete(key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(Self::io_err)
    }

    fn fetch_update(
        &mut self,
        key: &[u8],
        f: &mut dyn FnMut(Option<&[u8]>) -> Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, KvStoreError> {
        let current = self.db.get(key).map_err(Self::io_err)?;
        match f(current.as_deref()) {
            Some(new_value) => {
                self.db
                    .put_opt(key, &new_value, &self.write_options())
                    .map_err(Self::io_err)?;
                Ok(Some(new_value))
            }
            None => Ok(None),
        }
    }
}

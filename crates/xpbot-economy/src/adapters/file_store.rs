//! # File-Backed Store
//!
//! Durable `KeyValueStore` for deployments that do not want a RocksDB
//! build: the whole ledger is held in memory and flushed to a single
//! binary file through an atomic temp-file rename on every mutation. The
//! ledger of a single chat community is small enough that rewriting it per
//! mutation is cheaper than a real storage engine.

use crate::domain::errors::KvStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File-backed key-value store.
///
/// Binary format: repeated `[key_len:u32le][key][value_len:u32le][value]`.
pub struct FileBackedKvStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKvStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = Self::load_from_file(&path).unwrap_or_default();
        if data.is_empty() {
            tracing::info!("[economy] ledger file empty or not found: {}", path.display());
        } else {
            tracing::info!(
                "[economy] loaded {} row(s) from {}",
                data.len(),
                path.display()
            );
        }
        Self { data, path }
    }

    fn load_from_file(path: &Path) -> Option<BTreeMap<Vec<u8>, Vec<u8>>> {
        let mut file = std::fs::File::open(path).ok()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).ok()?;

        let mut data = BTreeMap::new();
        let mut cursor = 0;
        while cursor + 4 <= bytes.len() {
            let key_len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().ok()?) as usize;
            cursor += 4;
            if cursor + key_len > bytes.len() {
                break;
            }
            let key = bytes[cursor..cursor + key_len].to_vec();
            cursor += key_len;

            if cursor + 4 > bytes.len() {
                break;
            }
            let value_len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().ok()?) as usize;
            cursor += 4;
            if cursor + value_len > bytes.len() {
                break;
            }
            let value = bytes[cursor..cursor + value_len].to_vec();
            cursor += value_len;

            data.insert(key, value);
        }
        Some(data)
    }

    fn save_to_file(&self) -> Result<(), KvStoreError> {
        let io_err = |e: std::io::Error| KvStoreError::Io {
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        // Write atomically via temp file, so a crash mid-flush never
        // leaves a truncated ledger behind.
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileBackedKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        self.save_to_file()
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError> {
        self.data.remove(key);
        self.save_to_file()
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KvStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvStoreError> {
        Ok(self
            .data
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        self.save_to_file()
    }

    fn fetch_update(
        &mut self,
        key: &[u8],
        f: &mut dyn FnMut(Option<&[u8]>) -> Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, KvStoreError> {
        let current = self.data.get(key).map(|v| v.as_slice());
        match f(current) {
            Some(new_value) => {
                self.data.insert(key.to_vec(), new_value.clone());
                self.save_to_file()?;
                Ok(Some(new_value))
            }
            None => Ok(None),
        }
    }
}

//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the economy service requires the host application to
//! provide: durable key-value storage, a clock, a randomness source, and
//! the chat-platform role gateway.
//!
//! Production storage adapters live in `crate::adapters`; the in-memory
//! implementations below back the unit tests.

use crate::domain::cooldown::Timestamp;
use crate::domain::errors::{KvStoreError, RoleGatewayError};
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Abstract interface for key-value database operations.
///
/// Production: `FileBackedKvStore` (default) or `RocksDbStore`
/// (`rocksdb-store` feature). Testing: `InMemoryKvStore` (below).
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KvStoreError>;

    /// Iterate over key-value pairs whose key starts with `prefix`.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or none.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError>;

    /// Atomic read-modify-write as a single storage-layer statement.
    ///
    /// Reads the current value of `key`, applies `f`, and writes the result
    /// back without another statement interleaving. Every balance, crate
    /// and counter delta in the engine goes through this, never through a
    /// read in engine memory followed by a separate write.
    ///
    /// `f` returning `None` declines the update and leaves the key
    /// untouched. Returns the bytes written, if any.
    fn fetch_update(
        &mut self,
        key: &[u8],
        f: &mut dyn FnMut(Option<&[u8]>) -> Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>, KvStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for draw randomness (for testability).
pub trait RandomSource: Send + Sync {
    /// A uniform fraction in `[0, 1)`, scaled by the caller to the
    /// catalog's total weight.
    fn next_fraction(&mut self) -> f64;
}

/// The chat platform's role-entitlement surface.
///
/// This is the boundary to an excluded collaborator: implementations talk
/// to the chat gateway. Both operations are best-effort from the ledger's
/// point of view; a failure is reported as a warning, never rolled into
/// the ledger transaction. `revoke_role` must be idempotent - revoking an
/// entitlement the user does not hold is success, not an error.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    /// Apply a role-like entitlement to a user.
    async fn grant_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError>;

    /// Revert a role-like entitlement from a user.
    async fn revoke_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError>;
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Production stores: crate::adapters. In-memory implementations below.
// =============================================================================

/// Default time source using system time.
#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Controllable clock for tests. Clones share the same instant.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock frozen at `now`.
    pub fn at(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Default randomness source backed by the thread-local RNG.
#[derive(Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_fraction(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Scripted randomness for tests: yields the given fractions in order,
/// then repeats the last one.
pub struct ScriptedRandomSource {
    fractions: Vec<f64>,
    index: usize,
}

impl ScriptedRandomSource {
    pub fn new(fractions: Vec<f64>) -> Self {
        Self {
            fractions,
            index: 0,
        }
    }
}

impl RandomSource for ScriptedRandomSource {
    fn next_fraction(&mut self) -> f64 {
        let value = self
            .fractions
            .get(self.index)
            .or_else(|| self.fractions.last())
            .copied()
            .unwrap_or(0.0);
        if self.index < self.fractions.len() {
            self.index += 1;
        }
        value
    }
}

/// In-memory key-value store for unit tests.
///
/// The whole map lives behind `&mut self`, so every operation - including
/// `fetch_update` - is trivially a single atomic statement.
#[derive(Default)]
pub struct InMemoryKvStore {
    data: std::collections::BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError> {
        self.data.remove(key);
        Ok(())
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
        Ok(())
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
                Ok(Some(new_value))
            }
            None => Ok(None),
        }
    }
}

/// Role gateway that only logs. Used when no chat gateway is wired.
#[derive(Default)]
pub struct NullRoleGateway;

#[async_trait]
impl RoleGateway for NullRoleGateway {
    async fn grant_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError> {
        tracing::debug!("[economy] null gateway: grant role {} to {}", role_id, user_id);
        Ok(())
    }

    async fn revoke_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError> {
        tracing::debug!(
            "[economy] null gateway: revoke role {} from {}",
            role_id,
            user_id
        );
        Ok(())
    }
}

/// A role-gateway call observed by `RecordingRoleGateway`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCall {
    Grant { user_id: String, role_id: u64 },
    Revoke { user_id: String, role_id: u64 },
}

/// Recording gateway for tests: captures call order and can be told to
/// fail grants and/or revokes, to exercise the partial-success paths.
#[derive(Clone, Default)]
pub struct RecordingRoleGateway {
    calls: Arc<Mutex<Vec<RoleCall>>>,
    fail_grants: Arc<std::sync::atomic::AtomicBool>,
    fail_revokes: Arc<std::sync::atomic::AtomicBool>,
}

impl RecordingRoleGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<RoleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn set_fail_grants(&self, fail: bool) {
        self.fail_grants.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_revokes(&self, fail: bool) {
        self.fail_revokes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: RoleCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl RoleGateway for RecordingRoleGateway {
    async fn grant_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError> {
        self.record(RoleCall::Grant {
            user_id: user_id.to_string(),
            role_id,
        });
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(RoleGatewayError {
                operation: "grant",
                role_id,
                user_id: user_id.to_string(),
                message: "simulated gateway outage".to_string(),
            });
        }
        Ok(())
    }

    async fn revoke_role(&self, user_id: &str, role_id: u64) -> Result<(), RoleGatewayError> {
        self.record(RoleCall::Revoke {
            user_id: user_id.to_string(),
            role_id,
        });
        if self.fail_revokes.load(Ordering::SeqCst) {
            return Err(RoleGatewayError {
                operation: "revoke",
                role_id,
                user_id: user_id.to_string(),
                message: "simulated gateway outage".to_string(),
            });
        }
        Ok(())
    }
}

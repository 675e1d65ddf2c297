//! # Storage Adapters
//!
//! Durable `KeyValueStore` implementations. The in-memory test adapter
//! lives next to the port traits in `ports::outbound` and is re-exported
//! here for convenience.

mod file_store;
#[cfg(feature = "rocksdb-store")]
mod rocksdb_store;

pub use crate::ports::outbound::InMemoryKvStore;
pub use file_store::FileBackedKvStore;
#[cfg(feature = "rocksdb-store")]
pub use rocksdb_store::RocksDbStore;

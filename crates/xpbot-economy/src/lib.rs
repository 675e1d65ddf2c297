//! # XP / Crate Economy Engine
//!
//! The ledger core of a chat-platform bot: message activity earns XP,
//! accumulated XP buys reward crates, and opening a crate runs a weighted
//! draw over a static perk catalog. At most one perk is equipped per user;
//! equipping a new one always reverts the old one's external effect first.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Non-negative balance | Debits underflowing zero are refused at the atomic storage statement |
//! | 2 | Overflow safety | All balance arithmetic is checked 256-bit; overflow is a typed error |
//! | 3 | Atomic deltas | Every balance/crate/counter delta is one `fetch_update` statement |
//! | 4 | Draw accounting | Each draw moves exactly one `obtained_count`, equip or not |
//! | 5 | Old-before-new | Equip always runs the full unequip of the prior perk first |
//! | 6 | Ledger over gateway | External role failures warn; ledger mutations never roll back for them |
//! | 7 | Re-validated confirms | Confirm re-checks funds/cooldown against current state |
//! | 8 | Decimal persistence | Balances are stored as decimal strings, never fixed-width binary |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure domain logic (balances, catalog, cooldowns, tokens)
//! - `ports/` - Outbound SPI traits plus default/in-memory adapters
//! - `service/` - Application service implementing the operations
//! - `adapters/` - Durable store adapters (file-backed; RocksDB behind the
//!   `rocksdb-store` feature)
//!
//! ## Usage
//!
//! ```ignore
//! use xpbot_economy::{
//!     default_catalog, EconomyConfig, EconomyDependencies, EconomyService,
//! };
//! use xpbot_economy::adapters::FileBackedKvStore;
//! use xpbot_economy::ports::outbound::{NullRoleGateway, SystemTimeSource, ThreadRngSource};
//!
//! let deps = EconomyDependencies {
//!     kv_store: FileBackedKvStore::new("data/ledger.db"),
//!     time_source: SystemTimeSource,
//!     rng: ThreadRngSource,
//!     role_gateway: NullRoleGateway,
//! };
//! let mut economy = EconomyService::new(deps, default_catalog(), EconomyConfig::default());
//!
//! economy.record_activity("user-1")?;
//! let token = economy.propose_buy_crates("user-1", 1)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use domain::account::{Account, PerkStats, UserId};
pub use domain::balance::Xp;
pub use domain::catalog::{default_catalog, PerkCatalog, PerkDef, PerkEffect, PerkId};
pub use domain::config::{EconomyConfig, KeyPrefix};
pub use domain::cooldown::{CooldownStatus, GrantCooldowns};
pub use domain::errors::{EconomyError, KvStoreError, RoleGatewayError};
pub use domain::pending::{ConfirmationToken, PendingAction};
pub use ports::outbound::{
    BatchOperation, KeyValueStore, RandomSource, RoleGateway, TimeSource,
};
pub use service::{
    AccountStatus, ConfirmedAction, DrawOutcome, EconomyDependencies, EconomyService,
    EquipOutcome, UnequipOutcome,
};

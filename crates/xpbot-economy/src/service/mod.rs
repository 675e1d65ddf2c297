//! # Economy Service
//!
//! The application service implementing the ledger operations.
//!
//! ## Architecture
//!
//! This service:
//! 1. Owns the key-value store, clock, randomness and role-gateway ports
//! 2. Enforces the balance, inventory and equipped-perk invariants
//! 3. Performs every balance/crate/counter delta as one atomic storage
//!    statement (`KeyValueStore::fetch_update`)
//! 4. Uses dependency injection for all external dependencies
//!
//! Mutating operations take `&mut self`: a multi-threaded host wraps the
//! service in its own lock, which - together with the atomic storage
//! statements - serializes every read-validate-write sequence.

mod accounts;
mod leaderboard;
mod perks;
mod transactions;

use crate::domain::account::Account;
use crate::domain::catalog::PerkCatalog;
use crate::domain::config::EconomyConfig;
use crate::domain::cooldown::GrantCooldowns;
use crate::domain::errors::EconomyError;
use crate::ports::outbound::{KeyValueStore, RandomSource, RoleGateway, TimeSource};

pub use leaderboard::AccountStatus;
pub use perks::{DrawOutcome, EquipOutcome, UnequipOutcome};
pub use transactions::ConfirmedAction;

/// The economy service.
///
/// Generic over its ports so tests run against in-memory adapters, a
/// controllable clock, scripted randomness and a recording gateway.
pub struct EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Key-value store holding accounts, perk statistics and settings.
    pub(crate) kv_store: KV,
    /// Clock for cooldowns and confirmation TTLs.
    pub(crate) time_source: TS,
    /// Randomness for the perk draw.
    pub(crate) rng: RS,
    /// Chat-platform role entitlement surface (best-effort).
    pub(crate) role_gateway: RG,
    /// The static weighted reward table.
    pub(crate) catalog: PerkCatalog,
    /// Engine configuration.
    pub(crate) config: EconomyConfig,
    /// In-memory per-actor grant cooldowns (volatile by design).
    pub(crate) cooldowns: GrantCooldowns,
}

/// Dependencies for `EconomyService`.
pub struct EconomyDependencies<KV, TS, RS, RG> {
    pub kv_store: KV,
    pub time_source: TS,
    pub rng: RS,
    pub role_gateway: RG,
}

impl<KV, TS, RS, RG> EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Create a new economy service over the given ports.
    pub fn new(
        deps: EconomyDependencies<KV, TS, RS, RG>,
        catalog: PerkCatalog,
        config: EconomyConfig,
    ) -> Self {
        Self {
            kv_store: deps.kv_store,
            time_source: deps.time_source,
            rng: deps.rng,
            role_gateway: deps.role_gateway,
            catalog,
            config,
            cooldowns: GrantCooldowns::new(),
        }
    }

    /// The catalog this service draws from.
    pub fn catalog(&self) -> &PerkCatalog {
        &self.catalog
    }

    /// The active configuration.
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }
}

/// Decode a stored account row.
pub(crate) fn decode_account(key: &[u8], bytes: &[u8]) -> Result<Account, EconomyError> {
    serde_json::from_slice(bytes).map_err(|e| EconomyError::CorruptRow {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

/// Encode an account row for storage.
pub(crate) fn encode_account(account: &Account) -> Result<Vec<u8>, EconomyError> {
    serde_json::to_vec(account).map_err(|e| EconomyError::CorruptRow {
        key: account.user_id.clone(),
        reason: e.to_string(),
    })
}

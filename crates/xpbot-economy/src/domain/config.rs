//! # Configuration and Key Schema
//!
//! Immutable configuration for the economy engine, and the key prefixes
//! used to namespace rows in the key-value store.

use crate::domain::account::UserId;
use crate::domain::balance::Xp;
use crate::domain::catalog::PerkId;

/// Configuration for the economy engine.
///
/// All values have production defaults and builder-style overrides.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// XP credited per observed activity event (default: 10).
    pub xp_per_message: u64,
    /// Price of a single crate in XP (default: 500).
    pub crate_price: u64,
    /// Upper bound on a single peer-to-peer grant (default: 10_000).
    pub grant_max: u64,
    /// Cooldown between grants from the same actor (default: 1 hour).
    pub grant_cooldown_secs: u64,
    /// Lifetime of an unconfirmed proposal (default: 10 minutes).
    ///
    /// `None` lets proposals live forever.
    pub confirmation_ttl_secs: Option<u64>,
    /// Rows returned by the leaderboard query (default: 10).
    pub leaderboard_size: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            xp_per_message: 10,
            crate_price: 500,
            grant_max: 10_000,
            grant_cooldown_secs: 3600,
            confirmation_ttl_secs: Some(600),
            leaderboard_size: 10,
        }
    }
}

impl EconomyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crate price as an XP amount.
    pub fn crate_price_xp(&self) -> Xp {
        Xp::from(self.crate_price)
    }

    pub fn with_xp_per_message(mut self, xp: u64) -> Self {
        self.xp_per_message = xp;
        self
    }

    pub fn with_crate_price(mut self, price: u64) -> Self {
        self.crate_price = price;
        self
    }

    pub fn with_grant_max(mut self, max: u64) -> Self {
        self.grant_max = max;
        self
    }

    pub fn with_grant_cooldown_secs(mut self, secs: u64) -> Self {
        self.grant_cooldown_secs = secs;
        self
    }

    pub fn with_confirmation_ttl_secs(mut self, ttl: Option<u64>) -> Self {
        self.confirmation_ttl_secs = ttl;
        self
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }
}

/// Key prefixes for the key-value store.
///
/// All keys are prefixed to namespace the three durable collections.
#[derive(Debug, Clone, Copy)]
pub enum KeyPrefix {
    /// Account rows: `a:{user_id}` -> Account (JSON)
    Account,
    /// Perk statistics: `p:{perk_id}` -> PerkStats (JSON)
    PerkStats,
    /// Settings: `s:{name}` -> opaque UTF-8 value
    Settings,
}

impl KeyPrefix {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Account => b"a:",
            KeyPrefix::PerkStats => b"p:",
            KeyPrefix::Settings => b"s:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    /// Build an account key from a user id.
    pub fn account_key(user_id: &str) -> Vec<u8> {
        KeyPrefix::Account.key(user_id.as_bytes())
    }

    /// Build a statistics key from a perk id.
    pub fn perk_stats_key(perk_id: &PerkId) -> Vec<u8> {
        KeyPrefix::PerkStats.key(perk_id.as_str().as_bytes())
    }

    /// Build a settings key from a setting name.
    pub fn settings_key(name: &str) -> Vec<u8> {
        KeyPrefix::Settings.key(name.as_bytes())
    }

    /// Recover the user id from an account key (used by prefix scans).
    pub fn user_id_from_account_key(key: &[u8]) -> Option<UserId> {
        let prefix = KeyPrefix::Account.as_bytes();
        if key.starts_with(prefix) {
            String::from_utf8(key[prefix.len()..].to_vec()).ok()
        } else {
            None
        }
    }
}

/// Settings name for the cross-restart leaderboard message pointer.
pub const SETTING_LEADERBOARD_MESSAGE: &str = "leaderboard_message";

//! # Read-Only Queries
//!
//! The query surface consumed by the excluded collaborators: the status
//! command, the leaderboard renderer and its periodic refresh scheduler.
//! Everything here is a pure read of the ledger store, plus the settings
//! passthrough for the cross-restart leaderboard message pointer.

use super::{decode_account, EconomyService};
use crate::domain::account::{PerkStats, UserId};
use crate::domain::balance::Xp;
use crate::domain::catalog::{PerkDef, PerkId};
use crate::domain::config::{KeyPrefix, SETTING_LEADERBOARD_MESSAGE};
use crate::domain::errors::EconomyError;
use crate::ports::outbound::{KeyValueStore, RandomSource, RoleGateway, TimeSource};

/// Snapshot of one user's standing, for the status command.
#[derive(Debug, Clone)]
pub struct AccountStatus {
    pub user_id: UserId,
    pub balance: Xp,
    pub crate_count: u32,
    /// Resolved catalog entry of the equipped perk, if any.
    pub equipped_perk: Option<PerkDef>,
}

impl<KV, TS, RS, RG> EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Balance, crates and equipped perk for one user. An account that
    /// was never created reads as a fresh one.
    pub fn get_status(&self, user: &str) -> Result<AccountStatus, EconomyError> {
        let account = self.load_account(user)?;
        Ok(match account {
            Some(account) => AccountStatus {
                equipped_perk: account
                    .equipped_perk
                    .as_ref()
                    .and_then(|id| self.catalog.get(id))
                    .cloned(),
                user_id: account.user_id,
                balance: account.balance,
                crate_count: account.crate_count,
            },
            None => AccountStatus {
                user_id: user.to_string(),
                balance: Xp::zero(),
                crate_count: 0,
                equipped_perk: None,
            },
        })
    }

    /// The top `n` balances, descending. Ties keep user-id order so the
    /// result is stable for the renderer.
    pub fn top_balances(&self, n: usize) -> Result<Vec<(UserId, Xp)>, EconomyError> {
        let rows = self.kv_store.prefix_scan(KeyPrefix::Account.as_bytes())?;
        let mut entries = Vec::with_capacity(rows.len());
        for (key, bytes) in rows {
            let account = decode_account(&key, &bytes)?;
            entries.push((account.user_id, account.balance));
        }
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        Ok(entries)
    }

    /// Draw counts per catalog entry, descending. Entries never drawn
    /// report zero.
    pub fn perk_statistics(&self) -> Result<Vec<(PerkId, u64)>, EconomyError> {
        let mut entries = Vec::with_capacity(self.catalog.entries().len());
        for perk in self.catalog.entries() {
            let key = KeyPrefix::perk_stats_key(&perk.id);
            let count = match self.kv_store.get(&key)? {
                Some(bytes) => {
                    serde_json::from_slice::<PerkStats>(&bytes)
                        .map_err(|e| EconomyError::CorruptRow {
                            key: String::from_utf8_lossy(&key).into_owned(),
                            reason: e.to_string(),
                        })?
                        .obtained_count
                }
                None => 0,
            };
            entries.push((perk.id.clone(), count));
        }
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(entries)
    }

    /// The id of the last-edited leaderboard message, if one was posted.
    /// Opaque to the ledger.
    pub fn last_leaderboard_message(&self) -> Result<Option<String>, EconomyError> {
        let key = KeyPrefix::settings_key(SETTING_LEADERBOARD_MESSAGE);
        Ok(self
            .kv_store
            .get(&key)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Persist the leaderboard message pointer across restarts.
    pub fn set_last_leaderboard_message(&mut self, message_id: &str) -> Result<(), EconomyError> {
        let key = KeyPrefix::settings_key(SETTING_LEADERBOARD_MESSAGE);
        self.kv_store.put(&key, message_id.as_bytes())?;
        Ok(())
    }
}

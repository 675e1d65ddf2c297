//! # Crate Opening and the Equipped-Perk State Machine
//!
//! Opening a crate is one logical step: decrement inventory, resolve the
//! weighted draw, bump the draw counter. The caller then either equips the
//! result or keeps the old perk (a pure no-op; nothing intermediate is
//! persisted).
//!
//! Equip always runs the full unequip first - old-before-new is mandatory
//! so two external grants are never live at once. Gateway failures on
//! either side are warnings on a committed ledger mutation: the ledger is
//! the source of truth for what the user is entitled to, not a guarantee
//! that the external system is currently in sync.

use super::{decode_account, encode_account, EconomyService};
use crate::domain::account::{Account, PerkStats};
use crate::domain::catalog::{PerkDef, PerkEffect, PerkId};
use crate::domain::config::KeyPrefix;
use crate::domain::errors::{EconomyError, RoleGatewayError};
use crate::ports::outbound::{KeyValueStore, RandomSource, RoleGateway, TimeSource};

/// Result of opening a crate.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// The drawn catalog entry.
    pub perk: PerkDef,
    /// Crates left after this opening.
    pub crates_remaining: u32,
}

/// Result of an unequip.
#[derive(Debug, Clone, Default)]
pub struct UnequipOutcome {
    /// The perk that was cleared, if any was equipped.
    pub removed: Option<PerkId>,
    /// Set when the external revert was attempted and failed.
    pub revert_warning: Option<RoleGatewayError>,
}

/// Result of an equip.
#[derive(Debug, Clone)]
pub struct EquipOutcome {
    /// The perk now recorded as equipped.
    pub equipped: PerkId,
    /// The perk that was displaced, if any.
    pub unequipped: Option<PerkId>,
    /// Set when the old perk's external revert failed.
    pub revert_warning: Option<RoleGatewayError>,
    /// Set when the new perk's external apply failed.
    pub apply_warning: Option<RoleGatewayError>,
}

impl<KV, TS, RS, RG> EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Open one crate: atomically consume it, draw a perk, and record the
    /// draw in the statistics table.
    ///
    /// The counter moves once per draw regardless of what the caller does
    /// with the result - "obtained" tracks draws, not equips. The caller
    /// follows up with `equip_perk` or keeps the old perk (no further
    /// call; nothing was persisted about the choice being open).
    pub fn open_crate(&mut self, user: &str) -> Result<DrawOutcome, EconomyError> {
        let crates_remaining = match self.adjust_crates(user, -1) {
            Ok(count) => count,
            Err(EconomyError::CrateCountOutOfRange { .. })
            | Err(EconomyError::UnknownAccount { .. }) => {
                return Err(EconomyError::NoCratesToOpen);
            }
            Err(e) => return Err(e),
        };

        let r = self.rng.next_fraction() * self.catalog.total_weight();
        let perk = self.catalog.draw_at(r).clone();
        let obtained = self.increment_obtained(&perk.id)?;

        tracing::info!(
            "[economy] {} opened a crate and drew {} (obtained {} times total)",
            user,
            perk.id,
            obtained
        );
        Ok(DrawOutcome {
            perk,
            crates_remaining,
        })
    }

    /// Clear the equipped perk, reverting its external effect first.
    ///
    /// No-op when nothing is equipped; calling it twice in a row has no
    /// additional effect. The stored field is cleared even when the
    /// external revert fails - the failure is reported as a warning.
    pub async fn unequip_perk(&mut self, user: &str) -> Result<UnequipOutcome, EconomyError> {
        let Some(account) = self.load_account(user)? else {
            return Ok(UnequipOutcome::default());
        };
        let Some(perk_id) = account.equipped_perk else {
            return Ok(UnequipOutcome::default());
        };

        let mut revert_warning = None;
        match self.catalog.get(&perk_id) {
            Some(def) => {
                if let PerkEffect::RoleGrant { role_id } = def.effect {
                    if let Err(e) = self.role_gateway.revoke_role(user, role_id).await {
                        tracing::warn!("[economy] best-effort revert failed: {}", e);
                        revert_warning = Some(e);
                    }
                }
            }
            None => {
                // Catalog changed across a restart; nothing to revert.
                tracing::warn!(
                    "[economy] equipped perk {} no longer in catalog; clearing without revert",
                    perk_id
                );
            }
        }

        self.set_equipped(user, None)?;
        tracing::info!("[economy] {} unequipped {}", user, perk_id);
        Ok(UnequipOutcome {
            removed: Some(perk_id),
            revert_warning,
        })
    }

    /// Equip a perk: full unequip of the old one first, then persist the
    /// new pointer, then attempt the external apply.
    ///
    /// A gateway failure on the apply leaves the ledger recording the perk
    /// as equipped; the external grant is reconciled out-of-band.
    pub async fn equip_perk(
        &mut self,
        user: &str,
        perk_id: &PerkId,
    ) -> Result<EquipOutcome, EconomyError> {
        let def = self
            .catalog
            .get(perk_id)
            .cloned()
            .ok_or_else(|| EconomyError::UnknownPerk {
                id: perk_id.to_string(),
            })?;

        // Old-before-new: never two simultaneous external grants.
        let unequip = self.unequip_perk(user).await?;

        self.set_equipped(user, Some(perk_id.clone()))?;

        let mut apply_warning = None;
        match def.effect {
            PerkEffect::RoleGrant { role_id } => {
                if let Err(e) = self.role_gateway.grant_role(user, role_id).await {
                    tracing::warn!("[economy] best-effort apply failed: {}", e);
                    apply_warning = Some(e);
                }
            }
            PerkEffect::XpBoost { .. } => {}
        }

        tracing::info!("[economy] {} equipped {}", user, perk_id);
        Ok(EquipOutcome {
            equipped: perk_id.clone(),
            unequipped: unequip.removed,
            revert_warning: unequip.revert_warning,
            apply_warning,
        })
    }

    /// Bump a perk's draw counter atomically. Returns the new count.
    fn increment_obtained(&mut self, perk_id: &PerkId) -> Result<u64, EconomyError> {
        let key = KeyPrefix::perk_stats_key(perk_id);
        let mut failure: Option<EconomyError> = None;
        let mut new_count = 0u64;

        self.kv_store.fetch_update(&key, &mut |current| {
            let mut stats = match current {
                Some(bytes) => match serde_json::from_slice::<PerkStats>(bytes) {
                    Ok(s) => s,
                    Err(e) => {
                        failure = Some(EconomyError::CorruptRow {
                            key: String::from_utf8_lossy(&key).into_owned(),
                            reason: e.to_string(),
                        });
                        return None;
                    }
                },
                None => PerkStats::default(),
            };
            stats.obtained_count = stats.obtained_count.saturating_add(1);
            new_count = stats.obtained_count;
            serde_json::to_vec(&stats).ok()
        })?;
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(new_count)
    }

    /// Read an account row, if present.
    pub(crate) fn load_account(&self, user: &str) -> Result<Option<Account>, EconomyError> {
        let key = KeyPrefix::account_key(user);
        match self.kv_store.get(&key)? {
            Some(bytes) => Ok(Some(decode_account(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist the equipped-perk pointer. Requires an existing row.
    fn set_equipped(&mut self, user: &str, perk: Option<PerkId>) -> Result<(), EconomyError> {
        let key = KeyPrefix::account_key(user);
        let mut failure: Option<EconomyError> = None;

        self.kv_store.fetch_update(&key, &mut |current| {
            let Some(bytes) = current else {
                failure = Some(EconomyError::UnknownAccount {
                    user_id: user.to_string(),
                });
                return None;
            };
            let mut account = match decode_account(&key, bytes) {
                Ok(a) => a,
                Err(e) => {
                    failure = Some(e);
                    return None;
                }
            };
            account.equipped_perk = perk.clone();
            match encode_account(&account) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    failure = Some(e);
                    None
                }
            }
        })?;
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(())
    }
}

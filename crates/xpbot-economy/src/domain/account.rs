//! # Account Entity
//!
//! One row per actor, keyed by the stable external identity string the chat
//! platform assigns. Rows are created lazily on first observed activity and
//! deleted only by the full-reset operation.

use crate::domain::balance::Xp;
use crate::domain::catalog::PerkId;
use serde::{Deserialize, Serialize};

/// Stable external identity of an actor (opaque to the ledger).
pub type UserId = String;

/// A user's ledger row.
///
/// ## Invariants
///
/// - `balance` is non-negative by construction (`Xp` is unsigned).
/// - `equipped_perk`, when set, names an entry of the perk catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// External identity this row belongs to.
    pub user_id: UserId,
    /// XP balance, persisted as a decimal string.
    pub balance: Xp,
    /// Crates purchased but not yet opened.
    pub crate_count: u32,
    /// The at-most-one currently active perk.
    pub equipped_perk: Option<PerkId>,
}

impl Account {
    /// A fresh row: zero balance, zero crates, nothing equipped.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            balance: Xp::zero(),
            crate_count: 0,
            equipped_perk: None,
        }
    }
}

/// Per-perk draw statistics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerkStats {
    /// How many times this perk has been drawn from a crate.
    ///
    /// Counts draws, not successful equips: the counter moves exactly once
    /// per draw even if the caller never equips the result.
    pub obtained_count: u64,
}

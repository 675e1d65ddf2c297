//! # Pending Transaction Tokens
//!
//! Every balance-affecting action is a two-step interaction: the proposal
//! hands the actor an opaque token, and the explicit confirm (or cancel)
//! hands it back. The token carries just enough to re-derive the intended
//! transaction; it is never trusted as already validated. The confirm
//! handler re-checks every precondition against current ledger state.

use crate::domain::account::UserId;
use crate::domain::cooldown::Timestamp;
use crate::domain::errors::EconomyError;
use serde::{Deserialize, Serialize};

/// An unconfirmed balance-affecting intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PendingAction {
    /// Spend `quantity * crate_price` XP for `quantity` crates.
    BuyCrates { user: UserId, quantity: u32 },
    /// Move `amount` XP from one user to another.
    GrantXp {
        from: UserId,
        to: UserId,
        amount: u64,
    },
    /// Delete every account row and zero all perk statistics. Privileged.
    FullReset { requested_by: UserId },
}

impl PendingAction {
    /// The actor who must confirm this action.
    pub fn proposer(&self) -> &str {
        match self {
            PendingAction::BuyCrates { user, .. } => user,
            PendingAction::GrantXp { from, .. } => from,
            PendingAction::FullReset { requested_by } => requested_by,
        }
    }
}

/// The opaque payload handed to the actor at proposal time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationToken {
    /// The intent to re-derive and re-validate at confirm time.
    pub action: PendingAction,
    /// When the proposal was made, for TTL enforcement.
    pub proposed_at: Timestamp,
}

impl ConfirmationToken {
    pub fn new(action: PendingAction, proposed_at: Timestamp) -> Self {
        Self {
            action,
            proposed_at,
        }
    }

    /// Serialize into the opaque string carried by the chat interaction.
    pub fn encode(&self) -> String {
        // A struct of plain strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a token handed back by an interaction.
    pub fn decode(raw: &str) -> Result<Self, EconomyError> {
        serde_json::from_str(raw).map_err(|e| EconomyError::InvalidToken {
            reason: e.to_string(),
        })
    }

    /// Enforce the configured proposal lifetime.
    ///
    /// `ttl_secs: None` keeps proposals valid forever.
    pub fn check_expiry(&self, now: Timestamp, ttl_secs: Option<u64>) -> Result<(), EconomyError> {
        if let Some(ttl) = ttl_secs {
            let age_secs = now.saturating_sub(self.proposed_at);
            if age_secs > ttl {
                return Err(EconomyError::ConfirmationExpired { age_secs });
            }
        }
        Ok(())
    }
}

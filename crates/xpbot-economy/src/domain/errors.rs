//! # Domain Errors
//!
//! Error types for the economy engine.
//!
//! Validation failures are returned to the initiating actor and never
//! propagate as panics. Only storage faults abort an operation outright;
//! external side-effect failures are downgraded to warnings on otherwise
//! committed mutations (see `service/perks.rs`).

use crate::domain::balance::Xp;
use thiserror::Error;

/// Economy operation errors.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// Debit precondition failed. No mutation occurred.
    #[error("Insufficient funds: need {required} XP, have {available}")]
    InsufficientFunds { required: Xp, available: Xp },

    /// Open-crate with an empty inventory. No mutation occurred.
    #[error("No unopened crates")]
    NoCratesToOpen,

    /// Crate inventory would exceed its bound or go negative.
    #[error("Crate count cannot move by {delta} from {current}")]
    CrateCountOutOfRange { current: u32, delta: i64 },

    /// Peer-grant attempted inside the cooldown window.
    #[error("Grant cooldown active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: u64 },

    /// Confirm-time re-validation failed; state moved since the proposal.
    #[error("Confirmation is stale: {reason}")]
    StaleConfirmation { reason: String },

    /// The proposal outlived the configured confirmation TTL.
    #[error("Confirmation expired: proposed {age_secs}s ago")]
    ConfirmationExpired { age_secs: u64 },

    /// A confirmation token that does not decode.
    #[error("Invalid confirmation token: {reason}")]
    InvalidToken { reason: String },

    /// A perk id that is not in the catalog.
    #[error("Unknown perk: {id}")]
    UnknownPerk { id: String },

    /// An operation that requires an existing account row found none.
    /// Callers create rows with `ensure_account` before crediting.
    #[error("Unknown account: {user_id}")]
    UnknownAccount { user_id: String },

    /// Grant amount outside the allowed range.
    #[error("Amount must be between {min} and {max}")]
    AmountOutOfRange { min: u64, max: u64 },

    /// 256-bit balance overflow on credit.
    #[error("Balance overflow")]
    BalanceOverflow,

    /// A stored row that does not deserialize.
    #[error("Corrupt ledger row for key {key:?}: {reason}")]
    CorruptRow { key: String, reason: String },

    /// Storage I/O failure. Fatal for the in-flight operation.
    #[error("Storage error: {0}")]
    Storage(#[from] KvStoreError),
}

/// Key-value store errors.
#[derive(Debug, Clone, Error)]
pub enum KvStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    Io { message: String },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    Corruption { message: String },
}

/// The external role gateway could not apply or revert an entitlement.
///
/// Never fatal to a ledger mutation; surfaced as a warning annotation.
#[derive(Debug, Clone, Error)]
#[error("Role gateway failure ({operation} role {role_id} for {user_id}): {message}")]
pub struct RoleGatewayError {
    pub operation: &'static str,
    pub role_id: u64,
    pub user_id: String,
    pub message: String,
}

//! # Transaction Confirmation Protocol
//!
//! Every balance-affecting user action is propose -> confirm/cancel. The
//! proposal validates against current state and hands back an opaque
//! token; `confirm` decodes it, checks the TTL, and re-validates every
//! precondition against *current* state before mutating - arbitrary time
//! and other activity may have passed since the proposal. `cancel` mutates
//! nothing.
//!
//! The grant cooldown is committed only after the transfer succeeds, so a
//! failed re-validation never burns the actor's window.

use super::EconomyService;
use crate::domain::account::UserId;
use crate::domain::balance::Xp;
use crate::domain::config::KeyPrefix;
use crate::domain::cooldown::CooldownStatus;
use crate::domain::errors::EconomyError;
use crate::domain::pending::{ConfirmationToken, PendingAction};
use crate::ports::outbound::{BatchOperation, KeyValueStore, RandomSource, RoleGateway, TimeSource};

/// A confirmed, committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmedAction {
    CratesPurchased {
        user: UserId,
        quantity: u32,
        cost: Xp,
        new_balance: Xp,
        crate_count: u32,
    },
    XpGranted {
        from: UserId,
        to: UserId,
        amount: Xp,
        from_balance: Xp,
        to_balance: Xp,
    },
    ResetCompleted {
        accounts_deleted: usize,
        stats_zeroed: usize,
    },
}

impl<KV, TS, RS, RG> EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Propose buying `quantity` crates. Validates funds now; the actual
    /// spend happens at confirm time after re-validation.
    pub fn propose_buy_crates(
        &mut self,
        user: &str,
        quantity: u32,
    ) -> Result<ConfirmationToken, EconomyError> {
        let cost = self.crate_cost(quantity)?;
        let account = self.ensure_account(user)?;
        if account.balance < cost {
            return Err(EconomyError::InsufficientFunds {
                required: cost,
                available: account.balance,
            });
        }
        if exceeds_crate_capacity(account.crate_count, quantity) {
            return Err(EconomyError::CrateCountOutOfRange {
                current: account.crate_count,
                delta: i64::from(quantity),
            });
        }
        Ok(ConfirmationToken::new(
            PendingAction::BuyCrates {
                user: user.to_string(),
                quantity,
            },
            self.time_source.now(),
        ))
    }

    /// Propose granting `amount` XP to another user. Validates the amount
    /// range, the actor's cooldown and funds now; nothing is reserved.
    pub fn propose_grant(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<ConfirmationToken, EconomyError> {
        self.check_grant_amount(amount)?;
        self.check_grant_cooldown(from)?;

        let account = self.ensure_account(from)?;
        let amount_xp = Xp::from(amount);
        if account.balance < amount_xp {
            return Err(EconomyError::InsufficientFunds {
                required: amount_xp,
                available: account.balance,
            });
        }
        Ok(ConfirmationToken::new(
            PendingAction::GrantXp {
                from: from.to_string(),
                to: to.to_string(),
                amount,
            },
            self.time_source.now(),
        ))
    }

    /// Propose wiping every account and zeroing all perk statistics.
    /// Privilege checks belong to the command layer; the ledger only
    /// demands the explicit confirm step.
    pub fn propose_full_reset(&mut self, requested_by: &str) -> Result<ConfirmationToken, EconomyError> {
        Ok(ConfirmationToken::new(
            PendingAction::FullReset {
                requested_by: requested_by.to_string(),
            },
            self.time_source.now(),
        ))
    }

    /// Confirm a previously proposed action.
    ///
    /// `actor` is the identity pressing the confirm control; it must be
    /// the proposer. All preconditions are re-validated against current
    /// state before any mutation.
    pub fn confirm(&mut self, actor: &str, raw_token: &str) -> Result<ConfirmedAction, EconomyError> {
        let token = ConfirmationToken::decode(raw_token)?;
        let now = self.time_source.now();
        token.check_expiry(now, self.config.confirmation_ttl_secs)?;

        if token.action.proposer() != actor {
            return Err(EconomyError::InvalidToken {
                reason: "confirmation must come from the proposing actor".to_string(),
            });
        }

        match token.action {
            PendingAction::BuyCrates { user, quantity } => self.confirm_buy(&user, quantity),
            PendingAction::GrantXp { from, to, amount } => self.confirm_grant(&from, &to, amount),
            PendingAction::FullReset { requested_by } => self.confirm_reset(&requested_by),
        }
    }

    /// Cancel a proposal. Decodes the token for display purposes only;
    /// no state changes.
    pub fn cancel(&self, raw_token: &str) -> Result<PendingAction, EconomyError> {
        Ok(ConfirmationToken::decode(raw_token)?.action)
    }

    fn confirm_buy(&mut self, user: &str, quantity: u32) -> Result<ConfirmedAction, EconomyError> {
        let cost = self.crate_cost(quantity)?;

        // Re-validate funds and inventory headroom against current state
        // before the first mutation; both may have moved since the
        // proposal, and an error past the debit would strand a partial
        // commit (XP gone, crates not granted).
        let account = self.ensure_account(user)?;
        if account.balance < cost {
            return Err(EconomyError::StaleConfirmation {
                reason: format!(
                    "insufficient funds: need {} XP, have {}",
                    cost, account.balance
                ),
            });
        }
        if exceeds_crate_capacity(account.crate_count, quantity) {
            return Err(EconomyError::StaleConfirmation {
                reason: format!(
                    "crate inventory at {} cannot hold {} more",
                    account.crate_count, quantity
                ),
            });
        }

        let new_balance = self.debit(user, cost)?;
        let crate_count = self.adjust_crates(user, i64::from(quantity))?;

        tracing::info!(
            "[economy] {} bought {} crate(s) for {} XP (balance {})",
            user,
            quantity,
            cost,
            new_balance
        );
        Ok(ConfirmedAction::CratesPurchased {
            user: user.to_string(),
            quantity,
            cost,
            new_balance,
            crate_count,
        })
    }

    fn confirm_grant(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<ConfirmedAction, EconomyError> {
        // Full re-validation: range, cooldown, funds.
        self.check_grant_amount(amount)
            .map_err(|_| EconomyError::StaleConfirmation {
                reason: "grant amount no longer within the allowed range".to_string(),
            })?;
        self.check_grant_cooldown(from)?;

        let amount_xp = Xp::from(amount);
        let balance = self.get_balance(from)?;
        if balance < amount_xp {
            return Err(EconomyError::StaleConfirmation {
                reason: format!(
                    "insufficient funds: need {} XP, have {}",
                    amount_xp, balance
                ),
            });
        }

        self.ensure_account(from)?;
        self.ensure_account(to)?;

        // The recipient must be able to absorb the credit before the
        // sender is debited; otherwise a 256-bit ceiling on the receiving
        // side would destroy the sender's XP.
        if self.get_balance(to)?.checked_add(amount_xp).is_none() {
            return Err(EconomyError::BalanceOverflow);
        }

        let from_balance = self.debit(from, amount_xp)?;
        let to_balance = self.credit(to, amount_xp)?;

        // Only a committed transfer consumes the cooldown.
        let now = self.time_source.now();
        self.cooldowns.commit(from, now);

        tracing::info!(
            "[economy] {} granted {} XP to {} (balances {} / {})",
            from,
            amount_xp,
            to,
            from_balance,
            to_balance
        );
        Ok(ConfirmedAction::XpGranted {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount_xp,
            from_balance,
            to_balance,
        })
    }

    fn confirm_reset(&mut self, requested_by: &str) -> Result<ConfirmedAction, EconomyError> {
        let accounts = self.kv_store.prefix_scan(KeyPrefix::Account.as_bytes())?;
        let stats = self.kv_store.prefix_scan(KeyPrefix::PerkStats.as_bytes())?;

        let accounts_deleted = accounts.len();
        let stats_zeroed = stats.len();

        let operations = accounts
            .into_iter()
            .map(|(key, _)| BatchOperation::delete(key))
            .chain(stats.into_iter().map(|(key, _)| BatchOperation::delete(key)))
            .collect();
        self.kv_store.atomic_batch_write(operations)?;
        self.cooldowns.clear();

        tracing::info!(
            "[economy] full reset by {}: {} account(s) deleted, {} perk counter(s) zeroed",
            requested_by,
            accounts_deleted,
            stats_zeroed
        );
        Ok(ConfirmedAction::ResetCompleted {
            accounts_deleted,
            stats_zeroed,
        })
    }

    fn crate_cost(&self, quantity: u32) -> Result<Xp, EconomyError> {
        if quantity < 1 {
            return Err(EconomyError::AmountOutOfRange {
                min: 1,
                max: u64::from(u32::MAX),
            });
        }
        self.config
            .crate_price_xp()
            .checked_mul_u64(u64::from(quantity))
            .ok_or(EconomyError::BalanceOverflow)
    }

    fn check_grant_amount(&self, amount: u64) -> Result<(), EconomyError> {
        if amount < 1 || amount > self.config.grant_max {
            return Err(EconomyError::AmountOutOfRange {
                min: 1,
                max: self.config.grant_max,
            });
        }
        Ok(())
    }

    fn check_grant_cooldown(&self, actor: &str) -> Result<(), EconomyError> {
        let now = self.time_source.now();
        match self
            .cooldowns
            .check(actor, now, self.config.grant_cooldown_secs)
        {
            CooldownStatus::Ready => Ok(()),
            CooldownStatus::OnCooldown { remaining_secs } => {
                Err(EconomyError::CooldownActive { remaining_secs })
            }
        }
    }
}

/// Whether granting `quantity` more crates would push the inventory past
/// its `u32` bound.
fn exceeds_crate_capacity(current: u32, quantity: u32) -> bool {
    u64::from(current) + u64::from(quantity) > u64::from(u32::MAX)
}

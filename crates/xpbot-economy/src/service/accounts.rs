//! # Balance Engine
//!
//! Account lifecycle and the credit/debit/crate-count primitives. Every
//! mutation here is a single `fetch_update` statement against the store,
//! never a read into engine memory followed by a separate write, so
//! interleaved handlers cannot lose updates.

use super::{decode_account, encode_account, EconomyService};
use crate::domain::account::Account;
use crate::domain::balance::Xp;
use crate::domain::config::KeyPrefix;
use crate::domain::errors::EconomyError;
use crate::ports::outbound::{KeyValueStore, RandomSource, RoleGateway, TimeSource};

/// Direction of a balance delta. A debit is a credit with the sign flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Credit,
    Debit,
}

impl<KV, TS, RS, RG> EconomyService<KV, TS, RS, RG>
where
    KV: KeyValueStore,
    TS: TimeSource,
    RS: RandomSource,
    RG: RoleGateway,
{
    /// Return the account for `user`, creating a fresh zeroed row if none
    /// exists yet. Rows are created lazily on first observed activity.
    pub fn ensure_account(&mut self, user: &str) -> Result<Account, EconomyError> {
        let key = KeyPrefix::account_key(user);
        let mut failure: Option<EconomyError> = None;
        let fresh = Account::new(user);

        self.kv_store.fetch_update(&key, &mut |current| {
            if current.is_some() {
                // Row exists; leave it untouched.
                return None;
            }
            match encode_account(&fresh) {
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

        match self.kv_store.get(&key)? {
            Some(bytes) => decode_account(&key, &bytes),
            // fetch_update just wrote the row; absence means storage loss.
            None => Err(EconomyError::UnknownAccount {
                user_id: user.to_string(),
            }),
        }
    }

    /// Read-only balance probe. Returns 0 for an absent account and does
    /// not create one.
    pub fn get_balance(&self, user: &str) -> Result<Xp, EconomyError> {
        let key = KeyPrefix::account_key(user);
        match self.kv_store.get(&key)? {
            Some(bytes) => Ok(decode_account(&key, &bytes)?.balance),
            None => Ok(Xp::zero()),
        }
    }

    /// Add `amount` to the user's balance.
    ///
    /// The account must already exist (`ensure_account` first).
    pub fn credit(&mut self, user: &str, amount: Xp) -> Result<Xp, EconomyError> {
        self.apply_balance_delta(user, amount, Sign::Credit)
    }

    /// Remove `amount` from the user's balance.
    ///
    /// Call sites validate sufficiency immediately beforehand within the
    /// same logical transaction; the atomic statement below still refuses
    /// to take a balance under zero, which is what keeps interleaved
    /// debits from ever producing a negative balance.
    pub fn debit(&mut self, user: &str, amount: Xp) -> Result<Xp, EconomyError> {
        self.apply_balance_delta(user, amount, Sign::Debit)
    }

    /// Adjust the crate inventory by a signed delta, atomically at the
    /// storage layer. Refuses deltas that would take the count negative.
    pub fn adjust_crates(&mut self, user: &str, delta: i64) -> Result<u32, EconomyError> {
        let key = KeyPrefix::account_key(user);
        let mut failure: Option<EconomyError> = None;
        let mut new_count = 0u32;

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
            let adjusted = (i64::from(account.crate_count)).checked_add(delta);
            match adjusted {
                Some(v) if (0..=i64::from(u32::MAX)).contains(&v) => {
                    account.crate_count = v as u32;
                }
                _ => {
                    failure = Some(EconomyError::CrateCountOutOfRange {
                        current: account.crate_count,
                        delta,
                    });
                    return None;
                }
            }
            new_count = account.crate_count;
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
        Ok(new_count)
    }

    /// Message-activity accrual: make sure the row exists, then credit the
    /// configured per-message XP. Returns the new balance.
    pub fn record_activity(&mut self, user: &str) -> Result<Xp, EconomyError> {
        self.ensure_account(user)?;
        let earned = Xp::from(self.config.xp_per_message);
        let balance = self.credit(user, earned)?;
        tracing::debug!(
            "[economy] activity: {} earned {} XP (balance {})",
            user,
            earned,
            balance
        );
        Ok(balance)
    }

    fn apply_balance_delta(
        &mut self,
        user: &str,
        amount: Xp,
        sign: Sign,
    ) -> Result<Xp, EconomyError> {
        let key = KeyPrefix::account_key(user);
        let mut failure: Option<EconomyError> = None;
        let mut new_balance = Xp::zero();

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
            account.balance = match sign {
                Sign::Credit => match account.balance.checked_add(amount) {
                    Some(b) => b,
                    None => {
                        failure = Some(EconomyError::BalanceOverflow);
                        return None;
                    }
                },
                Sign::Debit => match account.balance.checked_sub(amount) {
                    Some(b) => b,
                    None => {
                        failure = Some(EconomyError::InsufficientFunds {
                            required: amount,
                            available: account.balance,
                        });
                        return None;
                    }
                },
            };
            new_balance = account.balance;
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
        Ok(new_balance)
    }
}

//! # Grant Cooldown Tracking
//!
//! Per-actor cooldown for the peer-to-peer XP grant. The map is held in
//! memory only: losing it on restart is acceptable because the cooldown is
//! an anti-spam control, not a balance-affecting invariant.
//!
//! The check and the commit are split so a proposal that later fails
//! confirm-time re-validation never burns the actor's cooldown:
//! `check` is pure, `commit` is called only after the grant succeeded.

use crate::domain::account::UserId;
use std::collections::HashMap;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// Actor may grant now.
    Ready,
    /// Actor granted too recently.
    OnCooldown {
        /// Seconds until the window reopens.
        remaining_secs: u64,
    },
}

impl CooldownStatus {
    /// Remaining time with minute/second granularity, for user display.
    pub fn remaining_display(&self) -> Option<(u64, u64)> {
        match self {
            CooldownStatus::Ready => None,
            CooldownStatus::OnCooldown { remaining_secs } => {
                Some((remaining_secs / 60, remaining_secs % 60))
            }
        }
    }
}

/// In-memory cooldown map for the grant operation.
#[derive(Debug, Default)]
pub struct GrantCooldowns {
    last_grant: HashMap<UserId, Timestamp>,
}

impl GrantCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure check against the window. Does not mutate.
    pub fn check(&self, actor: &str, now: Timestamp, window_secs: u64) -> CooldownStatus {
        match self.last_grant.get(actor) {
            Some(&last) => {
                let elapsed = now.saturating_sub(last);
                if elapsed >= window_secs {
                    CooldownStatus::Ready
                } else {
                    CooldownStatus::OnCooldown {
                        remaining_secs: window_secs - elapsed,
                    }
                }
            }
            None => CooldownStatus::Ready,
        }
    }

    /// Record a successful grant. Call only after the gated operation
    /// actually committed.
    pub fn commit(&mut self, actor: &str, now: Timestamp) {
        self.last_grant.insert(actor.to_string(), now);
    }

    /// Forget all cooldowns (used by the full-reset operation).
    pub fn clear(&mut self) {
        self.last_grant.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 3600;

    #[test]
    fn test_first_grant_is_ready() {
        let cooldowns = GrantCooldowns::new();
        assert_eq!(cooldowns.check("alice", 1000, WINDOW), CooldownStatus::Ready);
    }

    #[test]
    fn test_window_boundaries() {
        let mut cooldowns = GrantCooldowns::new();
        cooldowns.commit("alice", 0);

        // t = D - 1: still on cooldown with ~1 unit remaining.
        assert_eq!(
            cooldowns.check("alice", WINDOW - 1, WINDOW),
            CooldownStatus::OnCooldown { remaining_secs: 1 }
        );
        // t = D: window reopens.
        assert_eq!(cooldowns.check("alice", WINDOW, WINDOW), CooldownStatus::Ready);
        // t = D + 1: still ready.
        assert_eq!(
            cooldowns.check("alice", WINDOW + 1, WINDOW),
            CooldownStatus::Ready
        );
    }

    #[test]
    fn test_check_does_not_reserve() {
        let mut cooldowns = GrantCooldowns::new();
        cooldowns.commit("alice", 0);

        // Repeated failed checks never extend the window.
        for _ in 0..3 {
            assert!(matches!(
                cooldowns.check("alice", 10, WINDOW),
                CooldownStatus::OnCooldown { .. }
            ));
        }
        assert_eq!(cooldowns.check("alice", WINDOW, WINDOW), CooldownStatus::Ready);
    }

    #[test]
    fn test_actors_are_independent() {
        let mut cooldowns = GrantCooldowns::new();
        cooldowns.commit("alice", 100);
        assert_eq!(cooldowns.check("bob", 101, WINDOW), CooldownStatus::Ready);
    }

    #[test]
    fn test_remaining_display_granularity() {
        let status = CooldownStatus::OnCooldown { remaining_secs: 125 };
        assert_eq!(status.remaining_display(), Some((2, 5)));
        assert_eq!(CooldownStatus::Ready.remaining_display(), None);
    }
}

//! # Durability Tests
//!
//! The file-backed store through the whole service: ledger state survives
//! a process restart, while the grant cooldown table - volatile by design -
//! does not.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use xpbot_economy::adapters::FileBackedKvStore;
    use xpbot_economy::ports::outbound::{ManualClock, NullRoleGateway, ScriptedRandomSource};
    use xpbot_economy::{
        default_catalog, EconomyConfig, EconomyDependencies, EconomyService, PerkId, Xp,
    };

    type FileService =
        EconomyService<FileBackedKvStore, ManualClock, ScriptedRandomSource, NullRoleGateway>;

    fn open_service(path: &Path, clock: ManualClock, fractions: Vec<f64>) -> FileService {
        EconomyService::new(
            EconomyDependencies {
                kv_store: FileBackedKvStore::new(path),
                time_source: clock,
                rng: ScriptedRandomSource::new(fractions),
                role_gateway: NullRoleGateway,
            },
            default_catalog(),
            EconomyConfig::new(),
        )
    }

    #[tokio::test]
    async fn test_ledger_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let clock = ManualClock::at(1_700_000_000);

        {
            // r = 90: role-high-roller.
            let mut service = open_service(&path, clock.clone(), vec![0.90]);
            service.ensure_account("alice").unwrap();
            service.credit("alice", Xp::from(1_100)).unwrap();

            let token = service.propose_buy_crates("alice", 2).unwrap();
            service.confirm("alice", &token.encode()).unwrap();

            let outcome = service.open_crate("alice").unwrap();
            service.equip_perk("alice", &outcome.perk.id).await.unwrap();
            service.set_last_leaderboard_message("msg-42").unwrap();
        }

        // A fresh process over the same file sees the identical ledger.
        let service = open_service(&path, clock, vec![]);
        let status = service.get_status("alice").unwrap();
        assert_eq!(status.balance, Xp::from(100));
        assert_eq!(status.crate_count, 1);
        assert_eq!(
            status.equipped_perk.map(|p| p.id),
            Some(PerkId::new("role-high-roller"))
        );

        let stats = service.perk_statistics().unwrap();
        assert_eq!(stats[0], (PerkId::new("role-high-roller"), 1));
        assert_eq!(
            service.last_leaderboard_message().unwrap(),
            Some("msg-42".to_string())
        );
    }

    #[test]
    fn test_cooldowns_reset_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let clock = ManualClock::at(1_700_000_000);

        {
            let mut service = open_service(&path, clock.clone(), vec![]);
            service.ensure_account("alice").unwrap();
            service.credit("alice", Xp::from(1_000)).unwrap();

            let token = service.propose_grant("alice", "bob", 100).unwrap();
            service.confirm("alice", &token.encode()).unwrap();
            assert!(service.propose_grant("alice", "bob", 100).is_err());
        }

        // Balances persisted; the in-memory cooldown did not.
        let mut service = open_service(&path, clock, vec![]);
        assert_eq!(service.get_balance("bob").unwrap(), Xp::from(100));
        assert!(service.propose_grant("alice", "bob", 100).is_ok());
    }
}

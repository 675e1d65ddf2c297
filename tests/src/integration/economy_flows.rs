//! # Economy Flow Tests
//!
//! End-to-end scenarios across the whole engine: activity accrual, the
//! propose/confirm purchase path, crate openings, perk equips against a
//! flaky role gateway, grants under cooldown, and the full reset.

#[cfg(test)]
mod tests {
    use xpbot_economy::ports::outbound::{
        InMemoryKvStore, ManualClock, RecordingRoleGateway, RoleCall, ScriptedRandomSource,
    };
    use xpbot_economy::{
        default_catalog, ConfirmedAction, EconomyConfig, EconomyDependencies, EconomyError,
        EconomyService, PerkEffect, PerkId, Xp,
    };

    type TestService =
        EconomyService<InMemoryKvStore, ManualClock, ScriptedRandomSource, RecordingRoleGateway>;

    /// Service over the shipped catalog and default config, with a frozen
    /// clock and scripted draw fractions.
    fn scripted_service(fractions: Vec<f64>) -> (TestService, ManualClock, RecordingRoleGateway) {
        let clock = ManualClock::at(1_700_000_000);
        let gateway = RecordingRoleGateway::new();
        let service = EconomyService::new(
            EconomyDependencies {
                kv_store: InMemoryKvStore::new(),
                time_source: clock.clone(),
                rng: ScriptedRandomSource::new(fractions),
                role_gateway: gateway.clone(),
            },
            default_catalog(),
            EconomyConfig::new(),
        );
        (service, clock, gateway)
    }

    fn fund(service: &mut TestService, user: &str, amount: u64) {
        service.ensure_account(user).unwrap();
        service.credit(user, Xp::from(amount)).unwrap();
    }

    fn role_id_of(service: &TestService, perk: &str) -> u64 {
        match service
            .catalog()
            .get(&PerkId::new(perk))
            .expect("perk in catalog")
            .effect
        {
            PerkEffect::RoleGrant { role_id } => role_id,
            other => panic!("{perk} is not a role perk: {other:?}"),
        }
    }

    // =========================================================================
    // FULL LIFECYCLE
    // =========================================================================

    /// Earn by chatting, buy a crate, open it, equip the drawn role perk,
    /// grant a friend some XP, then reset the whole community.
    #[tokio::test]
    async fn test_full_economy_lifecycle() {
        // Fraction 0.90 lands at r = 90 in the default catalog
        // (50 + 30 + 15 + 5), inside the role-high-roller band.
        let (mut service, _clock, gateway) = scripted_service(vec![0.90]);

        // 60 messages at 10 XP each.
        for _ in 0..60 {
            service.record_activity("alice").unwrap();
        }
        assert_eq!(service.get_balance("alice").unwrap(), Xp::from(600));

        // Buy one crate at 500 XP via propose/confirm.
        let token = service.propose_buy_crates("alice", 1).unwrap();
        let purchase = service.confirm("alice", &token.encode()).unwrap();
        assert_eq!(
            purchase,
            ConfirmedAction::CratesPurchased {
                user: "alice".to_string(),
                quantity: 1,
                cost: Xp::from(500),
                new_balance: Xp::from(100),
                crate_count: 1,
            }
        );

        // Open it and equip the draw.
        let outcome = service.open_crate("alice").unwrap();
        assert_eq!(outcome.perk.id, PerkId::new("role-high-roller"));
        assert_eq!(outcome.crates_remaining, 0);

        let equip = service.equip_perk("alice", &outcome.perk.id).await.unwrap();
        assert_eq!(equip.equipped, PerkId::new("role-high-roller"));
        assert!(equip.unequipped.is_none());
        assert!(equip.revert_warning.is_none() && equip.apply_warning.is_none());
        assert_eq!(
            gateway.calls(),
            vec![RoleCall::Grant {
                user_id: "alice".to_string(),
                role_id: role_id_of(&service, "role-high-roller"),
            }]
        );

        let status = service.get_status("alice").unwrap();
        assert_eq!(status.crate_count, 0);
        assert_eq!(
            status.equipped_perk.map(|p| p.id),
            Some(PerkId::new("role-high-roller"))
        );

        // Grant bob half the remaining balance. Bob never ran a command.
        let token = service.propose_grant("alice", "bob", 50).unwrap();
        let grant = service.confirm("alice", &token.encode()).unwrap();
        assert_eq!(
            grant,
            ConfirmedAction::XpGranted {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: Xp::from(50),
                from_balance: Xp::from(50),
                to_balance: Xp::from(50),
            }
        );

        // Both accounts on the board; equal balances tie-break by user id.
        let board = service.top_balances(10).unwrap();
        assert_eq!(
            board,
            vec![
                ("alice".to_string(), Xp::from(50)),
                ("bob".to_string(), Xp::from(50)),
            ]
        );

        // One draw recorded.
        let stats = service.perk_statistics().unwrap();
        assert_eq!(stats[0], (PerkId::new("role-high-roller"), 1));
        assert_eq!(stats.iter().map(|(_, n)| n).sum::<u64>(), 1);

        // Full reset wipes accounts and statistics.
        let token = service.propose_full_reset("admin").unwrap();
        let reset = service.confirm("admin", &token.encode()).unwrap();
        assert_eq!(
            reset,
            ConfirmedAction::ResetCompleted {
                accounts_deleted: 2,
                stats_zeroed: 1,
            }
        );
        assert_eq!(service.get_balance("alice").unwrap(), Xp::zero());
        assert!(service.top_balances(10).unwrap().is_empty());
    }

    // =========================================================================
    // CONFIRMATION PROTOCOL UNDER TIME
    // =========================================================================

    #[test]
    fn test_confirmation_expires_after_ttl() {
        let (mut service, clock, _) = scripted_service(vec![]);
        fund(&mut service, "alice", 1_000);

        let token = service.propose_buy_crates("alice", 1).unwrap();
        clock.advance(601);

        let result = service.confirm("alice", &token.encode());
        assert!(matches!(
            result,
            Err(EconomyError::ConfirmationExpired { age_secs: 601 })
        ));
        // Nothing was spent.
        assert_eq!(service.get_balance("alice").unwrap(), Xp::from(1_000));
    }

    #[test]
    fn test_confirm_revalidates_against_current_state() {
        let (mut service, _clock, _) = scripted_service(vec![]);
        fund(&mut service, "alice", 500);

        let token = service.propose_buy_crates("alice", 1).unwrap();
        // Funds drain between propose and confirm.
        service.debit("alice", Xp::from(400)).unwrap();

        let result = service.confirm("alice", &token.encode());
        assert!(matches!(result, Err(EconomyError::StaleConfirmation { .. })));
        assert_eq!(service.get_status("alice").unwrap().crate_count, 0);
    }

    // =========================================================================
    // GRANT COOLDOWN
    // =========================================================================

    #[test]
    fn test_grant_cooldown_window() {
        let (mut service, clock, _) = scripted_service(vec![]);
        fund(&mut service, "alice", 10_000);

        let token = service.propose_grant("alice", "bob", 100).unwrap();
        service.confirm("alice", &token.encode()).unwrap();

        // Cooldown starts at the confirmed transfer, not the proposal.
        let blocked = service.propose_grant("alice", "carol", 100);
        assert!(matches!(
            blocked,
            Err(EconomyError::CooldownActive {
                remaining_secs: 3_600
            })
        ));

        clock.advance(3_599);
        let blocked = service.propose_grant("alice", "carol", 100);
        assert!(matches!(
            blocked,
            Err(EconomyError::CooldownActive { remaining_secs: 1 })
        ));

        clock.advance(2);
        let token = service.propose_grant("alice", "carol", 100).unwrap();
        service.confirm("alice", &token.encode()).unwrap();
        assert_eq!(service.get_balance("carol").unwrap(), Xp::from(100));
        assert_eq!(service.get_balance("alice").unwrap(), Xp::from(9_800));
    }

    // =========================================================================
    // EQUIP AGAINST A FAILING GATEWAY
    // =========================================================================

    /// A gateway outage during an equip swap leaves the ledger consistent:
    /// the new perk is recorded, the failures surface as warnings, and the
    /// call order stays revoke-old-before-grant-new.
    #[tokio::test]
    async fn test_equip_swap_survives_gateway_outage() {
        // r = 90 then r = 97: role-high-roller, then role-crate-baron.
        let (mut service, _clock, gateway) = scripted_service(vec![0.90, 0.97]);
        fund(&mut service, "alice", 1_000);

        let token = service.propose_buy_crates("alice", 2).unwrap();
        service.confirm("alice", &token.encode()).unwrap();

        let first = service.open_crate("alice").unwrap();
        let second = service.open_crate("alice").unwrap();
        assert_eq!(first.perk.id, PerkId::new("role-high-roller"));
        assert_eq!(second.perk.id, PerkId::new("role-crate-baron"));

        service.equip_perk("alice", &first.perk.id).await.unwrap();

        gateway.set_fail_grants(true);
        gateway.set_fail_revokes(true);
        let swap = service.equip_perk("alice", &second.perk.id).await.unwrap();

        assert_eq!(swap.equipped, PerkId::new("role-crate-baron"));
        assert_eq!(swap.unequipped, Some(PerkId::new("role-high-roller")));
        assert!(swap.revert_warning.is_some());
        assert!(swap.apply_warning.is_some());

        // Ledger records the swap despite the outage.
        let status = service.get_status("alice").unwrap();
        assert_eq!(
            status.equipped_perk.map(|p| p.id),
            Some(PerkId::new("role-crate-baron"))
        );

        let high_roller = role_id_of(&service, "role-high-roller");
        let crate_baron = role_id_of(&service, "role-crate-baron");
        assert_eq!(
            gateway.calls(),
            vec![
                RoleCall::Grant {
                    user_id: "alice".to_string(),
                    role_id: high_roller,
                },
                RoleCall::Revoke {
                    user_id: "alice".to_string(),
                    role_id: high_roller,
                },
                RoleCall::Grant {
                    user_id: "alice".to_string(),
                    role_id: crate_baron,
                },
            ]
        );
    }

    // =========================================================================
    // LARGE BALANCES
    // =========================================================================

    /// Balances stay exact far beyond u64, including through storage
    /// round-trips and leaderboard ordering.
    #[test]
    fn test_balances_beyond_machine_integers() {
        let (mut service, _clock, _) = scripted_service(vec![]);

        let huge = Xp::from_dec_str("340282366920938463463374607431768211455").unwrap();
        service.ensure_account("whale").unwrap();
        service.credit("whale", huge).unwrap();
        service.credit("whale", huge).unwrap();

        let expected =
            Xp::from_dec_str("680564733841876926926749214863536422910").unwrap();
        assert_eq!(service.get_balance("whale").unwrap(), expected);

        fund(&mut service, "minnow", u64::MAX);
        let board = service.top_balances(10).unwrap();
        assert_eq!(
            board,
            vec![
                ("whale".to_string(), expected),
                ("minnow".to_string(), Xp::from(u64::MAX)),
            ]
        );

        // Exact down to the last unit on the way back out.
        service.debit("whale", expected).unwrap();
        assert!(service.get_balance("whale").unwrap().is_zero());
    }
}

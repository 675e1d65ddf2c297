//! # Draw Distribution Tests
//!
//! Statistical check of the weighted draw over the shipped catalog: with a
//! seeded RNG the observed frequencies must track the relative weights,
//! and the statistics table must account for every draw.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;
    use xpbot_economy::ports::outbound::{
        InMemoryKvStore, ManualClock, NullRoleGateway, RandomSource,
    };
    use xpbot_economy::{
        default_catalog, EconomyConfig, EconomyDependencies, EconomyService, Xp,
    };

    /// Deterministic `RandomSource` over a seeded PRNG.
    struct SeededRandomSource(StdRng);

    impl RandomSource for SeededRandomSource {
        fn next_fraction(&mut self) -> f64 {
            self.0.gen::<f64>()
        }
    }

    const DRAWS: u32 = 20_000;

    #[test]
    fn test_draw_frequencies_track_weights() {
        let catalog = default_catalog();
        let config = EconomyConfig::new();
        let mut service = EconomyService::new(
            EconomyDependencies {
                kv_store: InMemoryKvStore::new(),
                time_source: ManualClock::at(1_700_000_000),
                rng: SeededRandomSource(StdRng::seed_from_u64(42)),
                role_gateway: NullRoleGateway,
            },
            catalog.clone(),
            config.clone(),
        );

        // Fund exactly enough to buy DRAWS crates at the configured price.
        let cost = config
            .crate_price_xp()
            .checked_mul_u64(u64::from(DRAWS))
            .unwrap();
        service.ensure_account("gambler").unwrap();
        service.credit("gambler", cost).unwrap();

        let token = service.propose_buy_crates("gambler", DRAWS).unwrap();
        service.confirm("gambler", &token.encode()).unwrap();

        let mut observed: HashMap<String, u64> = HashMap::new();
        for _ in 0..DRAWS {
            let outcome = service.open_crate("gambler").unwrap();
            *observed.entry(outcome.perk.id.to_string()).or_default() += 1;
        }

        assert!(service.get_balance("gambler").unwrap().is_zero());
        assert_eq!(service.get_status("gambler").unwrap().crate_count, 0);

        // Each observed frequency within 2 percentage points of its
        // weight share; far looser than the ~0.35% standard error at
        // this sample size, so the seed has plenty of slack.
        let total_weight = catalog.total_weight();
        for entry in catalog.entries() {
            let expected = entry.weight / total_weight;
            let count = observed.get(entry.id.as_str()).copied().unwrap_or(0);
            let actual = count as f64 / f64::from(DRAWS);
            assert!(
                (actual - expected).abs() < 0.02,
                "{}: expected ~{:.3}, drew {:.3} ({count} of {DRAWS})",
                entry.id.as_str(),
                expected,
                actual,
            );
        }

        // The statistics table accounts for every single draw.
        let stats = service.perk_statistics().unwrap();
        assert_eq!(
            stats.iter().map(|(_, n)| n).sum::<u64>(),
            u64::from(DRAWS)
        );
        for (id, count) in stats {
            assert_eq!(
                count,
                observed.get(id.as_str()).copied().unwrap_or(0),
                "statistics row for {} disagrees with the observed tally",
                id.as_str()
            );
        }

        // Spending then drawing left no stray rows behind.
        assert_eq!(service.top_balances(10).unwrap().len(), 1);
    }
}

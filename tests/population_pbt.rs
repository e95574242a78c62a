use channoise_core::rates::ElementaryRates;
use channoise_core::{GillespieEngine, NodeStore, ReplaySource, StepWindow};
use channoise_data::KineticParams;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

prop_compose! {
    fn arb_rates()(
        alpha_m in 0.01f64..5.0,
        beta_m in 0.01f64..5.0,
        alpha_h in 0.01f64..5.0,
        beta_h in 0.01f64..5.0
    ) -> KineticParams {
        KineticParams::constant(alpha_m, beta_m, alpha_h, beta_h)
    }
}

prop_compose! {
    fn arb_window()(
        step_size in 0.001f64..1.0,
        step_index in 0u64..4
    ) -> StepWindow {
        StepWindow::new(step_size, step_index).unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_population_conserved_under_random_dynamics(
        params in arb_rates(),
        n_na in 0u32..500,
        seed in any::<u64>(),
        steps in 1usize..40
    ) {
        let engine: GillespieEngine = GillespieEngine::default();
        let mut store = NodeStore::with_capacity(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        engine.initialize(&mut store, 0, n_na, 0.0, &params, &mut rng).unwrap();

        let mut window = StepWindow::new(0.05, 0).unwrap();
        for _ in 0..steps {
            let open = engine.advance(&mut store, 0, n_na, 0.0, window, &params, &mut rng).unwrap();
            let state = store.get(0).unwrap();
            prop_assert!(open <= n_na);
            prop_assert_eq!(state.total(), u64::from(n_na));
            if let Some(t) = state.next_event {
                prop_assert!(t >= window.end());
            }
            window = window.next();
        }
    }

    #[test]
    fn test_seeded_open_count_is_truncated_equilibrium(
        params in arb_rates(),
        n_na in 1u32..100_000
    ) {
        let engine: GillespieEngine = GillespieEngine::default();
        let mut store = NodeStore::with_capacity(1);
        let mut source = ReplaySource::new(vec![0.5]);
        engine.initialize(&mut store, 0, n_na, 0.0, &params, &mut source).unwrap();

        let rates = ElementaryRates::evaluate(&channoise_core::GeneralizedRates, 0.0, &params).unwrap();
        let p = rates.aggregate().equilibrium_open_probability().unwrap();
        let open = store.open_count(0).unwrap();
        prop_assert_eq!(open, (f64::from(n_na) * p) as u32);
        prop_assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_events_only_fire_inside_window(
        params in arb_rates(),
        window in arb_window(),
        seed in any::<u64>()
    ) {
        let engine: GillespieEngine = GillespieEngine::default();
        let mut store = NodeStore::with_capacity(1);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        engine.initialize(&mut store, 0, 300, 0.0, &params, &mut rng).unwrap();
        let t0 = store.next_event_time(0).unwrap().unwrap();

        let before = *store.get(0).unwrap();
        engine.advance(&mut store, 0, 300, 0.0, window, &params, &mut rng).unwrap();
        let after = *store.get(0).unwrap();

        if window.contains(t0) {
            prop_assert!(after.next_event.unwrap() >= window.end());
        } else {
            prop_assert_eq!(before, after);
        }
    }
}

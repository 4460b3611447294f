//! Statistical properties of the estimators
//!
//! Closed-form checks and estimator behaviour across models. Every run is
//! seeded, so the assertions are deterministic.

use std::sync::Arc;

use lobprob::{
    reach_probability, BidExecutionSetup, BidOrderExecution, ExperimentParameters,
    InSpreadIntensity, MakingSpread, MakingSpreadBook, MakingSpreadBookSetup, MakingSpreadSetup,
    MidpriceSetup, MidpriceUp, MonteCarloExperiment, RunOptions, SimError, StopLossReaching,
    StopLossSetup,
};

fn params(lambda: f64, mu: f64, theta: f64) -> Arc<ExperimentParameters> {
    Arc::new(ExperimentParameters::new(
        lambda,
        mu,
        theta,
        InSpreadIntensity::none(),
    ))
}

fn variance(samples: &[f64]) -> f64 {
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
}

#[test]
fn test_market_order_race_matches_closed_form() {
    // λ = θ = 0: each event is a market order on either side with
    // probability 1/2. Volumes x, positions q:
    // P = 1 - 2 P(Bin(x + q - 1, 1/2) >= x); x = 3, q = 2 gives 6/16.
    let model = MakingSpread::new(
        params(0.0, 1.0, 0.0),
        MakingSpreadSetup {
            bid_volume: 3,
            ask_volume: 3,
            bid_position: 2,
            ask_position: 2,
        },
    )
    .unwrap();
    let p = model.evaluate(50_000, &RunOptions::with_seed(2024)).unwrap();
    assert!((p - 0.375).abs() < 0.01, "expected 0.375, got {}", p);

    // x = 2, q = 1: 1 - 2 * P(Bin(2, 1/2) = 2) = 1/2
    let model = MakingSpread::new(
        params(0.0, 1.0, 0.0),
        MakingSpreadSetup {
            bid_volume: 2,
            ask_volume: 2,
            bid_position: 1,
            ask_position: 1,
        },
    )
    .unwrap();
    let p = model.evaluate(50_000, &RunOptions::with_seed(2025)).unwrap();
    assert!((p - 0.5).abs() < 0.01, "expected 0.5, got {}", p);
}

#[test]
fn test_degenerate_starts_are_exact() {
    let front = BidOrderExecution::new(
        params(1.0, 0.8, 0.1),
        BidExecutionSetup {
            bid_position: 0,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(front.evaluate(100, &RunOptions::default()).unwrap(), 1.0);

    let no_ask = MakingSpread::new(
        params(1.0, 0.8, 0.1),
        MakingSpreadSetup {
            ask_volume: 0,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(no_ask.evaluate(100, &RunOptions::default()).unwrap(), 0.0);
}

#[test]
fn test_every_model_stays_in_unit_interval() {
    let rates = Arc::new(ExperimentParameters::new(
        0.9,
        0.7,
        0.3,
        InSpreadIntensity::PowerLaw {
            scale: 0.4,
            exponent: 1.2,
        },
    ));
    let options = RunOptions::with_seed(31);

    let estimates = [
        BidOrderExecution::new(rates.clone(), BidExecutionSetup::default())
            .unwrap()
            .evaluate(1_000, &options)
            .unwrap(),
        MakingSpread::new(rates.clone(), MakingSpreadSetup::default())
            .unwrap()
            .evaluate(1_000, &options)
            .unwrap(),
        MidpriceUp::new(rates.clone(), MidpriceSetup::default())
            .unwrap()
            .evaluate(1_000, &options)
            .unwrap(),
        MakingSpreadBook::new(
            rates.clone(),
            MakingSpreadBookSetup {
                spread: 4,
                ..Default::default()
            },
        )
        .unwrap()
        .evaluate(1_000, &options)
        .unwrap(),
        StopLossReaching::new(rates, StopLossSetup::default())
            .unwrap()
            .evaluate(1_000, &options)
            .unwrap(),
    ];
    for p in estimates {
        assert!((0.0..=1.0).contains(&p), "got {}", p);
    }
}

#[test]
fn test_single_trial_is_valid() {
    let p = MidpriceUp::new(params(1.0, 0.8, 0.1), MidpriceSetup::default())
        .unwrap()
        .evaluate(1, &RunOptions::default())
        .unwrap();
    assert!(p == 0.0 || p == 1.0);
}

#[test]
fn test_zero_trials_rejected() {
    let model = BidOrderExecution::new(params(1.0, 0.8, 0.1), BidExecutionSetup::default()).unwrap();
    assert!(matches!(
        model.evaluate(0, &RunOptions::default()),
        Err(SimError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_all_zero_rates_are_degenerate() {
    let model = BidOrderExecution::new(params(0.0, 0.0, 0.0), BidExecutionSetup::default()).unwrap();
    assert!(matches!(
        model.evaluate(10, &RunOptions::default()),
        Err(SimError::DegenerateRates { .. })
    ));
}

#[test]
fn test_variance_shrinks_with_trials() {
    let model = BidOrderExecution::new(
        params(1.0, 1.0, 0.2),
        BidExecutionSetup {
            bid_volume: 4,
            ask_volume: 4,
            bid_position: 2,
        },
    )
    .unwrap();

    let estimates = |trials: usize| -> Vec<f64> {
        (0..12u64)
            .map(|seed| model.evaluate(trials, &RunOptions::with_seed(seed)).unwrap())
            .collect()
    };
    let small = estimates(200);
    let large = estimates(10_000);

    let ratio = variance(&small) / variance(&large);
    assert!(ratio > 5.0, "variance ratio {}", ratio);

    let mean_small = small.iter().sum::<f64>() / small.len() as f64;
    let mean_large = large.iter().sum::<f64>() / large.len() as f64;
    assert!((mean_small - mean_large).abs() < 0.05);
}

#[test]
fn test_parallel_matches_sequential() {
    let model = MakingSpreadBook::new(
        Arc::new(ExperimentParameters::default()),
        MakingSpreadBookSetup {
            spread: 3,
            ..Default::default()
        },
    )
    .unwrap();
    let options = RunOptions {
        chunk_size: 128,
        ..RunOptions::with_seed(77)
    };
    let parallel = model.evaluate(3_000, &options).unwrap();
    let sequential = model.evaluate(3_000, &options.clone().sequential()).unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_stop_loss_monotone_for_simulated_drift() {
    // Thin bid: the next move is usually down, so p_adverse > 1/2
    let setup = MidpriceSetup {
        bid_volume: 1,
        ask_volume: 8,
        spread: 2,
    };
    let p_up = MidpriceUp::new(params(0.5, 1.0, 0.1), setup)
        .unwrap()
        .evaluate(10_000, &RunOptions::with_seed(5))
        .unwrap();
    let p_adverse = 1.0 - p_up;
    assert!(p_adverse > 0.5, "p_adverse {}", p_adverse);

    let mut last = f64::INFINITY;
    for k in 1..8 {
        let value = reach_probability(p_adverse, k, 30).unwrap();
        assert!(value <= last + 1e-12);
        last = value;
    }

    let mut last = 0.0;
    for horizon in 1..30 {
        let value = reach_probability(p_adverse, 3, horizon).unwrap();
        assert!(value + 1e-12 >= last);
        last = value;
    }
}

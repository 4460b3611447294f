//! Stop-loss reach probability
//!
//! Treats successive mid-price changes as a ±1 walk with adverse step
//! probability `p = 1 - P(up)`, where `P(up)` comes from [`MidpriceUp`].
//! A net excursion of exactly `k` ticks is only reachable after
//! `n = k + 2j` changes, so the reach probability over a window of
//! `horizon` changes is
//!
//! ```text
//! sum_{j = 1}^{horizon - 1} Binom(j; n = k + 2j, p)
//! ```
//!
//! The raw sum is a sum of point masses over different `n` and can exceed
//! one near `p = 1/2`; the result is clamped to `[0, 1]`.
//!
//! Unless a window is configured, `horizon` is the number of Monte Carlo
//! trials behind `P(up)`.

use crate::error::{SimError, SimResult};
use crate::experiment::{run_trials, ExperimentReport, RunOptions};
use crate::models::{MidpriceSetup, MidpriceUp};
use crate::params::ExperimentParameters;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, Discrete};
use std::sync::Arc;
use tracing::debug;

/// Compose a single-step adverse probability into a `k_ticks` reach
/// probability over `horizon` mid-price changes.
pub fn reach_probability(p_adverse: f64, k_ticks: u32, horizon: u32) -> SimResult<f64> {
    if !(0.0..=1.0).contains(&p_adverse) {
        return Err(SimError::invalid(format!(
            "adverse probability {} is not in [0, 1]",
            p_adverse
        )));
    }

    let k = u64::from(k_ticks);
    let mut total = 0.0;
    for j in 1..u64::from(horizon) {
        let n = k + 2 * j;
        let dist = Binomial::new(p_adverse, n)
            .map_err(|e| SimError::invalid(format!("binomial({}, {}): {}", n, p_adverse, e)))?;
        total += dist.pmf(j);
    }

    Ok(total.min(1.0))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StopLossSetup {
    #[serde(default)]
    pub midprice: MidpriceSetup,
    /// Adverse excursion in ticks
    pub k_ticks: u32,
    /// Observation window in mid-price changes. Unset: the trial count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_times: Option<u32>,
}

impl Default for StopLossSetup {
    fn default() -> Self {
        Self {
            midprice: MidpriceSetup::default(),
            k_ticks: 3,
            n_times: None,
        }
    }
}

/// Result of a stop-loss evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopLossReport {
    /// Underlying mid-price-up estimate
    pub midprice: ExperimentReport,
    pub p_adverse: f64,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct StopLossReaching {
    midprice: MidpriceUp,
    k_ticks: u32,
    n_times: Option<u32>,
}

impl StopLossReaching {
    pub fn new(params: Arc<ExperimentParameters>, setup: StopLossSetup) -> SimResult<Self> {
        Ok(Self {
            midprice: MidpriceUp::new(params, setup.midprice)?,
            k_ticks: setup.k_ticks,
            n_times: setup.n_times,
        })
    }

    pub fn midprice(&self) -> &MidpriceUp {
        &self.midprice
    }

    /// Window used for a run of `trials` trials.
    pub fn horizon(&self, trials: usize) -> u32 {
        self.n_times
            .unwrap_or_else(|| u32::try_from(trials).unwrap_or(u32::MAX))
    }

    /// Simulate `P(up)` with `trials` trials, then compose.
    pub fn run(&self, trials: usize, options: &RunOptions) -> SimResult<StopLossReport> {
        let midprice = run_trials(&self.midprice, trials, options)?;
        let p_adverse = 1.0 - midprice.probability;
        let horizon = self.horizon(trials);
        let probability = reach_probability(p_adverse, self.k_ticks, horizon)?;
        debug!(
            k_ticks = self.k_ticks,
            horizon,
            p_adverse,
            probability,
            "stop-loss composed"
        );
        Ok(StopLossReport {
            midprice,
            p_adverse,
            probability,
        })
    }

    pub fn evaluate(&self, trials: usize, options: &RunOptions) -> SimResult<f64> {
        Ok(self.run(trials, options)?.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::InSpreadIntensity;

    #[test]
    fn test_known_small_values() {
        // j = 1: C(3,1)/8, j = 2: C(5,2)/32
        let p = reach_probability(0.5, 1, 3).unwrap();
        assert!((p - (0.375 + 0.3125)).abs() < 1e-12, "got {}", p);

        // horizon 1 leaves an empty sum
        assert_eq!(reach_probability(0.7, 2, 1).unwrap(), 0.0);
        assert_eq!(reach_probability(0.7, 2, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_certain_walks() {
        // p = 0: never exactly j adverse steps with j >= 1
        assert_eq!(reach_probability(0.0, 2, 50).unwrap(), 0.0);
        // p = 1: every step adverse, so j adverse out of k + 2j only if k + j = 0
        assert_eq!(reach_probability(1.0, 2, 50).unwrap(), 0.0);
    }

    #[test]
    fn test_monotone_in_ticks() {
        for &p in &[0.5, 0.6, 0.75, 0.9] {
            let mut last = f64::INFINITY;
            for k in 0..12 {
                let value = reach_probability(p, k, 40).unwrap();
                assert!(value <= last + 1e-12, "p={} k={} {} > {}", p, k, value, last);
                last = value;
            }
        }
    }

    #[test]
    fn test_monotone_in_horizon() {
        for &p in &[0.2, 0.5, 0.8] {
            let mut last = 0.0;
            for horizon in 1..60 {
                let value = reach_probability(p, 3, horizon).unwrap();
                assert!(value + 1e-12 >= last, "p={} horizon={}", p, horizon);
                assert!((0.0..=1.0).contains(&value));
                last = value;
            }
        }
    }

    #[test]
    fn test_rejects_bad_probability() {
        assert!(reach_probability(1.5, 1, 10).is_err());
        assert!(reach_probability(-0.1, 1, 10).is_err());
        assert!(reach_probability(f64::NAN, 1, 10).is_err());
    }

    #[test]
    fn test_composes_simulated_midprice() {
        let params = Arc::new(ExperimentParameters::new(
            1.0,
            0.8,
            0.2,
            InSpreadIntensity::Constant { rate: 0.1 },
        ));
        let setup = StopLossSetup {
            midprice: MidpriceSetup {
                bid_volume: 3,
                ask_volume: 3,
                spread: 4,
            },
            k_ticks: 2,
            n_times: Some(15),
        };
        let model = StopLossReaching::new(params, setup).unwrap();
        let report = model.run(2_000, &RunOptions::with_seed(11)).unwrap();
        assert!((report.p_adverse - (1.0 - report.midprice.probability)).abs() < 1e-12);
        let expected = reach_probability(report.p_adverse, 2, 15).unwrap();
        assert_eq!(report.probability, expected);
    }

    #[test]
    fn test_window_defaults_to_trial_count() {
        let params = Arc::new(ExperimentParameters::default());
        let setup = StopLossSetup {
            midprice: MidpriceSetup {
                bid_volume: 2,
                ask_volume: 6,
                spread: 3,
            },
            k_ticks: 3,
            n_times: None,
        };
        let model = StopLossReaching::new(params, setup).unwrap();
        assert_eq!(model.horizon(3_000), 3_000);

        let report = model.run(3_000, &RunOptions::with_seed(19)).unwrap();
        let expected = reach_probability(report.p_adverse, 3, 3_000).unwrap();
        assert_eq!(report.probability, expected);

        let windowed = StopLossReaching::new(
            Arc::new(ExperimentParameters::default()),
            StopLossSetup {
                n_times: Some(20),
                ..setup
            },
        )
        .unwrap();
        assert_eq!(windowed.horizon(3_000), 20);
    }

    #[test]
    fn test_setup_without_window_parses() {
        let setup: StopLossSetup = toml::from_str("k_ticks = 2").unwrap();
        assert_eq!(setup.n_times, None);
        assert_eq!(setup.midprice.spread, 10);

        let setup: StopLossSetup = toml::from_str("k_ticks = 2\nn_times = 40").unwrap();
        assert_eq!(setup.n_times, Some(40));
    }
}

//! Experiment file
//!
//! A TOML document with the driver settings, the calibrated rates and the
//! list of scenarios to evaluate:
//!
//! ```toml
//! [run]
//! trials = 20000
//! seed = 7
//!
//! [params]
//! lambda = 1.0
//! mu = 0.8
//! theta = 0.1
//! in_spread = { kind = "power_law", scale = 0.5, exponent = 1.5 }
//!
//! [[scenarios]]
//! kind = "bid_execution"
//! bid_volume = 5
//! ask_volume = 5
//! bid_position = 3
//! ```

use crate::book::BookSnapshot;
use crate::error::SimResult;
use crate::experiment::{run_trials, ExperimentReport, RunOptions};
use crate::models::{
    BidExecutionSetup, BidOrderExecution, MakingSpread, MakingSpreadBook, MakingSpreadBookSetup,
    MakingSpreadSetup, MidpriceSetup, MidpriceUp,
};
use crate::params::ExperimentParameters;
use crate::stop_loss::{StopLossReaching, StopLossSetup};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One experiment to run against the shared parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioConfig {
    BidExecution(BidExecutionSetup),
    MakingSpread(MakingSpreadSetup),
    MidpriceUp(MidpriceSetup),
    MakingSpreadBook(MakingSpreadBookSetup),
    StopLoss(StopLossSetup),
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    /// Simulated estimate. For stop-loss this is the mid-price-up run.
    pub report: ExperimentReport,
    /// Stop-loss only: composed reach probability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach_probability: Option<f64>,
    /// Starting book of the book-aware scenarios
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_book: Option<BookSnapshot>,
}

impl ScenarioResult {
    /// The headline probability of the scenario.
    pub fn probability(&self) -> f64 {
        self.reach_probability.unwrap_or(self.report.probability)
    }
}

impl ScenarioConfig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BidExecution(_) => "bid_execution",
            Self::MakingSpread(_) => "making_spread",
            Self::MidpriceUp(_) => "midprice_up",
            Self::MakingSpreadBook(_) => "making_spread_book",
            Self::StopLoss(_) => "stop_loss",
        }
    }

    pub fn run(
        &self,
        params: &Arc<ExperimentParameters>,
        options: &RunOptions,
    ) -> SimResult<ScenarioResult> {
        let trials = options.trials;
        let mut reach_probability = None;
        let mut initial_book = None;
        let report = match *self {
            Self::BidExecution(setup) => {
                let model = BidOrderExecution::new(params.clone(), setup)?;
                run_trials(&model, trials, options)?
            }
            Self::MakingSpread(setup) => {
                let model = MakingSpread::new(params.clone(), setup)?;
                run_trials(&model, trials, options)?
            }
            Self::MidpriceUp(setup) => {
                let model = MidpriceUp::new(params.clone(), setup)?;
                initial_book = Some(model.initial_book().snapshot());
                run_trials(&model, trials, options)?
            }
            Self::MakingSpreadBook(setup) => {
                let model = MakingSpreadBook::new(params.clone(), setup)?;
                initial_book = Some(model.initial_book().snapshot());
                run_trials(&model, trials, options)?
            }
            Self::StopLoss(setup) => {
                let model = StopLossReaching::new(params.clone(), setup)?;
                initial_book = Some(model.midprice().initial_book().snapshot());
                let stop_loss = model.run(trials, options)?;
                reach_probability = Some(stop_loss.probability);
                stop_loss.midprice
            }
        };

        Ok(ScenarioResult {
            scenario: self.label().to_string(),
            report,
            reach_probability,
            initial_book,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub run: RunOptions,
    #[serde(default)]
    pub params: ExperimentParameters,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            run: RunOptions::default(),
            params: ExperimentParameters::default(),
            scenarios: vec![
                ScenarioConfig::BidExecution(BidExecutionSetup::default()),
                ScenarioConfig::MakingSpread(MakingSpreadSetup::default()),
                ScenarioConfig::MidpriceUp(MidpriceSetup::default()),
                ScenarioConfig::MakingSpreadBook(MakingSpreadBookSetup::default()),
                ScenarioConfig::StopLoss(StopLossSetup::default()),
            ],
        }
    }
}

impl ExperimentConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Run every scenario in order. The first error aborts the run.
    pub fn run_all(&self) -> SimResult<Vec<ScenarioResult>> {
        self.params.validate()?;
        let params = Arc::new(self.params.clone());

        let mut results = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            let result = scenario.run(&params, &self.run)?;
            info!(
                scenario = %result.scenario,
                trials = result.report.trials,
                probability = result.probability(),
                "scenario finished"
            );
            results.push(result);
        }
        Ok(results)
    }
}

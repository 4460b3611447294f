//! Queue-reactive LOB event probabilities
//!
//! Monte Carlo estimates of top-of-book events under a continuous-time
//! Markov model of the touch: resting-order execution, both legs of a quote
//! filling, the direction of the next mid-price move, and the chance of a
//! stop-loss excursion.

pub mod book;
pub mod config;
pub mod error;
pub mod experiment;
pub mod models;
pub mod params;
pub mod sampler;
pub mod stop_loss;

pub use book::{OrderBook, Side, Tick, Volume};
pub use config::{ExperimentConfig, ScenarioConfig, ScenarioResult};
pub use error::{SimError, SimResult};
pub use experiment::{
    run_trial, run_trials, run_trials_with_progress, ExperimentReport, MonteCarloExperiment,
    RunOptions, SimRng, TrialOutcome,
};
pub use models::{
    BidExecutionSetup, BidOrderExecution, MakingSpread, MakingSpreadBook, MakingSpreadBookSetup,
    MakingSpreadSetup, MidpriceSetup, MidpriceUp,
};
pub use params::{ExperimentParameters, InSpreadIntensity};
pub use stop_loss::{reach_probability, StopLossReaching, StopLossReport, StopLossSetup};

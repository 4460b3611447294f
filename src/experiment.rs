//! Monte Carlo trial driver
//!
//! A model implements [`MonteCarloExperiment`]; the driver runs independent
//! trials of the form `reset -> (check, update)* -> Success | Failure` and
//! reports the relative frequency of success.
//!
//! # Determinism
//!
//! Trials are grouped into fixed-size chunks. Chunk `c` owns a private clone
//! of the model and a `ChaCha8Rng` seeded with `(seed, stream = c)`, so the
//! result for a given seed does not depend on the number of worker threads
//! or on whether the run is parallel at all.

use crate::error::{SimError, SimResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, trace};

/// The random source threaded through every model step.
pub type SimRng = ChaCha8Rng;

/// State of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    Running,
    Success,
    Failure,
}

impl TrialOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TrialOutcome::Running)
    }
}

/// A queue-reactive model driven by the trial loop.
pub trait MonteCarloExperiment: Clone + Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Restore the configured starting state. Called once per trial.
    fn reset_state(&mut self);

    /// Draw one event and apply exactly one transition.
    fn update_state(&mut self, rng: &mut SimRng) -> SimResult<()>;

    /// Desirable absorbing condition reached.
    fn success(&self) -> bool;

    /// Undesirable absorbing condition reached.
    fn failure(&self) -> bool;

    /// Success is checked before failure, so a state satisfying both counts
    /// as a success.
    fn outcome(&self) -> TrialOutcome {
        if self.success() {
            TrialOutcome::Success
        } else if self.failure() {
            TrialOutcome::Failure
        } else {
            TrialOutcome::Running
        }
    }

    /// Probability of success estimated over `trials` independent trials.
    fn evaluate(&self, trials: usize, options: &RunOptions) -> SimResult<f64> {
        Ok(run_trials(self, trials, options)?.probability)
    }
}

/// Driver settings shared by every experiment of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Number of trials per experiment for config-driven runs
    /// ([`crate::ExperimentConfig::run_all`]). The library entry points take
    /// the trial count as an argument and ignore this field.
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Base seed; chunk `c` uses stream `c` of this seed
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Run chunks on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Trials per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Safety cap on updates per trial (`None` = unbounded, written as 0)
    #[serde(default = "default_max_steps", with = "step_cap")]
    pub max_steps: Option<u64>,

    /// Log progress at info level after every chunk
    #[serde(default)]
    pub verbose: bool,
}

fn default_trials() -> usize {
    10_000
}

fn default_seed() -> u64 {
    42
}

fn default_parallel() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1_000
}

fn default_max_steps() -> Option<u64> {
    Some(10_000_000)
}

/// Files have no null, so an unbounded cap is stored as 0.
mod step_cap {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cap: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(cap.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let cap = u64::deserialize(deserializer)?;
        Ok((cap > 0).then_some(cap))
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: default_seed(),
            parallel: default_parallel(),
            chunk_size: default_chunk_size(),
            max_steps: default_max_steps(),
            verbose: false,
        }
    }
}

impl RunOptions {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Outcome counts of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub model: String,
    pub trials: usize,
    pub successes: u64,
    pub probability: f64,
    /// Binomial standard error of `probability`
    pub std_error: f64,
}

impl ExperimentReport {
    fn new(model: &str, trials: usize, successes: u64) -> Self {
        let probability = successes as f64 / trials as f64;
        let std_error = (probability * (1.0 - probability) / trials as f64).sqrt();
        Self {
            model: model.to_string(),
            trials,
            successes,
            probability,
            std_error,
        }
    }
}

/// Run one trial to its absorbing state. Returns `true` on success.
pub fn run_trial<M: MonteCarloExperiment>(
    model: &mut M,
    rng: &mut SimRng,
    max_steps: Option<u64>,
) -> SimResult<bool> {
    model.reset_state();
    let mut steps = 0u64;

    loop {
        match model.outcome() {
            TrialOutcome::Success => return Ok(true),
            TrialOutcome::Failure => return Ok(false),
            TrialOutcome::Running => {}
        }

        if let Some(cap) = max_steps {
            if steps >= cap {
                return Err(SimError::NonTerminatingTrial { steps });
            }
        }

        model.update_state(rng)?;
        steps += 1;
    }
}

/// Run `trials` trials and aggregate them into a report.
pub fn run_trials<M: MonteCarloExperiment>(
    model: &M,
    trials: usize,
    options: &RunOptions,
) -> SimResult<ExperimentReport> {
    run_trials_with_progress(model, trials, options, &|_: usize, _: usize| {})
}

/// Same as [`run_trials`], calling `progress(completed, total)` after every
/// chunk. The callback never sees the random source.
pub fn run_trials_with_progress<M, P>(
    model: &M,
    trials: usize,
    options: &RunOptions,
    progress: &P,
) -> SimResult<ExperimentReport>
where
    M: MonteCarloExperiment,
    P: Fn(usize, usize) + Sync,
{
    if trials == 0 {
        return Err(SimError::invalid("trials must be at least 1"));
    }
    if options.chunk_size == 0 {
        return Err(SimError::invalid("chunk_size must be at least 1"));
    }

    let chunk_size = options.chunk_size;
    let chunks = (trials + chunk_size - 1) / chunk_size;
    let completed = AtomicUsize::new(0);

    debug!(
        model = model.name(),
        trials,
        chunks,
        seed = options.seed,
        parallel = options.parallel,
        "starting experiment"
    );

    let run_chunk = |chunk: usize| -> SimResult<u64> {
        let start = chunk * chunk_size;
        let len = chunk_size.min(trials - start);

        let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
        rng.set_stream(chunk as u64);
        let mut local = model.clone();

        let mut successes = 0u64;
        for _ in 0..len {
            if run_trial(&mut local, &mut rng, options.max_steps)? {
                successes += 1;
            }
        }

        let done = completed.fetch_add(len, Ordering::Relaxed) + len;
        trace!(model = model.name(), chunk, successes, "chunk finished");
        if options.verbose {
            info!("{}: {}/{} trials", model.name(), done, trials);
        }
        progress(done, trials);
        Ok(successes)
    };

    let per_chunk: Vec<u64> = if options.parallel {
        (0..chunks)
            .into_par_iter()
            .map(run_chunk)
            .collect::<SimResult<Vec<u64>>>()?
    } else {
        (0..chunks).map(run_chunk).collect::<SimResult<Vec<u64>>>()?
    };

    let report = ExperimentReport::new(model.name(), trials, per_chunk.iter().sum());
    debug!(
        model = model.name(),
        successes = report.successes,
        probability = report.probability,
        std_error = report.std_error,
        "experiment finished"
    );
    Ok(report)
}

//! Calibrated rate parameters
//!
//! Produced by an offline estimation step over historical feed data and
//! consumed read-only by every model.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// In-spread arrival intensity λ_(i) as a function of tick distance `i >= 1`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InSpreadIntensity {
    /// Same rate at every distance.
    Constant { rate: f64 },
    /// `rates[i - 1]`; distances past the end of the table have rate 0.
    Table { rates: Vec<f64> },
    /// `scale * i^(-exponent)`
    PowerLaw { scale: f64, exponent: f64 },
    /// `scale * exp(-decay * i)`
    Exponential { scale: f64, decay: f64 },
    /// Arbitrary calibrated function. Not representable in config files.
    #[serde(skip)]
    Custom(Arc<dyn Fn(u32) -> f64 + Send + Sync>),
}

impl InSpreadIntensity {
    pub fn custom(f: impl Fn(u32) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// No in-spread arrivals.
    pub fn none() -> Self {
        Self::Constant { rate: 0.0 }
    }

    pub fn rate(&self, distance: u32) -> f64 {
        match self {
            Self::Constant { rate } => *rate,
            Self::Table { rates } => distance
                .checked_sub(1)
                .and_then(|i| rates.get(i as usize))
                .copied()
                .unwrap_or(0.0),
            Self::PowerLaw { scale, exponent } => scale * (distance as f64).powf(-exponent),
            Self::Exponential { scale, decay } => scale * (-decay * distance as f64).exp(),
            Self::Custom(f) => f(distance),
        }
    }

    fn validate(&self) -> SimResult<()> {
        let coefficients: Vec<f64> = match self {
            Self::Constant { rate } => vec![*rate],
            Self::Table { rates } => rates.clone(),
            Self::PowerLaw { scale, exponent } => vec![*scale, *exponent],
            Self::Exponential { scale, decay } => vec![*scale, *decay],
            // Checked lazily by the sampler
            Self::Custom(_) => Vec::new(),
        };
        if coefficients.iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
            return Err(SimError::invalid(
                "in-spread intensity coefficients must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InSpreadIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant { rate } => f.debug_struct("Constant").field("rate", rate).finish(),
            Self::Table { rates } => f.debug_struct("Table").field("rates", rates).finish(),
            Self::PowerLaw { scale, exponent } => f
                .debug_struct("PowerLaw")
                .field("scale", scale)
                .field("exponent", exponent)
                .finish(),
            Self::Exponential { scale, decay } => f
                .debug_struct("Exponential")
                .field("scale", scale)
                .field("decay", decay)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Default for InSpreadIntensity {
    fn default() -> Self {
        Self::PowerLaw {
            scale: 0.5,
            exponent: 1.5,
        }
    }
}

/// Rates of the queue-reactive model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentParameters {
    /// Limit order arrival rate at the best level, per side (λ)
    pub lambda: f64,
    /// Market order rate consuming the best level, per side (μ)
    pub mu: f64,
    /// Cancellation rate per resting order (θ)
    pub theta: f64,
    /// In-spread arrival intensity by tick distance (λ_)
    #[serde(default)]
    pub in_spread: InSpreadIntensity,
}

impl Default for ExperimentParameters {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            mu: 0.8,
            theta: 0.1,
            in_spread: InSpreadIntensity::default(),
        }
    }
}

impl ExperimentParameters {
    pub fn new(lambda: f64, mu: f64, theta: f64, in_spread: InSpreadIntensity) -> Self {
        Self {
            lambda,
            mu,
            theta,
            in_spread,
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in [("lambda", self.lambda), ("mu", self.mu), ("theta", self.theta)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        self.in_spread.validate()
    }

    pub fn in_spread_rate(&self, distance: u32) -> f64 {
        self.in_spread.rate(distance)
    }
}

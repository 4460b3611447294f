//! Simulation errors
//!
//! Every error here means the caller's configuration or a book invariant
//! was violated. Nothing is retried: the first error aborts the experiment.

use crate::book::{Side, Tick};

/// Errors raised by the order book, the event sampler and the trial driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Best-level query or mutation on a side with no levels.
    EmptySide { side: Side },
    /// Event rates sum to a non-positive value, or a rate is negative / NaN.
    DegenerateRates { total: f64 },
    /// Rejected at construction time, before any trial runs.
    InvalidConfiguration(String),
    /// In-spread insertion at a price that is not strictly inside the spread.
    PriceOutsideSpread { side: Side, price: Tick },
    /// A trial hit the configured step cap without reaching an absorbing state.
    NonTerminatingTrial { steps: u64 },
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySide { side } => write!(f, "{} side of the book has no levels", side),
            Self::DegenerateRates { total } => {
                write!(f, "degenerate event rates (total = {})", total)
            }
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            Self::PriceOutsideSpread { side, price } => write!(
                f,
                "{} level at {} is not strictly inside the spread",
                side, price
            ),
            Self::NonTerminatingTrial { steps } => write!(
                f,
                "trial did not reach an absorbing state after {} steps",
                steps
            ),
        }
    }
}

impl std::error::Error for SimError {}

pub type SimResult<T> = Result<T, SimError>;

//! Categorical event sampler
//!
//! Every model step draws exactly one event from a list of non-negative
//! rates. The draw is a single uniform in [0, 1) scanned against the
//! running cumulative probability, so the tie-break (first index whose
//! cumulative value exceeds the draw) is explicit.

use crate::error::{SimError, SimResult};
use rand::Rng;

/// Draw one index with probability `rates[i] / sum(rates)`.
pub fn sample_index<R: Rng + ?Sized>(rates: &[f64], rng: &mut R) -> SimResult<usize> {
    let mut total = 0.0;
    for &rate in rates {
        if !(rate >= 0.0 && rate.is_finite()) {
            return Err(SimError::DegenerateRates { total: rate });
        }
        total += rate;
    }
    if !(total > 0.0 && total.is_finite()) {
        return Err(SimError::DegenerateRates { total });
    }

    let draw: f64 = rng.gen();
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &rate) in rates.iter().enumerate() {
        if rate > 0.0 {
            last_positive = i;
        }
        cumulative += rate / total;
        if cumulative > draw {
            return Ok(i);
        }
    }

    // Cumulative sum rounded just below the draw
    Ok(last_positive)
}

/// Named event rates for one model step.
///
/// Cleared and refilled on every step; the backing buffers are kept so a
/// trial does not allocate once warmed up.
#[derive(Debug, Clone)]
pub struct EventTable<E> {
    events: Vec<E>,
    rates: Vec<f64>,
}

impl<E> Default for EventTable<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            rates: Vec::new(),
        }
    }
}

impl<E: Copy> EventTable<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.rates.clear();
    }

    pub fn push(&mut self, event: E, rate: f64) {
        self.events.push(event);
        self.rates.push(rate);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Sample one event proportional to its rate.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimResult<E> {
        let idx = sample_index(&self.rates, rng)?;
        Ok(self.events[idx])
    }
}

//! Next mid-price move is up
//!
//! Book-aware model without an owner order. The mid-price rises when a new
//! bid level appears inside the spread or the ask side is exhausted, and
//! falls on the mirror events.

use super::{apply_in_spread, push_in_spread_events, push_touch_events, LobEvent};
use crate::book::{OrderBook, Side, Tick};
use crate::error::{SimError, SimResult};
use crate::experiment::{MonteCarloExperiment, SimRng};
use crate::params::ExperimentParameters;
use crate::sampler::EventTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MidpriceSetup {
    pub bid_volume: u64,
    pub ask_volume: u64,
    /// Initial spread in ticks
    pub spread: u32,
}

impl Default for MidpriceSetup {
    fn default() -> Self {
        Self {
            bid_volume: 5,
            ask_volume: 5,
            spread: 10,
        }
    }
}

impl MidpriceSetup {
    /// Best bid at tick 0, best ask `spread` ticks above. A zero volume
    /// leaves that side empty.
    pub(crate) fn initial_book(&self) -> SimResult<OrderBook> {
        if self.spread == 0 {
            return Err(SimError::invalid("spread must be at least one tick"));
        }
        OrderBook::with_touch(0, self.bid_volume, Tick::from(self.spread), self.ask_volume)
    }
}

#[derive(Debug, Clone)]
pub struct MidpriceUp {
    params: Arc<ExperimentParameters>,
    initial: OrderBook,
    book: OrderBook,
    events: EventTable<LobEvent>,
}

impl MidpriceUp {
    pub fn new(params: Arc<ExperimentParameters>, setup: MidpriceSetup) -> SimResult<Self> {
        params.validate()?;
        let initial = setup.initial_book()?;

        Ok(Self {
            book: initial.clone(),
            initial,
            params,
            events: EventTable::new(),
        })
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Book every trial starts from.
    pub fn initial_book(&self) -> &OrderBook {
        &self.initial
    }
}

impl MonteCarloExperiment for MidpriceUp {
    fn name(&self) -> &'static str {
        "midprice_up"
    }

    fn reset_state(&mut self) {
        self.book = self.initial.clone();
    }

    fn update_state(&mut self, rng: &mut SimRng) -> SimResult<()> {
        let spread = self.book.spread()?;

        self.events.clear();
        push_touch_events(
            &mut self.events,
            &self.params,
            self.book.volume_at_best(Side::Bid)?,
            self.book.volume_at_best(Side::Ask)?,
        );
        push_in_spread_events(&mut self.events, &self.params, spread);

        match self.events.sample(rng)? {
            LobEvent::LimitOrder(side) => self.book.increment_at_best(side),
            LobEvent::MarketOrder(side) | LobEvent::Cancellation(side) => {
                self.book.decrement_at_best(side)
            }
            LobEvent::InSpread { side, distance } => {
                apply_in_spread(&mut self.book, side, distance)
            }
        }
    }

    fn success(&self) -> bool {
        self.book.level_count(Side::Bid) > 1 || self.book.is_empty(Side::Ask)
    }

    fn failure(&self) -> bool {
        self.book.level_count(Side::Ask) > 1 || self.book.is_empty(Side::Bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{RunOptions, TrialOutcome};
    use crate::params::InSpreadIntensity;
    use rand::SeedableRng;

    fn params(in_spread: InSpreadIntensity) -> Arc<ExperimentParameters> {
        Arc::new(ExperimentParameters::new(1.0, 0.8, 0.2, in_spread))
    }

    #[test]
    fn test_rejects_zero_spread() {
        let result = MidpriceUp::new(
            params(InSpreadIntensity::none()),
            MidpriceSetup {
                spread: 0,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SimError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_initial_book() {
        let model = MidpriceUp::new(params(InSpreadIntensity::default()), MidpriceSetup::default())
            .unwrap();
        assert_eq!(model.book().spread().unwrap(), 10);
        assert_eq!(model.book().volume_at_best(Side::Bid).unwrap(), 5);
        assert_eq!(model.outcome(), TrialOutcome::Running);
    }

    #[test]
    fn test_symmetric_book_is_fair() {
        let model = MidpriceUp::new(
            params(InSpreadIntensity::Constant { rate: 0.1 }),
            MidpriceSetup {
                bid_volume: 3,
                ask_volume: 3,
                spread: 4,
            },
        )
        .unwrap();
        let p = model.evaluate(40_000, &RunOptions::with_seed(17)).unwrap();
        assert!((p - 0.5).abs() < 0.015, "got {}", p);
    }

    #[test]
    fn test_thin_ask_favours_up_move() {
        let model = MidpriceUp::new(
            Arc::new(ExperimentParameters::new(
                0.5,
                1.0,
                0.0,
                InSpreadIntensity::none(),
            )),
            MidpriceSetup {
                bid_volume: 10,
                ask_volume: 1,
                spread: 1,
            },
        )
        .unwrap();
        let p = model.evaluate(20_000, &RunOptions::with_seed(5)).unwrap();
        assert!(p > 0.8, "got {}", p);
    }

    #[test]
    fn test_empty_side_decides_immediately() {
        let up = MidpriceUp::new(
            params(InSpreadIntensity::none()),
            MidpriceSetup {
                ask_volume: 0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(up.evaluate(50, &RunOptions::default()).unwrap(), 1.0);

        let down = MidpriceUp::new(
            params(InSpreadIntensity::none()),
            MidpriceSetup {
                bid_volume: 0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(down.evaluate(50, &RunOptions::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_in_spread_arrival_terminates_trial() {
        // Only in-spread arrivals: the first event always decides the trial
        let model = MidpriceUp::new(
            Arc::new(ExperimentParameters::new(
                0.0,
                0.0,
                0.0,
                InSpreadIntensity::Constant { rate: 1.0 },
            )),
            MidpriceSetup::default(),
        )
        .unwrap();
        let mut local = model.clone();
        let mut rng = SimRng::seed_from_u64(3);
        local.update_state(&mut rng).unwrap();
        assert!(local.outcome().is_terminal());
        assert_eq!(local.book().spread().map(|s| s < 10), Ok(true));
    }
}

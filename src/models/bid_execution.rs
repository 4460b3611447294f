//! Bid order execution
//!
//! Probability that a resting bid reaches the front of its queue before the
//! best ask level is exhausted.

use super::queue::{clamp_position, take_one};
use super::{push_touch_events, LobEvent, QueuePosition};
use crate::book::Side;
use crate::error::SimResult;
use crate::experiment::{MonteCarloExperiment, SimRng};
use crate::params::ExperimentParameters;
use crate::sampler::EventTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Starting configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BidExecutionSetup {
    /// Resting volume at the best bid, including our order
    pub bid_volume: u64,
    /// Resting volume at the best ask
    pub ask_volume: u64,
    /// Our position in the bid queue, clamped to `bid_volume`
    pub bid_position: u64,
}

impl Default for BidExecutionSetup {
    fn default() -> Self {
        Self {
            bid_volume: 5,
            ask_volume: 5,
            bid_position: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BidOrderExecution {
    params: Arc<ExperimentParameters>,
    setup: BidExecutionSetup,
    xb: u64,
    xa: u64,
    bid: QueuePosition,
    events: EventTable<LobEvent>,
}

impl BidOrderExecution {
    pub fn new(
        params: Arc<ExperimentParameters>,
        mut setup: BidExecutionSetup,
    ) -> SimResult<Self> {
        params.validate()?;
        setup.bid_position = clamp_position("bid", setup.bid_volume, setup.bid_position);

        let mut model = Self {
            params,
            setup,
            xb: 0,
            xa: 0,
            bid: QueuePosition::default(),
            events: EventTable::new(),
        };
        model.reset_state();
        Ok(model)
    }

    pub fn bid_position(&self) -> u64 {
        self.bid.0
    }

    pub fn volumes(&self) -> (u64, u64) {
        (self.xb, self.xa)
    }
}

impl MonteCarloExperiment for BidOrderExecution {
    fn name(&self) -> &'static str {
        "bid_execution"
    }

    fn reset_state(&mut self) {
        self.xb = self.setup.bid_volume;
        self.xa = self.setup.ask_volume;
        self.bid = QueuePosition(self.setup.bid_position);
    }

    fn update_state(&mut self, rng: &mut SimRng) -> SimResult<()> {
        self.events.clear();
        // No owner order on the ask side
        push_touch_events(
            &mut self.events,
            &self.params,
            self.bid.cancellable(self.xb),
            self.xa,
        );

        match self.events.sample(rng)? {
            LobEvent::LimitOrder(Side::Bid) => self.xb += 1,
            LobEvent::LimitOrder(Side::Ask) => self.xa += 1,
            LobEvent::MarketOrder(Side::Bid) => {
                take_one(&mut self.xb, Side::Bid)?;
                self.bid.on_market_order();
            }
            LobEvent::MarketOrder(Side::Ask) => take_one(&mut self.xa, Side::Ask)?,
            LobEvent::Cancellation(Side::Bid) => {
                self.bid.on_cancellation(self.xb, rng);
                take_one(&mut self.xb, Side::Bid)?;
            }
            LobEvent::Cancellation(Side::Ask) => take_one(&mut self.xa, Side::Ask)?,
            LobEvent::InSpread { .. } => {}
        }
        Ok(())
    }

    fn success(&self) -> bool {
        self.bid.at_front()
    }

    fn failure(&self) -> bool {
        self.xa == 0
    }
}

//! Making the spread with fixed quotes
//!
//! We rest one order at the best bid and one at the best ask. Success when
//! both reach the front of their queues; failure when one side is exhausted
//! (the mid-price moves) while the order on the other side is still queued.

use super::queue::{clamp_position, take_one};
use super::{push_touch_events, LobEvent, QueuePosition};
use crate::book::Side;
use crate::error::SimResult;
use crate::experiment::{MonteCarloExperiment, SimRng};
use crate::params::ExperimentParameters;
use crate::sampler::EventTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MakingSpreadSetup {
    pub bid_volume: u64,
    pub ask_volume: u64,
    pub bid_position: u64,
    pub ask_position: u64,
}

impl Default for MakingSpreadSetup {
    fn default() -> Self {
        Self {
            bid_volume: 5,
            ask_volume: 5,
            bid_position: 5,
            ask_position: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MakingSpread {
    params: Arc<ExperimentParameters>,
    setup: MakingSpreadSetup,
    xb: u64,
    xa: u64,
    bid: QueuePosition,
    ask: QueuePosition,
    events: EventTable<LobEvent>,
}

impl MakingSpread {
    pub fn new(
        params: Arc<ExperimentParameters>,
        mut setup: MakingSpreadSetup,
    ) -> SimResult<Self> {
        params.validate()?;
        setup.bid_position = clamp_position("bid", setup.bid_volume, setup.bid_position);
        setup.ask_position = clamp_position("ask", setup.ask_volume, setup.ask_position);

        let mut model = Self {
            params,
            setup,
            xb: 0,
            xa: 0,
            bid: QueuePosition::default(),
            ask: QueuePosition::default(),
            events: EventTable::new(),
        };
        model.reset_state();
        Ok(model)
    }

    /// (bid, ask) queue positions.
    pub fn positions(&self) -> (u64, u64) {
        (self.bid.0, self.ask.0)
    }

    pub fn volumes(&self) -> (u64, u64) {
        (self.xb, self.xa)
    }
}

impl MonteCarloExperiment for MakingSpread {
    fn name(&self) -> &'static str {
        "making_spread"
    }

    fn reset_state(&mut self) {
        self.xb = self.setup.bid_volume;
        self.xa = self.setup.ask_volume;
        self.bid = QueuePosition(self.setup.bid_position);
        self.ask = QueuePosition(self.setup.ask_position);
    }

    fn update_state(&mut self, rng: &mut SimRng) -> SimResult<()> {
        self.events.clear();
        push_touch_events(
            &mut self.events,
            &self.params,
            self.bid.cancellable(self.xb),
            self.ask.cancellable(self.xa),
        );

        match self.events.sample(rng)? {
            LobEvent::LimitOrder(Side::Bid) => self.xb += 1,
            LobEvent::LimitOrder(Side::Ask) => self.xa += 1,
            LobEvent::MarketOrder(Side::Bid) => {
                take_one(&mut self.xb, Side::Bid)?;
                self.bid.on_market_order();
            }
            LobEvent::MarketOrder(Side::Ask) => {
                take_one(&mut self.xa, Side::Ask)?;
                self.ask.on_market_order();
            }
            LobEvent::Cancellation(Side::Bid) => {
                self.bid.on_cancellation(self.xb, rng);
                take_one(&mut self.xb, Side::Bid)?;
            }
            LobEvent::Cancellation(Side::Ask) => {
                self.ask.on_cancellation(self.xa, rng);
                take_one(&mut self.xa, Side::Ask)?;
            }
            LobEvent::InSpread { .. } => {}
        }
        Ok(())
    }

    fn success(&self) -> bool {
        self.bid.at_front() && self.ask.at_front()
    }

    fn failure(&self) -> bool {
        // Mid-price fell with our ask unfilled, or rose with our bid unfilled
        (self.xb == 0 && !self.ask.at_front()) || (self.xa == 0 && !self.bid.at_front())
    }
}

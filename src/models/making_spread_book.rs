//! Making the spread with book dynamics
//!
//! Same quotes as [`super::MakingSpread`], but the touch is a live book that
//! can be improved by in-spread arrivals. Any mid-price change before both
//! legs have reached the front of their queues is a failure.

use super::midprice_up::MidpriceSetup;
use super::queue::clamp_position;
use super::{apply_in_spread, push_in_spread_events, push_touch_events, LobEvent, QueuePosition};
use crate::book::{OrderBook, Side};
use crate::error::SimResult;
use crate::experiment::{MonteCarloExperiment, SimRng};
use crate::params::ExperimentParameters;
use crate::sampler::EventTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MakingSpreadBookSetup {
    pub bid_volume: u64,
    pub ask_volume: u64,
    pub bid_position: u64,
    pub ask_position: u64,
    /// Initial spread in ticks
    pub spread: u32,
}

impl Default for MakingSpreadBookSetup {
    fn default() -> Self {
        Self {
            bid_volume: 5,
            ask_volume: 5,
            bid_position: 5,
            ask_position: 5,
            spread: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MakingSpreadBook {
    params: Arc<ExperimentParameters>,
    setup: MakingSpreadBookSetup,
    initial: OrderBook,
    book: OrderBook,
    bid: QueuePosition,
    ask: QueuePosition,
    events: EventTable<LobEvent>,
}

impl MakingSpreadBook {
    pub fn new(
        params: Arc<ExperimentParameters>,
        mut setup: MakingSpreadBookSetup,
    ) -> SimResult<Self> {
        params.validate()?;
        setup.bid_position = clamp_position("bid", setup.bid_volume, setup.bid_position);
        setup.ask_position = clamp_position("ask", setup.ask_volume, setup.ask_position);
        let initial = MidpriceSetup {
            bid_volume: setup.bid_volume,
            ask_volume: setup.ask_volume,
            spread: setup.spread,
        }
        .initial_book()?;

        Ok(Self {
            book: initial.clone(),
            initial,
            params,
            setup,
            bid: QueuePosition(setup.bid_position),
            ask: QueuePosition(setup.ask_position),
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

    /// (bid, ask) queue positions.
    pub fn positions(&self) -> (u64, u64) {
        (self.bid.0, self.ask.0)
    }

    fn both_filled(&self) -> bool {
        self.bid.at_front() && self.ask.at_front()
    }

    fn cancel_at_best(&mut self, side: Side, rng: &mut SimRng) -> SimResult<()> {
        let volume = self.book.volume_at_best(side)?;
        match side {
            Side::Bid => self.bid.on_cancellation(volume, rng),
            Side::Ask => self.ask.on_cancellation(volume, rng),
        }
        self.book.decrement_at_best(side)
    }
}

impl MonteCarloExperiment for MakingSpreadBook {
    fn name(&self) -> &'static str {
        "making_spread_book"
    }

    fn reset_state(&mut self) {
        self.book = self.initial.clone();
        self.bid = QueuePosition(self.setup.bid_position);
        self.ask = QueuePosition(self.setup.ask_position);
    }

    fn update_state(&mut self, rng: &mut SimRng) -> SimResult<()> {
        let spread = self.book.spread()?;
        let bid_volume = self.book.volume_at_best(Side::Bid)?;
        let ask_volume = self.book.volume_at_best(Side::Ask)?;

        self.events.clear();
        push_touch_events(
            &mut self.events,
            &self.params,
            self.bid.cancellable(bid_volume),
            self.ask.cancellable(ask_volume),
        );
        push_in_spread_events(&mut self.events, &self.params, spread);

        match self.events.sample(rng)? {
            LobEvent::LimitOrder(side) => self.book.increment_at_best(side),
            LobEvent::MarketOrder(side) => {
                self.book.decrement_at_best(side)?;
                match side {
                    Side::Bid => self.bid.on_market_order(),
                    Side::Ask => self.ask.on_market_order(),
                }
                Ok(())
            }
            LobEvent::Cancellation(side) => self.cancel_at_best(side, rng),
            LobEvent::InSpread { side, distance } => {
                apply_in_spread(&mut self.book, side, distance)
            }
        }
    }

    fn success(&self) -> bool {
        self.both_filled()
    }

    fn failure(&self) -> bool {
        let improved =
            self.book.level_count(Side::Bid) > 1 || self.book.level_count(Side::Ask) > 1;
        if improved && !self.both_filled() {
            return true;
        }

        // Mid-price rose with our bid queued, or fell with our ask queued
        (self.book.is_empty(Side::Ask) && !self.bid.at_front())
            || (self.book.is_empty(Side::Bid) && !self.ask.at_front())
    }
}

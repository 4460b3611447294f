//! Queue-reactive LOB models
//!
//! Each model is a small CTMC over the touch of the book. Every step draws
//! one event from the families below, weighted by the calibrated rates:
//!
//! | Event | Rate |
//! |---|---|
//! | limit order joins the best queue | λ per side |
//! | market order consumes one unit at best | μ per side |
//! | resting order at best is cancelled | θ × cancellable volume per side |
//! | new level `i` ticks inside the spread | λ_(i), i = 1..S-1, per side |
//!
//! Only the book-aware models ([`MidpriceUp`], [`MakingSpreadBook`]) carry
//! in-spread arrivals.

mod bid_execution;
mod making_spread;
mod making_spread_book;
mod midprice_up;
mod queue;

pub use bid_execution::{BidExecutionSetup, BidOrderExecution};
pub use making_spread::{MakingSpread, MakingSpreadSetup};
pub use making_spread_book::{MakingSpreadBook, MakingSpreadBookSetup};
pub use midprice_up::{MidpriceSetup, MidpriceUp};
pub use queue::QueuePosition;

use crate::book::{OrderBook, Side, Tick};
use crate::error::SimResult;
use crate::params::ExperimentParameters;
use crate::sampler::EventTable;

/// One transition of the top-of-book chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobEvent {
    /// New limit order at the best price of `side`.
    LimitOrder(Side),
    /// Market order consuming the best level of `side`
    /// (a market sell hits `Bid`, a market buy lifts `Ask`).
    MarketOrder(Side),
    /// Cancellation of one resting order at the best price of `side`.
    Cancellation(Side),
    /// New unit level `distance` ticks inside the spread on `side`.
    InSpread { side: Side, distance: u32 },
}

/// Touch events for both sides: arrivals, market orders and cancellations.
/// `cancellable` is the per-side volume exposed to θ.
pub(crate) fn push_touch_events(
    table: &mut EventTable<LobEvent>,
    params: &ExperimentParameters,
    cancellable_bid: u64,
    cancellable_ask: u64,
) {
    table.push(LobEvent::LimitOrder(Side::Bid), params.lambda);
    table.push(LobEvent::LimitOrder(Side::Ask), params.lambda);
    table.push(LobEvent::MarketOrder(Side::Bid), params.mu);
    table.push(LobEvent::MarketOrder(Side::Ask), params.mu);
    table.push(
        LobEvent::Cancellation(Side::Bid),
        params.theta * cancellable_bid as f64,
    );
    table.push(
        LobEvent::Cancellation(Side::Ask),
        params.theta * cancellable_ask as f64,
    );
}

/// In-spread arrivals at distances `1..spread` on the ask side, then the bid side.
pub(crate) fn push_in_spread_events(
    table: &mut EventTable<LobEvent>,
    params: &ExperimentParameters,
    spread: Tick,
) {
    let max_distance = u32::try_from(spread.max(1) - 1).unwrap_or(u32::MAX);
    for side in [Side::Ask, Side::Bid] {
        for distance in 1..=max_distance {
            table.push(
                LobEvent::InSpread { side, distance },
                params.in_spread_rate(distance),
            );
        }
    }
}

/// Place the unit level of an in-spread arrival `distance` ticks inside the
/// best price of `side`.
pub(crate) fn apply_in_spread(book: &mut OrderBook, side: Side, distance: u32) -> SimResult<()> {
    let price = match side {
        Side::Bid => book.best_bid()? + Tick::from(distance),
        Side::Ask => book.best_ask()? - Tick::from(distance),
    };
    book.insert_level(side, price, 1)
}

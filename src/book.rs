//! Order Book primitive
//!
//! Sparse price -> volume maps for the top of a limit order book.
//! Prices are integer ticks; every stored level carries a strictly positive
//! volume, and the best price of each side is cached so that touch queries
//! never walk the tree.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price expressed in ticks.
pub type Tick = i64;

/// Resting quantity at a level, in orders (unit size).
pub type Volume = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// One side of the book with its cached best price.
/// Bids: highest price is best. Asks: lowest price is best.
#[derive(Debug, Clone)]
struct BookSide {
    levels: BTreeMap<Tick, Volume>,
    best: Option<Tick>,
    is_bid: bool,
}

impl BookSide {
    fn new(is_bid: bool) -> Self {
        Self {
            levels: BTreeMap::new(),
            best: None,
            is_bid,
        }
    }

    /// Only needed when the key set changes.
    fn refresh_best(&mut self) {
        self.best = if self.is_bid {
            self.levels.keys().next_back().copied()
        } else {
            self.levels.keys().next().copied()
        };
    }

    fn set(&mut self, price: Tick, volume: Volume) {
        debug_assert!(volume > 0);
        self.levels.insert(price, volume);
        self.refresh_best();
    }

    /// Levels ordered best first.
    fn ordered(&self) -> Vec<(Tick, Volume)> {
        if self.is_bid {
            self.levels.iter().rev().map(|(p, v)| (*p, *v)).collect()
        } else {
            self.levels.iter().map(|(p, v)| (*p, *v)).collect()
        }
    }
}

/// Serializable view of the book, best levels first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<(Tick, Volume)>,
    pub asks: Vec<(Tick, Volume)>,
}

/// Top-of-book state mutated by the book-aware models.
///
/// A book is created at every trial reset and never shared between trials.
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Create an empty order book.
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(true),
            asks: BookSide::new(false),
        }
    }

    /// Book with a single level per side. Zero volumes leave that side empty.
    pub fn with_touch(
        bid_price: Tick,
        bid_volume: Volume,
        ask_price: Tick,
        ask_volume: Volume,
    ) -> SimResult<Self> {
        if bid_price >= ask_price {
            return Err(SimError::invalid(format!(
                "crossed touch: bid {} >= ask {}",
                bid_price, ask_price
            )));
        }

        let mut book = Self::new();
        if bid_volume > 0 {
            book.bids.set(bid_price, bid_volume);
        }
        if ask_volume > 0 {
            book.asks.set(ask_price, ask_volume);
        }
        Ok(book)
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Best price on `side`.
    pub fn best(&self, side: Side) -> SimResult<Tick> {
        self.side(side).best.ok_or(SimError::EmptySide { side })
    }

    pub fn best_bid(&self) -> SimResult<Tick> {
        self.best(Side::Bid)
    }

    pub fn best_ask(&self) -> SimResult<Tick> {
        self.best(Side::Ask)
    }

    /// Best ask minus best bid, in ticks.
    pub fn spread(&self) -> SimResult<Tick> {
        Ok(self.best_ask()? - self.best_bid()?)
    }

    pub fn volume_at_best(&self, side: Side) -> SimResult<Volume> {
        let book_side = self.side(side);
        let price = book_side.best.ok_or(SimError::EmptySide { side })?;
        Ok(book_side.levels.get(&price).copied().unwrap_or(0))
    }

    /// A new limit order joins the back of the best queue.
    pub fn increment_at_best(&mut self, side: Side) -> SimResult<()> {
        let book_side = self.side_mut(side);
        let price = book_side.best.ok_or(SimError::EmptySide { side })?;
        if let Some(volume) = book_side.levels.get_mut(&price) {
            *volume += 1;
        }
        Ok(())
    }

    /// One unit leaves the best queue. An exhausted level is removed and the
    /// next level on that side becomes best.
    pub fn decrement_at_best(&mut self, side: Side) -> SimResult<()> {
        let book_side = self.side_mut(side);
        let price = book_side.best.ok_or(SimError::EmptySide { side })?;

        let exhausted = match book_side.levels.get_mut(&price) {
            Some(volume) if *volume > 1 => {
                *volume -= 1;
                false
            }
            _ => true,
        };

        if exhausted {
            book_side.levels.remove(&price);
            book_side.refresh_best();
        }
        Ok(())
    }

    /// Create a level strictly between the current best bid and best ask.
    pub fn insert_level(&mut self, side: Side, price: Tick, quantity: Volume) -> SimResult<()> {
        if quantity == 0 {
            return Err(SimError::invalid("in-spread level needs a positive quantity"));
        }

        let above_bid = self.bids.best.map_or(true, |bid| price > bid);
        let below_ask = self.asks.best.map_or(true, |ask| price < ask);
        if !(above_bid && below_ask) {
            return Err(SimError::PriceOutsideSpread { side, price });
        }

        self.side_mut(side).set(price, quantity);
        Ok(())
    }

    /// Number of distinct price levels on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        self.side(side).levels.len()
    }

    pub fn is_empty(&self, side: Side) -> bool {
        self.side(side).levels.is_empty()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.ordered(),
            asks: self.asks.ordered(),
        }
    }
}

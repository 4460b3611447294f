//! Owner queue position at the best level
//!
//! The owner's order sits at `position` in the FIFO queue of its level
//! (0 = front, next to execute). Resting volume always includes the owner's
//! order while it has not executed.

use crate::book::Side;
use crate::error::{SimError, SimResult};
use crate::experiment::SimRng;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueuePosition(pub u64);

impl QueuePosition {
    pub fn at_front(self) -> bool {
        self.0 == 0
    }

    /// Volume exposed to cancellation. The owner never cancels, so its own
    /// order is excluded unless it is already at the front.
    pub fn cancellable(self, volume: u64) -> u64 {
        if self.0 > 0 {
            volume.saturating_sub(1)
        } else {
            volume
        }
    }

    /// A market order consumed the head of the queue.
    pub fn on_market_order(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// A cancellation hit the level holding `volume` (before the decrement).
    ///
    /// The cancelled unit is attributed behind the owner with probability
    /// `(volume - position) / cancellable`; otherwise it was ahead and the
    /// owner moves up one place.
    pub fn on_cancellation(&mut self, volume: u64, rng: &mut SimRng) {
        let draw: f64 = rng.gen();
        let cancellable = self.cancellable(volume);
        if cancellable == 0 || self.0 == 0 {
            return;
        }

        let behind = volume.saturating_sub(self.0) as f64 / cancellable as f64;
        if draw > behind {
            self.0 -= 1;
        }
    }
}

/// Fit a configured position into a queue of `volume`. A position equal to
/// the volume puts the owner at the back; anything larger is clamped there.
pub(crate) fn clamp_position(label: &str, volume: u64, position: u64) -> u64 {
    if position > volume {
        debug!(
            side = label,
            position,
            volume,
            "queue position clamped to the back of the queue"
        );
        return volume;
    }
    position
}

/// Decrement a plain volume counter, failing like the book would on an
/// exhausted side.
pub(crate) fn take_one(volume: &mut u64, side: Side) -> SimResult<()> {
    *volume = volume
        .checked_sub(1)
        .ok_or(SimError::EmptySide { side })?;
    Ok(())
}

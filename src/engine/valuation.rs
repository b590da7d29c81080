//! Walk-the-book estimate of what an open position is worth right now.
//!
//! This is an estimator, not a matching engine: it assumes the position could be
//! unwound against the levels currently resting on its own side of the book and
//! ignores queue position, fees and market impact beyond the levels themselves.

use tracing::trace;

use crate::engine::book::Book;
use crate::engine::types::{Position, PriceLevel};

/// Remaining size below which the unwind is considered complete.
pub const UNWIND_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub exit_value: f64,
    pub average_exit_price: f64,
    pub unrealized_pnl: f64,
    pub pnl_percent: f64,
    /// Size the walked levels could not absorb.
    pub unfilled: f64,
}

impl Valuation {
    pub fn is_profitable(&self) -> bool {
        self.unrealized_pnl >= 0.0
    }
}

/// Value `position` against `levels`, which must be in priority order.
/// Level sizes count by magnitude; their sign is taken from the position.
pub fn value_position(position: &Position, levels: &[PriceLevel]) -> Valuation {
    let mut remaining = position.size;
    let mut exit_value = 0.0;

    for level in levels {
        if remaining.abs() < UNWIND_EPSILON {
            break;
        }
        let available = level.size.abs().copysign(remaining);
        let delta = if available.abs() < remaining.abs() { available } else { remaining };
        exit_value += delta * level.price;
        remaining -= delta;
    }

    if remaining.abs() >= UNWIND_EPSILON {
        trace!(symbol = %position.symbol, unfilled = remaining, "Book exhausted before position was unwound");
    }

    let base_value = position.base_value();
    let unrealized_pnl = exit_value - base_value;
    let average_exit_price = if position.size.abs() < UNWIND_EPSILON { 0.0 } else { exit_value / position.size };
    let pnl_percent = if base_value == 0.0 { 0.0 } else { unrealized_pnl / base_value.abs() * 100.0 };

    Valuation {
        exit_value,
        average_exit_price,
        unrealized_pnl,
        pnl_percent,
        unfilled: remaining.abs(),
    }
}

/// Value `position` against the same-sign side of `book`: longs walk the bids, shorts the asks.
pub fn value_against_book(position: &Position, book: &Book) -> Valuation {
    value_position(position, &book.sorted_view(position.side()))
}

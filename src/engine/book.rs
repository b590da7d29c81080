use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use tracing::{debug, instrument, trace, warn};

use crate::engine::types::{PriceLevel, Side};
use crate::market_data::adapters::BookDeltaEvent;

type PriceKey = OrderedFloat<f64>;

/// Aggregated price-level book for one pair.
///
/// Each side is a map keyed by price, so there is never more than one level per
/// price. Sorted views are derived from the maps on every read and are never
/// stored or patched independently.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Book {
    pub bids: BTreeMap<PriceKey, PriceLevel>,
    pub asks: BTreeMap<PriceKey, PriceLevel>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<PriceKey, PriceLevel> {
        match side {
            Side::BID => &mut self.bids,
            Side::ASK => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &BTreeMap<PriceKey, PriceLevel> {
        match side {
            Side::BID => &self.bids,
            Side::ASK => &self.asks,
        }
    }

    /// Upsert or remove the level at `price`. Last write wins; a zero order count removes.
    #[instrument(level = "trace", skip(self))]
    pub fn apply_delta(&mut self, side: Side, price: f64, size: f64, order_count: u32) {
        if !price.is_finite() || !size.is_finite() {
            warn!(?side, price, size, "Ignoring non-finite book delta");
            return;
        }

        let levels = self.side_mut(side);
        if order_count == 0 {
            if levels.remove(&OrderedFloat(price)).is_none() {
                trace!(?side, price, "Removal for unknown price level");
            }
        } else {
            levels.insert(OrderedFloat(price), PriceLevel { price, size, order_count });
        }
        debug!(?side, price, size, order_count, levels = levels.len(), "Applied book delta");
    }

    /// Apply a wire delta; the sign of the amount selects the side.
    pub fn apply(&mut self, delta: &BookDeltaEvent) -> Side {
        let side = Side::from_amount(delta.amount);
        self.apply_delta(side, delta.price, delta.amount, delta.count);
        side
    }

    /// All resting levels on `side`, best first: bids by descending price, asks ascending.
    pub fn sorted_view(&self, side: Side) -> Vec<PriceLevel> {
        match side {
            Side::BID => self.bids.values().rev().copied().collect(),
            Side::ASK => self.asks.values().copied().collect(),
        }
    }

    /// The best `limit` levels of `side`, each paired with the running total of absolute size.
    pub fn cumulative_depth(&self, side: Side, limit: usize) -> Vec<(PriceLevel, f64)> {
        let mut cumulative = 0.0;
        self.sorted_view(side)
            .into_iter()
            .take(limit)
            .map(|level| {
                cumulative += level.size.abs();
                (level, cumulative)
            })
            .collect()
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.values().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.values().next().copied()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn spread(&self) -> Option<f64> {
        let spread = Some(self.best_ask()?.price - self.best_bid()?.price);
        trace!(?spread, "Spread");
        spread
    }

    pub fn level_count(&self, side: Side) -> usize {
        self.side(side).len()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(levels: &[PriceLevel]) -> Vec<f64> {
        levels.iter().map(|l| l.price).collect()
    }

    #[test]
    fn test_initialise() {
        let book = Book::new();
        assert!(book.bids.is_empty());
        assert!(book.asks.is_empty());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
    }

    #[test]
    fn test_spread_needs_both_sides() {
        let mut book = Book::new();
        book.apply_delta(Side::BID, 99.5, 2.0, 1);
        assert_eq!(book.spread(), None);

        book.apply_delta(Side::ASK, 100.0, -1.0, 1);
        assert_eq!(book.spread(), Some(0.5));

        book.apply_delta(Side::BID, 99.5, 0.0, 0);
        assert_eq!(book.spread(), None);
    }

    #[test]
    fn test_sorted_view_ordering() {
        let mut book = Book::new();
        book.apply_delta(Side::BID, 99.0, 1.0, 1);
        book.apply_delta(Side::BID, 101.0, 2.0, 3);
        book.apply_delta(Side::BID, 100.0, 4.0, 2);
        book.apply_delta(Side::ASK, 105.0, -1.0, 1);
        book.apply_delta(Side::ASK, 103.0, -2.0, 1);

        assert_eq!(prices(&book.sorted_view(Side::BID)), vec![101.0, 100.0, 99.0]);
        assert_eq!(prices(&book.sorted_view(Side::ASK)), vec![103.0, 105.0]);
        assert_eq!(book.spread(), Some(2.0));
    }

    #[test]
    fn test_upsert_replaces_level() {
        let mut book = Book::new();
        book.apply_delta(Side::BID, 100.0, 1.0, 1);
        book.apply_delta(Side::BID, 100.0, 7.5, 4);

        let view = book.sorted_view(Side::BID);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0], PriceLevel { price: 100.0, size: 7.5, order_count: 4 });
    }

    #[test]
    fn test_zero_count_removes() {
        let mut book = Book::new();
        book.apply_delta(Side::ASK, 101.0, -3.0, 2);
        book.apply_delta(Side::ASK, 102.0, -1.0, 1);
        book.apply_delta(Side::ASK, 101.0, -1.0, 0);

        assert_eq!(prices(&book.sorted_view(Side::ASK)), vec![102.0]);

        // Unknown price removal is a no-op
        book.apply_delta(Side::ASK, 150.0, -1.0, 0);
        assert_eq!(book.level_count(Side::ASK), 1);
    }

    #[test]
    fn test_apply_wire_delta_uses_sign() {
        let mut book = Book::new();
        let side = book.apply(&BookDeltaEvent { price: 100.0, amount: 2.0, count: 1 });
        assert_eq!(side, Side::BID);
        let side = book.apply(&BookDeltaEvent { price: 101.0, amount: -2.0, count: 1 });
        assert_eq!(side, Side::ASK);
        assert_eq!(book.level_count(Side::BID), 1);
        assert_eq!(book.level_count(Side::ASK), 1);

        // Removal is routed by the sign of the placeholder amount
        book.apply(&BookDeltaEvent { price: 101.0, amount: -1.0, count: 0 });
        assert_eq!(book.level_count(Side::ASK), 0);
    }

    #[test]
    fn test_cumulative_depth() {
        let mut book = Book::new();
        book.apply_delta(Side::ASK, 101.0, -1.5, 1);
        book.apply_delta(Side::ASK, 102.0, -2.5, 2);
        book.apply_delta(Side::ASK, 103.0, -4.0, 3);

        let depth = book.cumulative_depth(Side::ASK, 2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0.price, 101.0);
        assert_eq!(depth[0].1, 1.5);
        assert_eq!(depth[1].1, 4.0);

        assert!(book.cumulative_depth(Side::BID, 10).is_empty());
    }

    #[test]
    fn test_non_finite_delta_ignored() {
        let mut book = Book::new();
        book.apply_delta(Side::BID, f64::NAN, 1.0, 1);
        book.apply_delta(Side::BID, 100.0, f64::INFINITY, 1);
        assert_eq!(book.level_count(Side::BID), 0);
    }
}

// Sliding window of trade flow, one bucket per column of the history chart
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRecord {
    pub bucket_start: Instant,
    pub buy_volume: f64,
    /// Accumulated sell amounts, negative like the wire amounts.
    pub sell_volume: f64,
}

impl HistoryRecord {
    pub fn empty(bucket_start: Instant) -> Self {
        Self { bucket_start, buy_volume: 0.0, sell_volume: 0.0 }
    }
}

/// Bar lengths for one bucket: `up` grows above the baseline, `down` (non-positive) below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub up: f64,
    pub down: f64,
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<HistoryRecord>,
}

impl HistoryBuffer {
    /// A full window of `capacity` empty buckets; the newest starts at `now`.
    pub fn new(capacity: usize, now: Instant) -> Self {
        let capacity = capacity.max(1);
        Self { records: std::iter::repeat(HistoryRecord::empty(now)).take(capacity).collect() }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    pub fn current(&self) -> &HistoryRecord {
        // The window is never empty
        &self.records[self.records.len() - 1]
    }

    fn current_mut(&mut self) -> &mut HistoryRecord {
        let last = self.records.len() - 1;
        &mut self.records[last]
    }

    pub fn record_trade(&mut self, amount: f64) {
        let bucket = self.current_mut();
        if amount > 0.0 {
            bucket.buy_volume += amount;
        } else {
            bucket.sell_volume += amount;
        }
    }

    /// Start a new bucket when the current one is older than `period`. Returns whether it rolled.
    pub fn advance_if_due(&mut self, now: Instant, period: Duration) -> bool {
        if now.saturating_duration_since(self.current().bucket_start) <= period {
            return false;
        }
        self.records.pop_front();
        self.records.push_back(HistoryRecord::empty(now));
        trace!(buckets = self.records.len(), "History bucket rolled");
        true
    }

    /// Largest single-direction volume across the window.
    pub fn peak(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.buy_volume.max(-r.sell_volume))
            .fold(0.0, f64::max)
    }

    /// Bars scaled so the peak bucket spans `half_height` rows; all zero when there is no flow.
    pub fn render_bars(&self, half_height: usize) -> Vec<Bar> {
        let peak = self.peak();
        if peak <= 0.0 || half_height == 0 {
            return vec![Bar { up: 0.0, down: 0.0 }; self.records.len()];
        }
        let scale = peak / half_height as f64;
        self.records
            .iter()
            .map(|r| Bar { up: r.buy_volume / scale, down: r.sell_volume / scale })
            .collect()
    }
}

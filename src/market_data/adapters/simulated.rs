// Random-walk market for demos and soak runs: no network, same channels as a live feed
use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::{
    AccountEvent, BookDeltaEvent, FeedAdapter, FeedChannels, FeedError, FeedEvent, OrderUpdate, PositionUpdate,
    TickerEvent, TradeEvent,
};

const TICK: f64 = 0.5;
const DEPTH: usize = 30;

pub struct SimulatedMarket {
    rng: StdRng,
    pair: String,
    mid: f64,
    position_size: f64,
    position_entry: f64,
    next_order_id: i64,
    open_orders: Vec<i64>,
    pending: VecDeque<FeedEvent>,
}

impl SimulatedMarket {
    pub fn new(pair: &str, mid_price: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mid = round_to_tick(mid_price);
        let mut market = Self {
            rng,
            pair: pair.to_string(),
            mid,
            position_size: 2.0,
            position_entry: round_to_tick(mid * 0.995),
            next_order_id: 1,
            open_orders: Vec::new(),
            pending: VecDeque::new(),
        };
        market.queue_snapshot();
        market
    }

    pub fn mid(&self) -> f64 {
        self.mid
    }

    // Full book, an open position and a couple of resting orders, like a venue's initial snapshot
    fn queue_snapshot(&mut self) {
        for i in 1..=DEPTH {
            let offset = i as f64 * TICK;
            let bid_size = self.rng.gen_range(0.1..5.0);
            let ask_size = self.rng.gen_range(0.1..5.0);
            let bid_count = self.rng.gen_range(1..6);
            let ask_count = self.rng.gen_range(1..6);
            self.pending.push_back(FeedEvent::Book(BookDeltaEvent { price: self.mid - offset, amount: bid_size, count: bid_count }));
            self.pending.push_back(FeedEvent::Book(BookDeltaEvent { price: self.mid + offset, amount: -ask_size, count: ask_count }));
        }
        let position = self.position_event("ps");
        self.pending.push_back(position);
        for _ in 0..2 {
            let order = self.new_order("os");
            self.pending.push_back(order);
        }
    }

    fn position_event(&self, status: &str) -> FeedEvent {
        FeedEvent::Account(AccountEvent::Position(PositionUpdate {
            symbol: self.pair.clone(),
            status: status.to_string(),
            amount: self.position_size,
            price: self.position_entry,
        }))
    }

    fn new_order(&mut self, status: &str) -> FeedEvent {
        let id = self.next_order_id;
        self.next_order_id += 1;
        self.open_orders.push(id);

        let buy = self.rng.gen_bool(0.5);
        let size = round_to_tick(self.rng.gen_range(0.5..3.0));
        let offset = self.rng.gen_range(2..DEPTH) as f64 * TICK;
        let price = if buy { self.mid - offset } else { self.mid + offset };
        FeedEvent::Account(AccountEvent::Order(OrderUpdate {
            order_id: id,
            symbol: self.pair.clone(),
            status: status.to_string(),
            order_type: "LIMIT".to_string(),
            orig_amount: if buy { size } else { -size },
            amount: if buy { size } else { -size },
            price,
            avg_price: 0.0,
        }))
    }

    fn book_delta(&mut self) -> FeedEvent {
        let bid = self.rng.gen_bool(0.5);
        let offset = self.rng.gen_range(1..=DEPTH) as f64 * TICK;
        let count = self.rng.gen_range(0..5);
        let size = if count == 0 { 1.0 } else { self.rng.gen_range(0.05..4.0) };
        let (price, amount) = if bid { (self.mid - offset, size) } else { (self.mid + offset, -size) };
        FeedEvent::Book(BookDeltaEvent { price, amount, count })
    }

    fn trade(&mut self) -> FeedEvent {
        self.mid = round_to_tick(self.mid + self.rng.gen_range(-1.0..1.0) * TICK);
        let amount = self.rng.gen_range(0.01..3.0);
        let amount = if self.rng.gen_bool(0.5) { amount } else { -amount };
        FeedEvent::Trade(TradeEvent { price: self.mid, amount })
    }

    fn ticker(&mut self) -> FeedEvent {
        FeedEvent::Ticker(TickerEvent {
            last_price: self.mid,
            bid: self.mid - TICK,
            bid_size: self.rng.gen_range(0.1..5.0),
            ask: self.mid + TICK,
            ask_size: self.rng.gen_range(0.1..5.0),
        })
    }

    fn account(&mut self) -> FeedEvent {
        let roll: f64 = self.rng.gen();
        if roll < 0.4 && !self.open_orders.is_empty() {
            let idx = self.rng.gen_range(0..self.open_orders.len());
            let id = self.open_orders.swap_remove(idx);
            FeedEvent::Account(AccountEvent::Order(OrderUpdate {
                order_id: id,
                symbol: self.pair.clone(),
                status: "oc".to_string(),
                order_type: "LIMIT".to_string(),
                orig_amount: 0.0,
                amount: 0.0,
                price: 0.0,
                avg_price: 0.0,
            }))
        } else if roll < 0.8 {
            self.new_order("on")
        } else {
            self.position_size = round_to_tick((self.position_size + self.rng.gen_range(-0.5..0.5)).max(TICK));
            self.position_event("pu")
        }
    }

    pub fn next_event(&mut self) -> FeedEvent {
        if let Some(event) = self.pending.pop_front() {
            return event;
        }
        let roll: f64 = self.rng.gen();
        if roll < 0.55 {
            self.book_delta()
        } else if roll < 0.85 {
            self.trade()
        } else if roll < 0.97 {
            self.ticker()
        } else {
            self.account()
        }
    }
}

fn round_to_tick(x: f64) -> f64 {
    (x / TICK).round() * TICK
}

pub struct SimulatedAdapter {
    pub pair: String,
    pub mid_price: f64,
    pub seed: Option<u64>,
    pub pace: Duration,
}

#[async_trait::async_trait]
impl FeedAdapter for SimulatedAdapter {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn spawn(&self, tx: FeedChannels) -> Result<(), FeedError> {
        info!(pair = %self.pair, mid = self.mid_price, "Starting simulated feed");
        let mut market = SimulatedMarket::new(&self.pair, self.mid_price, self.seed);
        loop {
            tx.route(market.next_event()).await?;
            if !self.pace.is_zero() {
                tokio::time::sleep(self.pace).await;
            }
        }
    }
}

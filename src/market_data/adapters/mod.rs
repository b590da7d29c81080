// Shared trait + events for feed sources
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{FeedMode, Settings};
use crate::engine::types::{Order, OrderStatus, Position, PositionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickerEvent {
    pub last_price: f64,
    pub bid: f64,
    pub bid_size: f64,
    pub ask: f64,
    pub ask_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub price: f64,
    pub amount: f64, // negative = sell
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookDeltaEvent {
    pub price: f64,
    pub amount: f64, // sign encodes side
    pub count: u32,  // 0 = remove level
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub symbol: String,
    pub status: String,
    pub amount: f64,
    pub price: f64,
}

impl PositionUpdate {
    pub fn status(&self) -> PositionStatus {
        PositionStatus::parse(&self.status)
    }

    pub fn to_position(&self) -> Position {
        Position {
            symbol: self.symbol.clone(),
            size: self.amount,
            entry_price: self.price,
            status: self.status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: i64,
    #[serde(default)]
    pub symbol: String,
    pub status: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub orig_amount: f64,
    pub amount: f64,
    pub price: f64,
    #[serde(default)]
    pub avg_price: f64,
}

impl OrderUpdate {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::parse(&self.status)
    }

    pub fn to_order(&self) -> Order {
        Order {
            id: self.order_id,
            symbol: self.symbol.clone(),
            order_type: self.order_type.clone(),
            orig_size: self.orig_amount,
            remaining_size: self.amount,
            price: self.price,
            avg_price: self.avg_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountEvent {
    Position(PositionUpdate),
    Order(OrderUpdate),
}

/// One event from a source, tagged with the logical channel it travels on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum FeedEvent {
    Ticker(TickerEvent),
    Trade(TradeEvent),
    Book(BookDeltaEvent),
    Account(AccountEvent),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed file {0} does not exist")]
    Missing(PathBuf),
    #[error("feed I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("dashboard stopped listening on the {0} channel")]
    Closed(&'static str),
}

/// Sending half of the four logical channels.
#[derive(Debug, Clone)]
pub struct FeedChannels {
    pub ticker: mpsc::Sender<TickerEvent>,
    pub trades: mpsc::Sender<TradeEvent>,
    pub book: mpsc::Sender<BookDeltaEvent>,
    pub account: mpsc::Sender<AccountEvent>,
}

#[derive(Debug)]
pub struct FeedReceivers {
    pub ticker: mpsc::Receiver<TickerEvent>,
    pub trades: mpsc::Receiver<TradeEvent>,
    pub book: mpsc::Receiver<BookDeltaEvent>,
    pub account: mpsc::Receiver<AccountEvent>,
}

pub fn feed_channels(capacity: usize) -> (FeedChannels, FeedReceivers) {
    let (ticker_tx, ticker_rx) = mpsc::channel(capacity);
    let (trades_tx, trades_rx) = mpsc::channel(capacity);
    let (book_tx, book_rx) = mpsc::channel(capacity);
    let (account_tx, account_rx) = mpsc::channel(capacity);
    (
        FeedChannels { ticker: ticker_tx, trades: trades_tx, book: book_tx, account: account_tx },
        FeedReceivers { ticker: ticker_rx, trades: trades_rx, book: book_rx, account: account_rx },
    )
}

impl FeedChannels {
    /// Deliver `event` on its channel, waiting for room if the dashboard is behind.
    pub async fn route(&self, event: FeedEvent) -> Result<(), FeedError> {
        match event {
            FeedEvent::Ticker(e) => self.ticker.send(e).await.map_err(|_| FeedError::Closed("ticker")),
            FeedEvent::Trade(e) => self.trades.send(e).await.map_err(|_| FeedError::Closed("trades")),
            FeedEvent::Book(e) => self.book.send(e).await.map_err(|_| FeedError::Closed("book")),
            FeedEvent::Account(e) => self.account.send(e).await.map_err(|_| FeedError::Closed("account")),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedAdapter: Send + Sync {
    fn name(&self) -> &str;

    // Push events into the channels until the source is exhausted or the dashboard goes away.
    async fn spawn(&self, tx: FeedChannels) -> Result<(), FeedError>;
}

pub mod replay;
pub mod simulated;

/// Build the source selected by `settings.feed`.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn FeedAdapter>, FeedError> {
    let feed = &settings.feed;
    match feed.mode {
        FeedMode::Simulated => Ok(Box::new(simulated::SimulatedAdapter {
            pair: settings.pair.clone(),
            mid_price: feed.mid_price,
            seed: feed.seed,
            pace: feed.pace(),
        })),
        FeedMode::Replay => {
            let path = feed.path.clone().unwrap_or_default();
            Ok(Box::new(replay::ReplayAdapter::open(&path, feed.pace())?))
        }
    }
}

//! Drives the dashboard through the recorded demo session and inspects the off-screen panels.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::style::{Color, Modifier};

use lobx_dash::config::Settings;
use lobx_dash::engine::types::Side;
use lobx_dash::market_data::adapters::replay::parse_line;
use lobx_dash::market_data::adapters::FeedEvent;
use lobx_dash::ui::dashboard::Dashboard;

fn session() -> Vec<FeedEvent> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/session.jsonl");
    let text = std::fs::read_to_string(&path).expect("demo session");
    text.lines().filter_map(|line| parse_line(line).expect("well-formed line")).collect()
}

fn replay(dashboard: &mut Dashboard, events: &[FeedEvent], now: Instant) {
    for event in events {
        match event {
            FeedEvent::Ticker(ticker) => dashboard.on_ticker(ticker),
            FeedEvent::Trade(trade) => dashboard.on_trade(trade, now),
            FeedEvent::Book(delta) => dashboard.on_book(delta),
            FeedEvent::Account(account) => dashboard.on_account(account),
        }
    }
}

fn settings() -> Settings {
    Settings { order_book_len: 5, ..Settings::default() }
}

#[test]
fn test_session_parses() {
    let events = session();
    assert_eq!(events.len(), 18);
    assert!(matches!(events[0], FeedEvent::Book(_)));
}

#[test]
fn test_session_end_state() {
    let now = Instant::now();
    let mut dashboard = Dashboard::new(&settings(), now);
    replay(&mut dashboard, &session(), now);

    // Book: the 30000 bid was pulled
    let book = dashboard.book();
    assert_eq!(book.best_bid().map(|l| l.price), Some(29999.5));
    assert_eq!(book.best_ask().map(|l| l.price), Some(30000.5));
    assert_eq!(book.level_count(Side::BID), 2);
    assert_eq!(book.level_count(Side::ASK), 3);

    let bids = dashboard.book_panel(Side::BID);
    assert!(bids.line(1).contains("4.00 @ 29999.50"));
    assert!(bids.line(2).contains("12.50 @ 29999.00"));
    assert!(bids.style_at(2, 2).add_modifier.contains(Modifier::BOLD));
    assert!(!bids.style_at(2, 1).add_modifier.contains(Modifier::BOLD));
    assert!(!bids.line(3).contains('@'));

    let asks = dashboard.book_panel(Side::ASK);
    assert!(asks.line(1).starts_with("│ 0.75     30000.50 @ 0.75"));
    assert!(asks.line(3).contains("18.95"));

    let ticker = dashboard.ticker_panel().line(0);
    assert!(ticker.starts_with("Last: 29999.50"));
    assert!(ticker.contains("Spread: 1.00"));

    // Trades: newest at the bottom of a five-row panel
    let trades = dashboard.trades_panel();
    assert!(trades.line(5).contains("BUY    2.60 @ 29999.50"));
    assert!(trades.line(4).contains("SELL   0.30 @ 29999.50"));
    assert!(trades.line(1).trim_matches(|c| c == '│' || c == ' ').is_empty());
    assert_eq!(trades.style_at(2, 5).fg, Some(Color::Green));
    assert_eq!(trades.style_at(2, 4).fg, Some(Color::Red));
}

#[test]
fn test_session_account_state() {
    let now = Instant::now();
    let mut dashboard = Dashboard::new(&settings(), now);
    replay(&mut dashboard, &session(), now);

    // Long 2.5 @ 29880 unwinds into the 29999.5 bid
    let position = dashboard.positions().get("BTCUSD").expect("open position");
    assert_eq!(position.size, 2.5);
    let row = dashboard.positions_table().panel().line(2);
    assert!(row.contains("ACTIVE"));
    assert!(row.contains("29999.50"));
    assert!(row.contains("298.75"));

    // Order 101 filled and left; 102 moved up into the first slot
    assert_eq!(dashboard.orders().len(), 1);
    assert_eq!(dashboard.orders_table().display_index(&102), Some(0));
    let row = dashboard.orders_table().panel().line(2);
    assert!(row.contains("-1.00"));
    assert!(row.contains("30010.00"));
    assert!(!dashboard.orders_table().panel().line(3).contains("LIMIT"));
}

#[test]
fn test_session_history() {
    let start = Instant::now();
    let mut dashboard = Dashboard::new(&settings(), start);
    replay(&mut dashboard, &session(), start);

    let history = dashboard.history().expect("history enabled");
    assert!((history.current().buy_volume - 3.0).abs() < 1e-9);
    assert!((history.current().sell_volume + 2.1).abs() < 1e-9);

    let info = dashboard.history_panel().expect("history panel").line(0);
    assert!(info.contains("buy 3.00"));
    assert!(info.contains("sell -2.10"));

    // Rolling the window starts an empty bucket
    dashboard.tick(start + Duration::from_secs(11));
    let history = dashboard.history().expect("history enabled");
    assert_eq!(history.current().buy_volume, 0.0);
    assert!(dashboard.history_panel().expect("history panel").line(0).contains("buy 0.00"));
}

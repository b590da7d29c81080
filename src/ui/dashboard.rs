//! Dashboard state and layout.
//!
//! [`Dashboard`] owns every piece of mutable display state: the book, the
//! account maps, the trade history and the panels they are drawn into. Each
//! `on_*` handler applies one event and redraws only what it touched; the
//! caller commits the panels afterwards.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ahash::AHashMap as HashMap;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::engine::book::Book;
use crate::engine::history::HistoryBuffer;
use crate::engine::types::{Order, Position, Side};
use crate::engine::valuation::value_against_book;
use crate::market_data::adapters::{AccountEvent, BookDeltaEvent, OrderUpdate, PositionUpdate, TickerEvent, TradeEvent};
use crate::ui::format::{CellValue, Column, FormatKind};
use crate::ui::surface::{Panel, Surface};
use crate::ui::table::{Table, TableError};

pub const BOOK_WIDTH: u16 = 31;
pub const TRADES_WIDTH: u16 = 25;
pub const SCREEN_WIDTH: u16 = 87;

const HISTORY_REDRAW_INTERVAL: Duration = Duration::from_secs(1);
const SPREAD_COL: u16 = 62;
// Columns of the positions table that carry the P/L colour
const PNL_COLUMNS: [usize; 3] = [3, 4, 5];

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn fg(color: Color) -> Style {
    Style::default().fg(color)
}

fn screen_rows(n: usize) -> u16 {
    n.min(1000) as u16
}

fn report(result: Result<impl Sized, TableError>) {
    if let Err(e) = result {
        error!(error = %e, "Table contract violation");
    }
}

struct HistoryView {
    buffer: HistoryBuffer,
    panel: Panel,
    last_drawn: Option<Instant>,
}

pub struct Dashboard {
    settings: Settings,
    book: Book,
    positions: HashMap<String, Position>,
    orders: HashMap<i64, Order>,
    last_trades: VecDeque<TradeEvent>,
    history: Option<HistoryView>,
    ticker_panel: Panel,
    bid_panel: Panel,
    ask_panel: Panel,
    trades_panel: Panel,
    positions_table: Table<String>,
    orders_table: Table<i64>,
}

impl Dashboard {
    pub fn new(settings: &Settings, now: Instant) -> Self {
        let mut y = 0;
        let mut ticker_panel = Panel::new(Rect::new(0, y, SCREEN_WIDTH, 1), false, "");
        let pair_col = SCREEN_WIDTH.saturating_sub(settings.pair.chars().count() as u16);
        ticker_panel.write_cell(pair_col, 0, &settings.pair, bold());
        y += 1;

        let book_height = screen_rows(settings.order_book_len) + 2;
        let bid_panel = Panel::new(Rect::new(0, y, BOOK_WIDTH, book_height), true, "Bid");
        let ask_panel = Panel::new(Rect::new(BOOK_WIDTH, y, BOOK_WIDTH, book_height), true, "Ask");
        let trades_panel = Panel::new(Rect::new(2 * BOOK_WIDTH, y, TRADES_WIDTH, book_height), true, "Last trades");
        y += book_height;

        let history = if settings.history_height > 0 {
            let height = screen_rows(settings.history_height);
            let view = HistoryView {
                buffer: HistoryBuffer::new(SCREEN_WIDTH as usize, now),
                panel: Panel::new(Rect::new(0, y, SCREEN_WIDTH, height), false, ""),
                last_drawn: None,
            };
            y += height;
            Some(view)
        } else {
            None
        };

        let positions_height = screen_rows(settings.positions_len) + 3;
        let positions_table = Table::new(
            Rect::new(0, y, SCREEN_WIDTH, positions_height),
            "Positions",
            vec![
                Column::new("Status", -13, FormatKind::Str, Style::default()),
                Column::fixed2("Amount", -6, bold()),
                Column::fixed2("Base price", -10, bold()),
                Column::fixed2("Curr.price", -8, bold()),
                Column::fixed2("P/L", -9, bold()),
                Column::fixed2("P/L %", -6, bold()),
            ],
        );
        y += positions_height;

        let orders_table = Table::new(
            Rect::new(0, y, SCREEN_WIDTH, screen_rows(settings.orders_len) + 3),
            "Orders",
            vec![
                Column::new("Type", -8, FormatKind::Str, Style::default()),
                Column::fixed2("Orig.Amount", -6, bold()),
                Column::fixed2("Amount", -6, bold()),
                Column::fixed2("Price", -8, bold()),
                Column::fixed2("Avg.Price", -8, bold()),
            ],
        );

        let mut dashboard = Self {
            settings: settings.clone(),
            book: Book::new(),
            positions: HashMap::new(),
            orders: HashMap::new(),
            last_trades: VecDeque::with_capacity(settings.order_book_len),
            history,
            ticker_panel,
            bid_panel,
            ask_panel,
            trades_panel,
            positions_table,
            orders_table,
        };
        dashboard.refresh_history(now);
        dashboard
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn orders(&self) -> &HashMap<i64, Order> {
        &self.orders
    }

    pub fn history(&self) -> Option<&HistoryBuffer> {
        self.history.as_ref().map(|view| &view.buffer)
    }

    pub fn positions_table(&self) -> &Table<String> {
        &self.positions_table
    }

    pub fn orders_table(&self) -> &Table<i64> {
        &self.orders_table
    }

    pub fn ticker_panel(&self) -> &Panel {
        &self.ticker_panel
    }

    pub fn book_panel(&self, side: Side) -> &Panel {
        match side {
            Side::BID => &self.bid_panel,
            Side::ASK => &self.ask_panel,
        }
    }

    pub fn trades_panel(&self) -> &Panel {
        &self.trades_panel
    }

    pub fn history_panel(&self) -> Option<&Panel> {
        self.history.as_ref().map(|view| &view.panel)
    }

    /// Every panel in drawing order.
    pub fn panels(&self) -> Vec<&Panel> {
        let mut panels = vec![&self.ticker_panel, &self.bid_panel, &self.ask_panel, &self.trades_panel];
        if let Some(view) = &self.history {
            panels.push(&view.panel);
        }
        panels.push(self.positions_table.panel());
        panels.push(self.orders_table.panel());
        panels
    }

    pub fn on_ticker(&mut self, ticker: &TickerEvent) {
        metrics::counter!("lobx_dash_events_total", "kind" => "ticker").increment(1);
        debug!(last = ticker.last_price, bid = ticker.bid, ask = ticker.ask, "Ticker");

        self.ticker_panel.write_cell(0, 0, &format!("Last: {:<8.2}", ticker.last_price), fg(Color::Blue).add_modifier(Modifier::BOLD));
        self.ticker_panel.write_cell(16, 0, &format!("Bid: {:6.2} @ {:<8.2}", ticker.bid_size, ticker.bid), fg(Color::Red));
        self.ticker_panel.write_cell(39, 0, &format!("Ask: {:6.2} @ {:<8.2}", ticker.ask_size, ticker.ask), fg(Color::Green));
    }

    pub fn on_trade(&mut self, trade: &TradeEvent, now: Instant) {
        metrics::counter!("lobx_dash_events_total", "kind" => "trade").increment(1);
        debug!(price = trade.price, amount = trade.amount, "Trade");

        if self.last_trades.len() == self.settings.order_book_len {
            self.last_trades.pop_front();
        }
        self.last_trades.push_back(*trade);
        self.draw_trades();

        if let Some(view) = self.history.as_mut() {
            view.buffer.record_trade(trade.amount);
        }
        self.refresh_history(now);
    }

    pub fn on_book(&mut self, delta: &BookDeltaEvent) {
        metrics::counter!("lobx_dash_events_total", "kind" => "book").increment(1);

        let side = self.book.apply(delta);
        let label = if side == Side::BID { "bid" } else { "ask" };
        metrics::gauge!("lobx_dash_book_levels", "side" => label).set(self.book.level_count(side) as f64);

        self.draw_book(side);
        self.draw_spread();
        self.update_positions();
    }

    pub fn on_account(&mut self, event: &AccountEvent) {
        metrics::counter!("lobx_dash_events_total", "kind" => "account").increment(1);
        match event {
            AccountEvent::Position(update) => self.on_position(update),
            AccountEvent::Order(update) => self.on_order(update),
        }
        metrics::gauge!("lobx_dash_open_positions").set(self.positions.len() as f64);
        metrics::gauge!("lobx_dash_open_orders").set(self.orders.len() as f64);
    }

    /// Periodic housekeeping: roll the history window and keep its chart fresh.
    pub fn tick(&mut self, now: Instant) {
        let period = self.settings.history_period();
        if let Some(view) = self.history.as_mut() {
            view.buffer.advance_if_due(now, period);
        }
        self.refresh_history(now);
    }

    fn on_position(&mut self, update: &PositionUpdate) {
        debug!(symbol = %update.symbol, status = %update.status, amount = update.amount, price = update.price, "Position update");
        if update.status().is_closed() {
            if self.positions.remove(&update.symbol).is_some() {
                report(self.positions_table.delete_row(&update.symbol));
            } else {
                warn!(symbol = %update.symbol, "Close for unknown position");
            }
            return;
        }
        self.positions.insert(update.symbol.clone(), update.to_position());
        self.update_positions();
    }

    fn on_order(&mut self, update: &OrderUpdate) {
        debug!(id = update.order_id, status = %update.status, amount = update.amount, price = update.price, "Order update");
        if update.status().is_closed() {
            if self.orders.remove(&update.order_id).is_some() {
                report(self.orders_table.delete_row(&update.order_id));
            } else {
                warn!(id = update.order_id, "Close for unknown order");
            }
            return;
        }

        let order = update.to_order();
        let values = vec![
            CellValue::from(order.order_type.as_str()),
            CellValue::from(order.orig_size),
            CellValue::from(order.remaining_size),
            CellValue::from(order.price),
            CellValue::from(order.avg_price),
        ];
        report(self.orders_table.upsert_row(order.id, values));
        self.orders.insert(order.id, order);
    }

    // Re-value every open position against the current book
    fn update_positions(&mut self) {
        for position in self.positions.values() {
            let valuation = value_against_book(position, &self.book);
            let colour = if valuation.is_profitable() { Color::Green } else { Color::Red };
            let pnl_style = bold().fg(colour);

            let values = vec![
                CellValue::from(position.status.to_string()),
                CellValue::from(position.size),
                CellValue::from(position.entry_price),
                CellValue::from(valuation.average_exit_price),
                CellValue::from(valuation.unrealized_pnl),
                CellValue::from(valuation.pnl_percent),
            ];
            report(self.positions_table.upsert_row(position.symbol.clone(), values));
            for column in PNL_COLUMNS {
                report(self.positions_table.set_cell_style(&position.symbol, column, pnl_style));
            }
        }
    }

    fn draw_book(&mut self, side: Side) {
        let depth = self.book.cumulative_depth(side, self.settings.order_book_len);
        let highlight = self.settings.highlight_order_book_over;
        let panel = match side {
            Side::BID => &mut self.bid_panel,
            Side::ASK => &mut self.ask_panel,
        };

        panel.clear_region();
        for (n, (level, cumulative)) in depth.iter().enumerate() {
            let amount = level.size.abs();
            let style = if amount > highlight { bold() } else { Style::default() };
            let text = match side {
                Side::BID => format!("{:2} {:6.2} @ {:<6.2} {:8.2}", level.order_count, amount, level.price, cumulative),
                Side::ASK => format!("{:<8.2} {:6.2} @ {:<6.2} {:<2}", cumulative, level.price, amount, level.order_count),
            };
            panel.write_cell(2, 1 + n as u16, &text, style);
        }
    }

    fn draw_spread(&mut self) {
        let text = match self.book.spread() {
            Some(spread) => format!("Spread: {:<8.2}", spread),
            None => format!("Spread: {:<8}", "-"),
        };
        self.ticker_panel.write_cell(SPREAD_COL, 0, &text, Style::default().add_modifier(Modifier::DIM));
    }

    fn draw_trades(&mut self) {
        let offset = self.settings.order_book_len.saturating_sub(self.last_trades.len());
        let highlight = self.settings.highlight_trades_over;

        for (n, trade) in self.last_trades.iter().enumerate() {
            let (direction, colour) = if trade.amount < 0.0 { ("SELL", Color::Red) } else { ("BUY", Color::Green) };
            let weight = if trade.amount.abs() > highlight { Modifier::BOLD } else { Modifier::DIM };
            let style = fg(colour).add_modifier(weight);
            let text = format!("{:<4} {:6.2} @ {:<8.2}", direction, trade.amount.abs(), trade.price);
            self.trades_panel.write_cell(2, 1 + (offset + n) as u16, &text, style);
        }
    }

    // Bars are redrawn at most once per HISTORY_REDRAW_INTERVAL; the info line every time
    fn refresh_history(&mut self, now: Instant) {
        let period = self.settings.history_record_period;
        let Some(view) = self.history.as_mut() else { return };

        let due = view
            .last_drawn
            .map_or(true, |drawn| now.saturating_duration_since(drawn) >= HISTORY_REDRAW_INTERVAL);
        if due {
            let half = view.panel.height() as usize / 2;
            let baseline = half as i32;
            view.panel.clear_region();
            for (n, bar) in view.buffer.render_bars(half).iter().enumerate() {
                draw_bar(&mut view.panel, n as u16, baseline - 1, bar.up, fg(Color::Green));
                draw_bar(&mut view.panel, n as u16, baseline, bar.down, fg(Color::Red));
            }
            view.last_drawn = Some(now);
        }

        let current = view.buffer.current();
        let info = format!("Last {} sec: buy {:<6.2}, sell {:<6.2}", period, current.buy_volume, current.sell_volume);
        view.panel.write_cell(0, 0, &info, Style::default());
    }
}

/// One column of `*` per whole unit of `height` away from `baseline`, capped with `|` for a remainder.
/// Positive heights grow up the screen, negative ones down.
fn draw_bar(panel: &mut Panel, col: u16, baseline: i32, height: f64, style: Style) {
    let whole = height.trunc() as i32;
    let step = if whole < 0 { -1 } else { 1 };

    let mut put = |row: i32, glyph: &str| {
        if row >= 0 {
            panel.write_cell(col, row as u16, glyph, style);
        }
    };

    let mut i = 0;
    while i != whole {
        put(baseline - i, "*");
        i += step;
    }
    if height.abs() > whole.unsigned_abs() as f64 {
        put(baseline - whole, "|");
    }
}

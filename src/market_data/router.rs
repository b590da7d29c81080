// Router: feed source -> channels -> dashboard -> screen
use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Settings;
use crate::market_data::adapters::{feed_channels, FeedAdapter};
use crate::ui::dashboard::Dashboard;
use crate::ui::surface::Screen;
use crate::ui::terminal::Control;

const CHANNEL_CAPACITY: usize = 1024;
const CLOCK_TICK: Duration = Duration::from_millis(250);

/// Run the dashboard until the operator quits or the source fails.
///
/// One event is applied per loop iteration, then every panel is committed to `screen`.
/// A source that simply runs out (end of a replay) leaves the last state on screen.
pub async fn run<S: Screen>(
    settings: &Settings,
    adapter: Box<dyn FeedAdapter>,
    screen: &mut S,
    mut controls: mpsc::Receiver<Control>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = feed_channels(CHANNEL_CAPACITY);
    let source_name = adapter.name().to_string();
    info!(source = %source_name, pair = %settings.pair, "Starting dashboard");

    let mut source = tokio::spawn(async move { adapter.spawn(tx).await });
    let mut source_done = false;
    let mut controls_closed = false;

    let mut dashboard = Dashboard::new(settings, Instant::now());
    screen.commit(&dashboard.panels()).context("initial draw failed")?;

    let mut clock = interval(CLOCK_TICK);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            Some(ticker) = rx.ticker.recv() => dashboard.on_ticker(&ticker),
            Some(trade) = rx.trades.recv() => dashboard.on_trade(&trade, Instant::now()),
            Some(delta) = rx.book.recv() => dashboard.on_book(&delta),
            Some(event) = rx.account.recv() => dashboard.on_account(&event),
            joined = &mut source, if !source_done => {
                source_done = true;
                match joined {
                    Ok(Ok(())) => info!(source = %source_name, "Feed source finished"),
                    Ok(Err(e)) => break Err(anyhow::Error::new(e).context(format!("{} feed failed", source_name))),
                    Err(e) => break Err(anyhow::Error::new(e).context(format!("{} feed task aborted", source_name))),
                }
            }
            _ = clock.tick() => {}
            control = controls.recv(), if !controls_closed => {
                match control {
                    Some(Control::Quit) => {
                        info!("Quit requested");
                        break Ok(());
                    }
                    // Keyboard gone; keep displaying until Ctrl-C or a source error
                    None => {
                        warn!("Control channel closed, quit keys disabled");
                        controls_closed = true;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break Ok(());
            }
        }

        dashboard.tick(Instant::now());
        if let Err(e) = screen.commit(&dashboard.panels()) {
            break Err(anyhow::Error::new(e).context("screen commit failed"));
        }
    };

    if !source_done {
        source.abort();
    }
    info!(ok = result.is_ok(), "Dashboard stopped");
    result
}

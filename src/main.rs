use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use lobx_dash::config::Settings;
use lobx_dash::market_data::{adapters, router};
use lobx_dash::telemetry;
use lobx_dash::ui::terminal::{install_panic_hook, spawn_input_reader, TerminalScreen};

/// Terminal market monitor: order book, trades, trade-flow history and account positions.
#[derive(Parser, Debug)]
#[command(name = "lobx-dash", version, about)]
struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    telemetry::init_tracing(&settings.log_filter, settings.log_file.as_deref())?;
    telemetry::init_metrics(settings.metrics_port)?;
    info!(config = %cli.config.display(), ?settings, "Configuration loaded");

    // Fail before touching the terminal if the source is unusable
    let adapter = adapters::from_settings(&settings).context("feed source unavailable")?;

    install_panic_hook();
    let mut screen = TerminalScreen::enter().context("terminal unavailable")?;
    let (controls_tx, controls_rx) = mpsc::channel(8);
    let _input = spawn_input_reader(controls_tx);

    let result = router::run(&settings, adapter, &mut screen, controls_rx).await;
    drop(screen);
    result
}

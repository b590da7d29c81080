use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. The dashboard owns the terminal, so events only go to `log_file`;
/// without one, logging stays off.
pub fn init_tracing(default_filter: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing already initialised: {}", e))?;
    Ok(())
}

#[cfg(feature = "metrics-exporter")]
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("prometheus exporter install")?;

    tracing::info!(port, "Prometheus exporter listening");
    metrics::gauge!("lobx_dash_up").set(1.0);
    Ok(())
}

#[cfg(not(feature = "metrics-exporter"))]
pub fn init_metrics(_port: u16) -> anyhow::Result<()> {
    Ok(())
}

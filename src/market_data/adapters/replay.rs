// Replays a recorded JSON-lines feed, one event per line
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::{FeedAdapter, FeedChannels, FeedError, FeedEvent};

pub struct ReplayAdapter {
    pub path: PathBuf,
    pub pace: Duration, // pause between events, zero = as fast as the dashboard consumes
}

impl ReplayAdapter {
    pub fn open(path: &Path, pace: Duration) -> Result<Self, FeedError> {
        if !path.is_file() {
            return Err(FeedError::Missing(path.to_path_buf()));
        }
        Ok(Self { path: path.to_path_buf(), pace })
    }
}

/// Parse one feed line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<FeedEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

#[async_trait::async_trait]
impl FeedAdapter for ReplayAdapter {
    fn name(&self) -> &str {
        "replay"
    }

    async fn spawn(&self, tx: FeedChannels) -> Result<(), FeedError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        info!(path = %self.path.display(), "Replaying feed");

        let mut line_no = 0usize;
        let mut delivered = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let event = match parse_line(&line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping malformed feed line");
                    continue;
                }
            };

            tx.route(event).await?;
            delivered += 1;
            if !self.pace.is_zero() {
                tokio::time::sleep(self.pace).await;
            }
        }

        debug!(lines = line_no, delivered, "Replay finished");
        Ok(())
    }
}

// Market data module entrypoint
pub mod adapters; // feed sources (replay, simulated) and the channel router
pub mod router;   // drives the dashboard from the feed channels

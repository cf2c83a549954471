//! Position sink: stores computed positions and serves them back as the
//! previous positions of the next cycle.

use fillsplit::{FinalPosition, PreviousPositionSnapshot};
use rustc_hash::FxHashMap;

/// Where computed positions go, and where previous positions come from.
pub trait PositionSink {
    /// Record the newest position for its ticker, replacing any older one.
    fn store(&mut self, position: &FinalPosition);

    /// Latest recorded position for `ticker`, or `None` before its first trade.
    fn previous(&self, ticker: &str) -> Option<PreviousPositionSnapshot>;
}

/// Keeps the latest position per ticker in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    latest: FxHashMap<String, PreviousPositionSnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickers with a recorded position, sorted.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.latest.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }
}

impl PositionSink for MemorySink {
    fn store(&mut self, position: &FinalPosition) {
        self.latest
            .insert(position.ticker().to_string(), position.to_previous());
    }

    fn previous(&self, ticker: &str) -> Option<PreviousPositionSnapshot> {
        self.latest.get(ticker).cloned()
    }
}

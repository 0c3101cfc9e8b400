use crate::structs::Trade;

/// An in-memory trade log with a version counter.
///
/// Every mutation bumps `version`, so consumers can key derived data on it and
/// know it is stale as soon as the log changes.
#[derive(Debug, Clone, Default)]
pub struct TradeLog {
    trades: Vec<Trade>,
    version: u64,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn push(&mut self, trade: Trade) {
        self.trades.push(trade);
        self.version += 1;
    }

    pub fn extend(&mut self, trades: impl IntoIterator<Item = Trade>) {
        self.trades.extend(trades);
        self.version += 1;
    }

    /// Keeps only the trades matching `keep`. The version is bumped only if
    /// something was removed.
    pub fn retain(&mut self, keep: impl FnMut(&Trade) -> bool) {
        let before = self.trades.len();
        self.trades.retain(keep);
        if self.trades.len() != before {
            self.version += 1;
        }
    }

    pub fn clear(&mut self) {
        if !self.trades.is_empty() {
            self.trades.clear();
            self.version += 1;
        }
    }
}

impl From<Vec<Trade>> for TradeLog {
    fn from(trades: Vec<Trade>) -> Self {
        Self { trades, version: 1 }
    }
}

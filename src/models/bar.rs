use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Ordered price/volume history for one ticker, owned by the caller for the
/// duration of a single analysis.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceSeries {
    pub ticker: String,
    pub fetched_at: Option<DateTime<Utc>>,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            ticker: ticker.into(),
            fetched_at: Some(Utc::now()),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.bars.len().saturating_sub(n);
        PriceSeries {
            ticker: self.ticker.clone(),
            fetched_at: self.fetched_at,
            bars: self.bars[start..].to_vec(),
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> PriceSeries {
        let s = start.min(self.bars.len());
        let e = end.min(self.bars.len());
        PriceSeries {
            ticker: self.ticker.clone(),
            fetched_at: self.fetched_at,
            bars: self.bars[s..e].to_vec(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceBar> {
        self.bars.iter()
    }

    pub fn as_slice(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs_max(&self) -> f64 {
        self.bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn lows_min(&self) -> f64 {
        self.bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min)
    }

    /// Index of the bar with the highest finite close; last wins on ties.
    pub fn close_idx_max(&self) -> Option<usize> {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.close.is_finite())
            .max_by(|(_, a), (_, b)| a.close.total_cmp(&b.close))
            .map(|(i, _)| i)
    }

    /// Simple moving average of closes over the last `window` bars.
    /// Returns None when there is not enough history.
    pub fn sma(&self, window: usize) -> Option<f64> {
        if window == 0 || self.bars.len() < window {
            return None;
        }
        let sum: f64 = self.bars[self.bars.len() - window..]
            .iter()
            .map(|b| b.close)
            .sum();
        Some(sum / window as f64)
    }

    /// Rolling average volume over the last `window` bars ending at `end`
    /// (exclusive). Returns None when the window does not fit.
    pub fn avg_volume(&self, end: usize, window: usize) -> Option<f64> {
        if window == 0 || end > self.bars.len() || end < window {
            return None;
        }
        let sum: f64 = self.bars[end - window..end].iter().map(|b| b.volume).sum();
        Some(sum / window as f64)
    }

    pub fn push(&mut self, bar: PriceBar) {
        self.bars.push(bar);
    }
}

impl std::ops::Index<usize> for PriceSeries {
    type Output = PriceBar;
    fn index(&self, index: usize) -> &Self::Output {
        &self.bars[index]
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PriceBar;
    type IntoIter = std::slice::Iter<'a, PriceBar>;
    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Bull,
    Bear,
    Uncertain,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Bull => write!(f, "bull"),
            Regime::Bear => write!(f, "bear"),
            Regime::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// Market-wide state, computed once per batch and shared read-only across
/// every ticker in that run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub regime: Regime,
    pub volatility_index: f64,
    /// Same-day index return, as a fraction (-0.06 = -6%).
    pub index_return_1d: f64,
    pub sector_return_1d: f64,
    /// Trailing 7-day sector return.
    pub sector_return_7d: f64,
    /// Sector return relative to its own moving average; positive means the
    /// sector is running above trend.
    pub sector_vs_ma: f64,
}

impl MarketContext {
    pub fn neutral() -> Self {
        Self {
            regime: Regime::Uncertain,
            volatility_index: 20.0,
            index_return_1d: 0.0,
            sector_return_1d: 0.0,
            sector_return_7d: 0.0,
            sector_vs_ma: 0.0,
        }
    }
}

/// Per-instrument fundamentals used by the hard risk filters and the
/// fundamental-health component. Every field is optional; missing data
/// degrades to documented defaults rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    /// 0-100 health score. Missing defaults to a neutral 50 in the scorer.
    pub health_score: Option<f64>,
    pub debt_equity: Option<f64>,
    /// Average daily traded value, in account currency.
    pub avg_dollar_volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub listing_age_days: Option<u32>,
    /// Most recent earnings surprise as a fraction (-0.25 = missed by 25%).
    pub earnings_surprise: Option<f64>,
    /// High-severity adverse event (fraud probe, delisting notice, ...).
    pub adverse_event: bool,
}

/// Externally supplied catalyst strength for a ticker at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalystSignal {
    /// 0-100 catalyst strength.
    pub score: f64,
    /// 0-1 confidence in the score.
    pub confidence: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Oscillator / band / volatility readings from the technical indicator
/// provider, derived from the price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Momentum oscillator on a 0-100 scale (RSI-like).
    pub oscillator: f64,
    /// Position within the volatility bands, 0 = at lower band, 100 = upper.
    pub band_position: f64,
    /// Latest volume relative to its rolling average.
    pub volume_ratio: f64,
    /// Recent volatility range as a fraction of price.
    pub volatility_range: f64,
    /// Bullish reversal pattern detected on the recent bars.
    pub bullish_pattern: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IndicatorSnapshot {
    /// Conservative neutral reading used when the provider has insufficient
    /// history: mid-scale oscillator/band, no volume spike, no pattern.
    pub fn neutral() -> Self {
        Self {
            oscillator: 50.0,
            band_position: 50.0,
            volume_ratio: 1.0,
            volatility_range: 0.0,
            bullish_pattern: false,
            timestamp: chrono::Utc::now(),
        }
    }
}

pub mod http;

pub use http::HttpMarketData;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalystSignal, FundamentalSnapshot, IndicatorSnapshot, MarketContext, PriceSeries};

/// Supplies the ordered price/volume history for a ticker.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_series(&self, ticker: &str, bars: usize) -> Result<PriceSeries>;
}

/// Supplies oscillator/band/volatility readings derived from a price series.
#[async_trait]
pub trait IndicatorProvider: Send + Sync {
    async fn indicators(&self, series: &PriceSeries) -> Result<IndicatorSnapshot>;
}

/// Supplies the externally computed catalyst strength for a ticker.
/// None means no catalyst is known; the scorer treats that as zero strength.
#[async_trait]
pub trait CatalystProvider: Send + Sync {
    async fn catalyst(&self, ticker: &str) -> Result<Option<CatalystSignal>>;
}

/// Supplies fundamental health and the inputs to the hard risk filters.
#[async_trait]
pub trait FundamentalProvider: Send + Sync {
    async fn fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot>;
}

/// Supplies the market/sector context, computed once per batch.
#[async_trait]
pub trait MarketContextProvider: Send + Sync {
    async fn market_context(&self) -> Result<MarketContext>;
}

/// Reference indicator provider computing an RSI-style oscillator, band
/// position and volume ratio directly from the series. Stands in when no
/// external indicator feed is wired up.
pub struct SimpleIndicators {
    period: usize,
}

impl SimpleIndicators {
    pub fn new() -> Self {
        Self { period: 14 }
    }

    fn oscillator(&self, series: &PriceSeries) -> f64 {
        if series.len() < self.period + 1 {
            return 50.0;
        }
        let closes = series.closes();
        let start = closes.len() - self.period - 1;
        let mut gains = 0.0;
        let mut losses = 0.0;
        for w in closes[start..].windows(2) {
            let delta = w[1] - w[0];
            if delta >= 0.0 {
                gains += delta;
            } else {
                losses -= delta;
            }
        }
        if gains + losses == 0.0 {
            return 50.0;
        }
        100.0 * gains / (gains + losses)
    }
}

impl Default for SimpleIndicators {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndicatorProvider for SimpleIndicators {
    async fn indicators(&self, series: &PriceSeries) -> Result<IndicatorSnapshot> {
        if series.len() < 2 {
            return Ok(IndicatorSnapshot::neutral());
        }
        let recent = series.tail(20);
        let high = recent.highs_max();
        let low = recent.lows_min();
        let last = recent.last().map(|b| b.close).unwrap_or(0.0);

        let band_position = if high > low {
            ((last - low) / (high - low) * 100.0).clamp(0.0, 100.0)
        } else {
            50.0
        };

        let volume_ratio = match (series.last(), series.avg_volume(series.len() - 1, 20)) {
            (Some(bar), Some(avg)) if avg > 0.0 => bar.volume / avg,
            _ => 1.0,
        };

        // A close back above the prior bar's high after a down bar reads as
        // a bullish reversal bar.
        let n = series.len();
        let bullish_pattern = n >= 2
            && series[n - 2].is_bearish()
            && series[n - 1].close > series[n - 2].high;

        Ok(IndicatorSnapshot {
            oscillator: self.oscillator(series),
            band_position,
            volume_ratio,
            volatility_range: if last > 0.0 { (high - low) / last } else { 0.0 },
            bullish_pattern,
            timestamp: chrono::Utc::now(),
        })
    }
}

/// Stand-in catalyst provider for deployments without a catalyst feed.
pub struct NoCatalyst;

#[async_trait]
impl CatalystProvider for NoCatalyst {
    async fn catalyst(&self, _ticker: &str) -> Result<Option<CatalystSignal>> {
        Ok(None)
    }
}

/// Stand-in fundamental provider: every filter input missing, so the hard
/// risk filters pass and the scorer uses the neutral health score.
pub struct DefaultFundamentals;

#[async_trait]
impl FundamentalProvider for DefaultFundamentals {
    async fn fundamentals(&self, _ticker: &str) -> Result<FundamentalSnapshot> {
        Ok(FundamentalSnapshot::default())
    }
}

/// Stand-in context provider reporting an uncertain regime.
pub struct NeutralContext;

#[async_trait]
impl MarketContextProvider for NeutralContext {
    async fn market_context(&self) -> Result<MarketContext> {
        Ok(MarketContext::neutral())
    }
}

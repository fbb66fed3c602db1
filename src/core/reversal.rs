use crate::config::Config;
use crate::models::{IndicatorSnapshot, PriceSeries, ReversalSignal};

/// Confirms that a detected correction has stabilized or turned, using four
/// independent signals. Any signal the history is too short to compute
/// defaults to false; the detector never errors on short series.
pub struct ReversalDetector {
    consolidation_window: usize,
    consolidation_max_range: f64,
    ma_fast: usize,
    ma_slow: usize,
    momentum_neutral: f64,
    min_signals: usize,
}

impl ReversalDetector {
    pub fn new(cfg: &Config) -> Self {
        Self {
            consolidation_window: cfg.consolidation_window,
            consolidation_max_range: cfg.consolidation_max_range,
            ma_fast: cfg.ma_fast,
            ma_slow: cfg.ma_slow,
            momentum_neutral: cfg.momentum_neutral,
            min_signals: cfg.min_reversal_signals,
        }
    }

    pub fn evaluate(&self, series: &PriceSeries, indicators: &IndicatorSnapshot) -> ReversalSignal {
        let consolidation = self.check_consolidation(series);
        let ma_cross = self.check_ma_cross(series);
        let momentum = indicators.oscillator > self.momentum_neutral;
        let pattern = indicators.bullish_pattern;

        let confirmed_count = [consolidation, ma_cross, momentum, pattern]
            .iter()
            .filter(|&&s| s)
            .count();

        ReversalSignal {
            consolidation_confirmed: consolidation,
            ma_cross_confirmed: ma_cross,
            momentum_confirmed: momentum,
            pattern_confirmed: pattern,
            confirmed_count,
            is_confirmed: confirmed_count >= self.min_signals,
        }
    }

    /// Trading range over the recent window is tight relative to price.
    fn check_consolidation(&self, series: &PriceSeries) -> bool {
        if series.len() < self.consolidation_window {
            return false;
        }
        let recent = series.tail(self.consolidation_window);
        let Some(last) = recent.last() else {
            return false;
        };
        if last.close <= 0.0 {
            return false;
        }
        let range = recent.highs_max() - recent.lows_min();
        range / last.close < self.consolidation_max_range
    }

    /// Short-term moving average has crossed above the slower one.
    fn check_ma_cross(&self, series: &PriceSeries) -> bool {
        match (series.sma(self.ma_fast), series.sma(self.ma_slow)) {
            (Some(fast), Some(slow)) => fast > slow,
            _ => false,
        }
    }
}

use tracing::debug;

use crate::config::Config;
use crate::models::{CorrectionEvent, PriceSeries};

/// Minimum bars of history before a peak/decline can be established.
const MIN_HISTORY: usize = 7;

/// Identifies a bounded-magnitude decline from the highest close in the
/// fetched window. Returns None (not an error) when no qualifying
/// correction exists.
pub struct CorrectionDetector {
    min_decline: f64,
    max_decline: f64,
    min_duration_days: u32,
    min_volume_spike: f64,
    volume_window: usize,
    volume_window_fallback: usize,
}

impl CorrectionDetector {
    pub fn new(cfg: &Config) -> Self {
        Self {
            min_decline: cfg.min_decline_pct,
            max_decline: cfg.max_decline_pct,
            min_duration_days: cfg.min_decline_days,
            min_volume_spike: cfg.min_volume_spike,
            volume_window: cfg.volume_window,
            volume_window_fallback: cfg.volume_window_fallback,
        }
    }

    pub fn detect(&self, series: &PriceSeries) -> Option<CorrectionEvent> {
        if series.len() < MIN_HISTORY {
            return None;
        }

        let peak_idx = series.close_idx_max()?;
        let peak = &series[peak_idx];
        let latest = series.last()?;

        if peak.close <= 0.0 {
            return None;
        }
        let decline_pct = (peak.close - latest.close) / peak.close;

        if decline_pct < self.min_decline || decline_pct > self.max_decline {
            debug!(
                ticker = %series.ticker,
                decline = format!("{:.1}%", decline_pct * 100.0),
                "decline outside valid band"
            );
            return None;
        }

        let duration_days = (latest.timestamp - peak.timestamp).num_days().max(0) as u32;
        if duration_days < self.min_duration_days {
            return None;
        }

        let volume_spike_ratio = self.max_volume_spike(series, peak_idx);
        if volume_spike_ratio < self.min_volume_spike {
            return None;
        }

        Some(CorrectionEvent {
            ticker: series.ticker.clone(),
            peak_price: peak.close,
            peak_timestamp: peak.timestamp,
            current_price: latest.close,
            decline_pct: round4(decline_pct),
            decline_duration_days: duration_days,
            volume_spike_ratio: round2(volume_spike_ratio),
        })
    }

    /// Maximum volume-to-rolling-average ratio over the decline window.
    /// The rolling window shrinks to the fallback size on short history and
    /// degrades to 1.0 rather than failing outright.
    fn max_volume_spike(&self, series: &PriceSeries, peak_idx: usize) -> f64 {
        let window = if series.len() >= self.volume_window + 1 {
            self.volume_window
        } else {
            self.volume_window_fallback
        };

        let mut max_ratio: f64 = 1.0;
        for i in peak_idx..series.len() {
            let Some(avg) = series.avg_volume(i, window.min(i)) else {
                continue;
            };
            if avg > 0.0 {
                max_ratio = max_ratio.max(series[i].volume / avg);
            }
        }
        max_ratio
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

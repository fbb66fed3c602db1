use tracing::warn;

use crate::config::Config;
use crate::models::{FundamentalSnapshot, MarketContext};

/// Market/sector/instrument circuit breaker. Checks run in a fixed order,
/// each independently sufficient to veto; the first trip wins and is recorded
/// in the decision reasoning. This is the highest-priority veto in the
/// system, evaluated after the risk filters and before the boost mapper.
pub struct EmergencyBreaker {
    market_crash_threshold: f64,
    sector_crash_threshold: f64,
    earnings_miss_threshold: f64,
}

impl EmergencyBreaker {
    pub fn new(cfg: &Config) -> Self {
        Self {
            market_crash_threshold: cfg.market_crash_threshold,
            sector_crash_threshold: cfg.sector_crash_threshold,
            earnings_miss_threshold: cfg.earnings_miss_threshold,
        }
    }

    /// Returns the veto reason when any emergency condition holds.
    pub fn check(
        &self,
        ticker: &str,
        ctx: &MarketContext,
        fundamentals: &FundamentalSnapshot,
    ) -> Option<String> {
        if ctx.index_return_1d <= self.market_crash_threshold {
            let reason = format!(
                "market crash: index {:.1}% on the day",
                ctx.index_return_1d * 100.0
            );
            warn!(ticker, %reason, "emergency breaker tripped");
            return Some(reason);
        }

        if ctx.sector_return_7d <= self.sector_crash_threshold {
            let reason = format!(
                "sector crash: {:.1}% over 7 days",
                ctx.sector_return_7d * 100.0
            );
            warn!(ticker, %reason, "emergency breaker tripped");
            return Some(reason);
        }

        if let Some(surprise) = fundamentals.earnings_surprise {
            if surprise <= self.earnings_miss_threshold {
                let reason = format!("earnings miss: surprise {:.1}%", surprise * 100.0);
                warn!(ticker, %reason, "emergency breaker tripped");
                return Some(reason);
            }
        }

        if fundamentals.adverse_event {
            let reason = "high-severity adverse event flagged".to_string();
            warn!(ticker, %reason, "emergency breaker tripped");
            return Some(reason);
        }

        None
    }
}

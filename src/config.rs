use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Weights for the confidence blend. Must sum to 1.0 (validated at startup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub oversold: f64,
    pub fundamental: f64,
    pub catalyst: f64,
}

/// Confidence breakpoints for the tier mapping. Must be strictly decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Correction detection
    pub min_decline_pct: f64,
    pub max_decline_pct: f64,
    pub min_decline_days: u32,
    pub min_volume_spike: f64,
    pub volume_window: usize,
    pub volume_window_fallback: usize,

    // Reversal confirmation
    pub consolidation_window: usize,
    pub consolidation_max_range: f64,
    pub ma_fast: usize,
    pub ma_slow: usize,
    pub momentum_neutral: f64,
    pub min_reversal_signals: usize,

    // Scoring
    pub weights: ScoreWeights,
    pub neutral_fundamental: f64,

    // Hard risk filters
    pub max_debt_equity: f64,
    pub min_dollar_volume: f64,
    pub min_market_cap: f64,
    pub max_beta: f64,
    pub min_listing_age_days: u32,

    // Regime adjustment
    pub bull_multiplier: f64,
    pub bear_multiplier: f64,
    pub sector_momentum_adjust: f64,

    // Emergency breaker
    pub market_crash_threshold: f64,
    pub sector_crash_threshold: f64,
    pub earnings_miss_threshold: f64,

    // Boost mapping
    pub tier_thresholds: TierThresholds,
    pub score_ceiling: f64,

    // Supervision
    pub approve_confidence: f64,
    pub caution_boost_factor: f64,

    // Calibration
    pub success_threshold: f64,
    pub precision_warning: f64,
    pub false_positive_warning: f64,
    pub threshold_delta_step: f64,

    // Batch orchestration
    pub max_concurrent_tickers: usize,
    pub batch_timeout_secs: u64,
    pub history_bars: usize,

    // Market data client
    pub market_data_url: String,
    pub cache_ttl_secs: u64,

    // Logging / persistence
    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let envf = |key: &str, default: f64| -> f64 {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Config {
            min_decline_pct: envf("MIN_DECLINE_PCT", 0.10),
            max_decline_pct: envf("MAX_DECLINE_PCT", 0.35),
            min_decline_days: envf("MIN_DECLINE_DAYS", 5.0) as u32,
            min_volume_spike: envf("MIN_VOLUME_SPIKE", 1.3),
            volume_window: 30,
            volume_window_fallback: 10,

            consolidation_window: 10,
            consolidation_max_range: 0.10,
            ma_fast: 5,
            ma_slow: 10,
            momentum_neutral: 50.0,
            min_reversal_signals: 2,

            weights: ScoreWeights {
                oversold: envf("WEIGHT_OVERSOLD", 0.3),
                fundamental: envf("WEIGHT_FUNDAMENTAL", 0.3),
                catalyst: envf("WEIGHT_CATALYST", 0.4),
            },
            neutral_fundamental: 50.0,

            max_debt_equity: envf("MAX_DEBT_EQUITY", 2.0),
            min_dollar_volume: envf("MIN_DOLLAR_VOLUME", 1_000_000.0),
            min_market_cap: envf("MIN_MARKET_CAP", 100_000_000.0),
            max_beta: envf("MAX_BETA", 2.5),
            min_listing_age_days: 365,

            bull_multiplier: 1.1,
            bear_multiplier: 0.9,
            sector_momentum_adjust: 0.10,

            market_crash_threshold: envf("MARKET_CRASH_THRESHOLD", -0.05),
            sector_crash_threshold: envf("SECTOR_CRASH_THRESHOLD", -0.10),
            earnings_miss_threshold: envf("EARNINGS_MISS_THRESHOLD", -0.20),

            tier_thresholds: TierThresholds {
                very_high: 0.85,
                high: 0.70,
                medium: 0.55,
                low: 0.40,
            },
            score_ceiling: envf("SCORE_CEILING", 100.0),

            approve_confidence: envf("APPROVE_CONFIDENCE", 0.70),
            caution_boost_factor: 0.5,

            success_threshold: envf("SUCCESS_THRESHOLD", 0.05),
            precision_warning: envf("PRECISION_WARNING", 0.75),
            false_positive_warning: envf("FALSE_POSITIVE_WARNING", 0.20),
            threshold_delta_step: 0.05,

            max_concurrent_tickers: envf("MAX_CONCURRENT_TICKERS", 4.0) as usize,
            batch_timeout_secs: envf("BATCH_TIMEOUT_SECS", 30.0) as u64,
            history_bars: envf("HISTORY_BARS", 120.0) as usize,

            market_data_url: env("MARKET_DATA_URL", "https://api.example.com/v1"),
            cache_ttl_secs: envf("CACHE_TTL_SECS", 120.0) as u64,

            log_dir: env("LOG_DIR", "logs"),
            log_level: env("LOG_LEVEL", "INFO"),
        }
    }

    /// Startup validation. Configuration errors are the only fatal errors in
    /// the system.
    pub fn validate(&self) -> Result<(), EngineError> {
        let weight_sum = self.weights.oversold + self.weights.fundamental + self.weights.catalyst;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidConfig(format!(
                "score weights must sum to 1.0, got {:.4}",
                weight_sum
            )));
        }
        if self.min_decline_pct <= 0.0 || self.min_decline_pct >= self.max_decline_pct {
            return Err(EngineError::InvalidConfig(format!(
                "decline band is inverted: {:.2}..{:.2}",
                self.min_decline_pct, self.max_decline_pct
            )));
        }
        let t = &self.tier_thresholds;
        if !(t.very_high > t.high && t.high > t.medium && t.medium > t.low && t.low > 0.0) {
            return Err(EngineError::InvalidConfig(
                "tier thresholds must be strictly decreasing and positive".to_string(),
            ));
        }
        if self.min_reversal_signals == 0 || self.min_reversal_signals > 4 {
            return Err(EngineError::InvalidConfig(format!(
                "min_reversal_signals must be 1..=4, got {}",
                self.min_reversal_signals
            )));
        }
        if self.max_concurrent_tickers == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrent_tickers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

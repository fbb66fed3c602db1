use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::models::{
    BoostDecision, BoostTier, CatalystSignal, CorrectionEvent, DecisionRecord, FundamentalSnapshot,
    IndicatorSnapshot, PriceBar, PriceSeries, ReversalSignal, RiskAssessment, ScoreComponents,
    SupervisionVerdict, Verdict,
};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Daily bars from a list of closes; volume 100, small symmetric wicks.
pub fn make_bars(closes: &[f64]) -> PriceSeries {
    let base = base_time();
    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            timestamp: base + Duration::days(i as i64),
            open: c,
            high: c + 0.5,
            low: c - 0.5,
            close: c,
            volume: 100.0,
        })
        .collect();
    let mut series = PriceSeries::new("TEST", bars);
    series.fetched_at = Some(base);
    series
}

/// A rise to `peak_price` followed by a decline of `decline_pct` over
/// `decline_days` daily bars, with one volume bar at `volume_spike` times the
/// average in the middle of the decline.
pub fn make_correction_series(
    peak_price: f64,
    decline_pct: f64,
    decline_days: usize,
    volume_spike: f64,
) -> PriceSeries {
    let base = base_time();
    let mut bars: Vec<PriceBar> = Vec::new();

    // 30 days grinding up to the peak
    let rise_days = 30;
    for i in 0..rise_days {
        let c = peak_price * (0.92 + 0.08 * i as f64 / (rise_days - 1) as f64);
        bars.push(PriceBar {
            timestamp: base + Duration::days(i as i64),
            open: c,
            high: c * 1.004,
            low: c * 0.996,
            close: c,
            volume: 100.0,
        });
    }

    // Decline from the peak to the target
    let target = peak_price * (1.0 - decline_pct);
    for d in 1..=decline_days {
        let c = peak_price + (target - peak_price) * d as f64 / decline_days as f64;
        let volume = if d == decline_days / 2 + 1 {
            100.0 * volume_spike
        } else {
            100.0
        };
        bars.push(PriceBar {
            timestamp: base + Duration::days((rise_days - 1 + d) as i64),
            open: c * 1.002,
            high: c * 1.006,
            low: c * 0.994,
            close: c,
            volume,
        });
    }

    PriceSeries::new("TEST", bars)
}

/// A correction followed by a 10-day base: six days of tight wiggle around
/// the low, then four gently rising closes so the fast MA crosses the slow
/// one. Gives all four reversal signals a chance to confirm.
pub fn make_recovery_series(
    peak_price: f64,
    decline_pct: f64,
    decline_days: usize,
    volume_spike: f64,
) -> PriceSeries {
    let mut series = make_correction_series(peak_price, decline_pct, decline_days, volume_spike);
    let target = peak_price * (1.0 - decline_pct);
    let start = series.len();
    let wiggle = [0.998, 1.001, 0.999, 1.002, 0.998, 1.000];
    let climb = [1.004, 1.008, 1.012, 1.016];

    for (i, mult) in wiggle.iter().chain(climb.iter()).enumerate() {
        let c = target * mult;
        series.push(PriceBar {
            timestamp: base_time() + Duration::days((start + i) as i64),
            open: c,
            high: c * 1.004,
            low: c * 0.996,
            close: c,
            volume: 100.0,
        });
    }
    series
}

/// Indicator readings for a deeply oversold base with a bullish pattern.
/// Oscillator sits below the momentum-neutral line on purpose: scenario
/// coverage wants 3-of-4 reversal signals, not all four.
pub fn strong_indicators() -> IndicatorSnapshot {
    IndicatorSnapshot {
        oscillator: 38.0,
        band_position: 20.0,
        volume_ratio: 2.0,
        volatility_range: 0.03,
        bullish_pattern: true,
        timestamp: Utc::now(),
    }
}

pub fn strong_catalyst() -> CatalystSignal {
    CatalystSignal {
        score: 80.0,
        confidence: 0.9,
        timestamp: Utc::now(),
    }
}

/// Fundamentals that pass every hard risk filter.
pub fn clean_fundamentals() -> FundamentalSnapshot {
    FundamentalSnapshot {
        health_score: Some(70.0),
        debt_equity: Some(0.8),
        avg_dollar_volume: Some(5_000_000.0),
        market_cap: Some(2_000_000_000.0),
        beta: Some(1.2),
        listing_age_days: Some(2000),
        earnings_surprise: Some(0.02),
        adverse_event: false,
    }
}

pub fn sample_correction() -> CorrectionEvent {
    CorrectionEvent {
        ticker: "AAA".to_string(),
        peak_price: 100.0,
        peak_timestamp: base_time(),
        current_price: 85.0,
        decline_pct: 0.15,
        decline_duration_days: 8,
        volume_spike_ratio: 1.8,
    }
}

/// A reversal signal with `confirmed` of the four checks set, filled from
/// the front (consolidation first).
pub fn confirmed_reversal(confirmed: usize) -> ReversalSignal {
    ReversalSignal {
        consolidation_confirmed: confirmed >= 1,
        ma_cross_confirmed: confirmed >= 2,
        momentum_confirmed: confirmed >= 3,
        pattern_confirmed: confirmed >= 4,
        confirmed_count: confirmed,
        is_confirmed: confirmed >= 2,
    }
}

/// Minimal decision record for outcome-tracker tests.
pub fn make_decision_record(
    decision_id: &str,
    ticker: &str,
    verdict: Verdict,
    boosted: bool,
    predicted_return: f64,
) -> DecisionRecord {
    let tier = if boosted { BoostTier::High } else { BoostTier::None };
    let points = if boosted { 15.0 } else { 0.0 };
    DecisionRecord {
        decision_id: decision_id.to_string(),
        ticker: ticker.to_string(),
        decided_at: Utc::now(),
        correction_detected: boosted,
        correction: boosted.then(sample_correction),
        reversal: boosted.then(|| confirmed_reversal(3)),
        scores: ScoreComponents {
            oversold_score: 75.0,
            fundamental_score: 60.0,
            catalyst_score: 80.0,
        },
        raw_confidence: 0.725,
        final_confidence: 0.75,
        risk: RiskAssessment::clean(),
        emergency_veto: None,
        boost: BoostDecision {
            tier,
            point_adjustment: points,
            base_score: 50.0,
            final_score: 50.0 + points,
        },
        supervision: SupervisionVerdict {
            verdict,
            confidence: 0.9,
            alignment_issues: Vec::new(),
            recommendations: Vec::new(),
        },
        predicted_return,
        reasoning: Vec::new(),
    }
}

/// A Config suitable for tests: stock defaults, temp log dir.
pub fn default_test_config() -> Config {
    Config {
        min_decline_pct: 0.10,
        max_decline_pct: 0.35,
        min_decline_days: 5,
        min_volume_spike: 1.3,
        volume_window: 30,
        volume_window_fallback: 10,

        consolidation_window: 10,
        consolidation_max_range: 0.10,
        ma_fast: 5,
        ma_slow: 10,
        momentum_neutral: 50.0,
        min_reversal_signals: 2,

        weights: crate::config::ScoreWeights {
            oversold: 0.3,
            fundamental: 0.3,
            catalyst: 0.4,
        },
        neutral_fundamental: 50.0,

        max_debt_equity: 2.0,
        min_dollar_volume: 1_000_000.0,
        min_market_cap: 100_000_000.0,
        max_beta: 2.5,
        min_listing_age_days: 365,

        bull_multiplier: 1.1,
        bear_multiplier: 0.9,
        sector_momentum_adjust: 0.10,

        market_crash_threshold: -0.05,
        sector_crash_threshold: -0.10,
        earnings_miss_threshold: -0.20,

        tier_thresholds: crate::config::TierThresholds {
            very_high: 0.85,
            high: 0.70,
            medium: 0.55,
            low: 0.40,
        },
        score_ceiling: 100.0,

        approve_confidence: 0.70,
        caution_boost_factor: 0.5,

        success_threshold: 0.05,
        precision_warning: 0.75,
        false_positive_warning: 0.20,
        threshold_delta_step: 0.05,

        max_concurrent_tickers: 4,
        batch_timeout_secs: 30,
        history_bars: 120,

        market_data_url: "http://localhost:0".to_string(),
        cache_ttl_secs: 120,

        log_dir: std::env::temp_dir()
            .join("correction_engine_test")
            .to_string_lossy()
            .to_string(),
        log_level: "ERROR".to_string(),
    }
}

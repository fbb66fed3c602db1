use chrono::{DateTime, Duration, Utc};

use correction_engine::config::Config;
use correction_engine::models::{
    CatalystSignal, FundamentalSnapshot, IndicatorSnapshot, PriceBar, PriceSeries,
};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A rise to `peak_price` followed by a decline of `decline_pct` over
/// `decline_days` daily bars, with one volume bar at `volume_spike` times
/// the average in the middle of the decline.
pub fn make_correction_series(
    ticker: &str,
    peak_price: f64,
    decline_pct: f64,
    decline_days: usize,
    volume_spike: f64,
) -> PriceSeries {
    let base = base_time();
    let mut bars: Vec<PriceBar> = Vec::new();

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

    PriceSeries::new(ticker, bars)
}

/// A correction followed by a 10-day base: six days of tight wiggle around
/// the low, then four gently rising closes so the fast MA crosses the slow
/// one.
pub fn make_recovery_series(
    ticker: &str,
    peak_price: f64,
    decline_pct: f64,
    decline_days: usize,
    volume_spike: f64,
) -> PriceSeries {
    let mut series =
        make_correction_series(ticker, peak_price, decline_pct, decline_days, volume_spike);
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

/// Oversold base with a bullish pattern: 3 of 4 reversal signals confirm.
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

pub fn test_config() -> Config {
    let mut cfg = Config::from_env();
    cfg.log_dir = std::env::temp_dir()
        .join(format!("correction_engine_integ_{}", std::process::id()))
        .to_string_lossy()
        .to_string();
    cfg.log_level = "ERROR".to_string();
    cfg
}

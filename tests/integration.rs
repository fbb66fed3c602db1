mod common;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use correction_engine::engine::{Engine, Providers, TickerRequest};
use correction_engine::models::{
    BoostTier, CatalystSignal, FundamentalSnapshot, IndicatorSnapshot, MarketContext, PriceSeries,
    Regime, RiskViolation, Verdict,
};
use correction_engine::providers::{
    CatalystProvider, FundamentalProvider, IndicatorProvider, MarketContextProvider,
    MarketDataProvider,
};

use common::{
    clean_fundamentals, make_correction_series, make_recovery_series, strong_catalyst,
    strong_indicators, test_config,
};

/// Serves canned price history per ticker; unknown tickers fail the fetch.
struct MockMarket {
    series: HashMap<String, PriceSeries>,
}

#[async_trait]
impl MarketDataProvider for MockMarket {
    async fn fetch_series(&self, ticker: &str, _bars: usize) -> Result<PriceSeries> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no data for {ticker}"))
    }
}

/// Market data provider that never answers within the batch deadline.
struct SlowMarket;

#[async_trait]
impl MarketDataProvider for SlowMarket {
    async fn fetch_series(&self, ticker: &str, _bars: usize) -> Result<PriceSeries> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        anyhow::bail!("no data for {ticker}")
    }
}

struct MockIndicators {
    snapshot: IndicatorSnapshot,
}

#[async_trait]
impl IndicatorProvider for MockIndicators {
    async fn indicators(&self, _series: &PriceSeries) -> Result<IndicatorSnapshot> {
        Ok(self.snapshot.clone())
    }
}

struct MockCatalyst {
    signal: Option<CatalystSignal>,
}

#[async_trait]
impl CatalystProvider for MockCatalyst {
    async fn catalyst(&self, _ticker: &str) -> Result<Option<CatalystSignal>> {
        Ok(self.signal.clone())
    }
}

struct MockFundamentals {
    map: HashMap<String, FundamentalSnapshot>,
}

#[async_trait]
impl FundamentalProvider for MockFundamentals {
    async fn fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot> {
        Ok(self.map.get(ticker).cloned().unwrap_or_default())
    }
}

struct MockContext {
    ctx: MarketContext,
}

#[async_trait]
impl MarketContextProvider for MockContext {
    async fn market_context(&self) -> Result<MarketContext> {
        Ok(self.ctx.clone())
    }
}

fn bull_context() -> MarketContext {
    MarketContext {
        regime: Regime::Bull,
        volatility_index: 18.0,
        index_return_1d: 0.004,
        sector_return_1d: 0.006,
        sector_return_7d: 0.02,
        sector_vs_ma: 0.01,
    }
}

fn request(ticker: &str, base_score: f64) -> TickerRequest {
    TickerRequest {
        ticker: ticker.to_string(),
        base_score,
    }
}

fn providers(series: HashMap<String, PriceSeries>, ctx: MarketContext) -> Providers {
    let mut fundamentals = HashMap::new();
    fundamentals.insert("STRONG".to_string(), clean_fundamentals());
    fundamentals.insert("CRASHED".to_string(), clean_fundamentals());
    let mut levered = clean_fundamentals();
    levered.debt_equity = Some(5.0);
    fundamentals.insert("LEVERED".to_string(), levered);

    Providers {
        market: Arc::new(MockMarket { series }),
        indicators: Arc::new(MockIndicators {
            snapshot: strong_indicators(),
        }),
        catalyst: Arc::new(MockCatalyst {
            signal: Some(strong_catalyst()),
        }),
        fundamentals: Arc::new(MockFundamentals { map: fundamentals }),
        context: Arc::new(MockContext { ctx }),
    }
}

#[tokio::test]
async fn batch_pipeline_end_to_end() {
    let cfg = test_config();

    let mut series = HashMap::new();
    series.insert(
        "STRONG".to_string(),
        make_recovery_series("STRONG", 100.0, 0.15, 8, 1.8),
    );
    series.insert(
        "LEVERED".to_string(),
        make_recovery_series("LEVERED", 100.0, 0.15, 8, 1.8),
    );
    series.insert(
        "CRASHED".to_string(),
        make_correction_series("CRASHED", 100.0, 0.40, 8, 1.8),
    );
    // "MISSING" has no data on purpose

    let engine = Engine::new(cfg, providers(series, bull_context()));
    let records = engine
        .run_batch(vec![
            request("STRONG", 62.0),
            request("LEVERED", 50.0),
            request("CRASHED", 50.0),
            request("MISSING", 50.0),
        ])
        .await;

    assert_eq!(records.len(), 4);
    let by_ticker: HashMap<&str, _> = records.iter().map(|r| (r.ticker.as_str(), r)).collect();

    // Textbook setup: deep oversold correction with a confirmed reversal in
    // a bull regime gets the full boost and approval.
    let strong = by_ticker["STRONG"];
    assert!(strong.correction_detected);
    assert!(strong.reversal.as_ref().unwrap().is_confirmed);
    assert!(strong.risk.passed);
    assert_eq!(strong.boost.tier, BoostTier::VeryHigh);
    assert!((strong.boost.point_adjustment - 20.0).abs() < 1e-9);
    assert!((strong.boost.final_score - 82.0).abs() < 1e-9);
    assert_eq!(strong.supervision.verdict, Verdict::Approve);
    assert!(strong.predicted_return > 0.0);

    // Same setup but over-levered: hard filter fails, boost zeroed, rejected.
    let levered = by_ticker["LEVERED"];
    assert!(!levered.risk.passed);
    assert!(levered.risk.violations.contains(&RiskViolation::Leverage));
    assert_eq!(levered.boost.tier, BoostTier::None);
    assert!((levered.boost.final_score - 50.0).abs() < 1e-9);
    assert_eq!(levered.supervision.verdict, Verdict::Reject);

    // A 40% collapse is a crash, not a correction: no event, base untouched.
    let crashed = by_ticker["CRASHED"];
    assert!(!crashed.correction_detected);
    assert_eq!(crashed.boost.tier, BoostTier::None);
    assert!((crashed.boost.final_score - 50.0).abs() < 1e-9);
    assert_eq!(crashed.supervision.verdict, Verdict::Approve);

    // Unfetchable data still yields a record, flagged for review, with the
    // provider failure carried into the reasoning.
    let missing = by_ticker["MISSING"];
    assert!(!missing.correction_detected);
    assert_eq!(missing.boost.tier, BoostTier::None);
    assert_eq!(missing.supervision.verdict, Verdict::Review);
    assert!(missing.reasoning[0].contains("no data for MISSING"));
}

#[tokio::test]
async fn market_crash_vetoes_every_boost() {
    let cfg = test_config();

    let mut ctx = bull_context();
    ctx.index_return_1d = -0.06;

    let mut series = HashMap::new();
    series.insert(
        "STRONG".to_string(),
        make_recovery_series("STRONG", 100.0, 0.15, 8, 1.8),
    );

    let engine = Engine::new(cfg, providers(series, ctx));
    let records = engine.run_batch(vec![request("STRONG", 62.0)]).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.risk.passed);
    assert!(record
        .emergency_veto
        .as_ref()
        .unwrap()
        .contains("market crash"));
    assert_eq!(record.boost.tier, BoostTier::None);
    assert!((record.boost.final_score - 62.0).abs() < 1e-9);
    assert_eq!(record.supervision.verdict, Verdict::Reject);
}

#[tokio::test]
async fn outcome_feedback_updates_calibration() {
    let mut cfg = test_config();
    cfg.log_dir = std::env::temp_dir()
        .join(format!("correction_engine_outcome_{}", std::process::id()))
        .to_string_lossy()
        .to_string();
    let _ = std::fs::remove_file(format!("{}/calibration.json", cfg.log_dir));

    let mut series = HashMap::new();
    series.insert(
        "STRONG".to_string(),
        make_recovery_series("STRONG", 100.0, 0.15, 8, 1.8),
    );

    let engine = Engine::new(cfg, providers(series, bull_context()));
    let records = engine.run_batch(vec![request("STRONG", 62.0)]).await;
    let decision_id = records[0].decision_id.clone();

    // Re-recording the same outcome must not double-count.
    engine.record_outcome(&decision_id, 0.10, Utc::now());
    engine.record_outcome(&decision_id, 0.10, Utc::now());
    // Outcomes for unknown decisions are ignored.
    engine.record_outcome("ghost", 0.10, Utc::now());

    let report = engine.calibration_report();
    assert_eq!(report.sample_count, 1);
    assert!((report.precision - 1.0).abs() < 1e-9);
    assert!((report.hit_rate - 1.0).abs() < 1e-9);
    assert!((report.false_positive_rate - 0.0).abs() < 1e-9);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn batch_deadline_drops_in_flight_tickers() {
    let mut cfg = test_config();
    cfg.batch_timeout_secs = 1;

    let providers = Providers {
        market: Arc::new(SlowMarket),
        indicators: Arc::new(MockIndicators {
            snapshot: strong_indicators(),
        }),
        catalyst: Arc::new(MockCatalyst { signal: None }),
        fundamentals: Arc::new(MockFundamentals {
            map: HashMap::new(),
        }),
        context: Arc::new(MockContext {
            ctx: bull_context(),
        }),
    };

    let engine = Engine::new(cfg, providers);
    let records = engine
        .run_batch(vec![request("AAA", 50.0), request("BBB", 50.0)])
        .await;

    assert!(records.is_empty());
}

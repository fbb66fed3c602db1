use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{
    BoostMapper, CorrectionDetector, EmergencyBreaker, OpportunityScorer, ReversalDetector,
    RiskGate,
};
use crate::error::EngineError;
use crate::models::{
    CatalystSignal, DecisionRecord, FundamentalSnapshot, IndicatorSnapshot, MarketContext,
    PriceSeries, RiskAssessment, ScoreComponents,
};
use crate::providers::{
    CatalystProvider, FundamentalProvider, IndicatorProvider, MarketContextProvider,
    MarketDataProvider,
};
use crate::supervision::{CalibrationState, OutcomeTracker, SupervisionContext, Supervisor};

/// The external collaborators the engine pulls data from.
#[derive(Clone)]
pub struct Providers {
    pub market: Arc<dyn MarketDataProvider>,
    pub indicators: Arc<dyn IndicatorProvider>,
    pub catalyst: Arc<dyn CatalystProvider>,
    pub fundamentals: Arc<dyn FundamentalProvider>,
    pub context: Arc<dyn MarketContextProvider>,
}

/// One ticker to analyze, with the opaque external score the boost applies to.
#[derive(Debug, Clone)]
pub struct TickerRequest {
    pub ticker: String,
    pub base_score: f64,
}

/// Batch orchestrator. Each ticker runs a pure synchronous pipeline over
/// pre-fetched inputs; tickers run in parallel under a bounded worker pool
/// and share nothing mutable except the outcome tracker.
pub struct Engine {
    cfg: Config,
    providers: Providers,
    tracker: Arc<OutcomeTracker>,
}

impl Engine {
    pub fn new(cfg: Config, providers: Providers) -> Self {
        let tracker = Arc::new(OutcomeTracker::new(&cfg));
        Self {
            cfg,
            providers,
            tracker,
        }
    }

    /// Analyzes a batch of tickers. MarketContext is computed once and shared
    /// read-only. Tickers still in flight at the batch deadline become "no
    /// decision" rather than an error.
    pub async fn run_batch(&self, requests: Vec<TickerRequest>) -> Vec<DecisionRecord> {
        let started = std::time::Instant::now();
        let total = requests.len();
        info!(tickers = total, "starting batch analysis");

        let ctx = match self.providers.context.market_context().await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("market context unavailable, assuming uncertain regime: {e:#}");
                MarketContext::neutral()
            }
        };
        debug!(regime = %ctx.regime, vix = ctx.volatility_index, "market context");
        let ctx = Arc::new(ctx);

        let semaphore = Arc::new(Semaphore::new(self.cfg.max_concurrent_tickers));
        let mut set = JoinSet::new();

        for request in requests {
            let cfg = self.cfg.clone();
            let providers = self.providers.clone();
            let ctx = Arc::clone(&ctx);
            let tracker = Arc::clone(&self.tracker);
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let record = analyze_ticker(&cfg, &providers, &ctx, &request).await;
                tracker.register_decision(&record);
                Some(record)
            });
        }

        let deadline = Duration::from_secs(self.cfg.batch_timeout_secs);
        let mut records = Vec::new();

        loop {
            let remaining = deadline.saturating_sub(started.elapsed());
            match tokio::time::timeout(remaining, set.join_next()).await {
                Ok(Some(Ok(Some(record)))) => records.push(record),
                Ok(Some(Ok(None))) => {}
                Ok(Some(Err(e))) => warn!("ticker task failed: {e}"),
                Ok(None) => break,
                Err(_) => {
                    let aborted = set.len();
                    set.abort_all();
                    let err = EngineError::Timeout(format!(
                        "batch deadline after {}s",
                        self.cfg.batch_timeout_secs
                    ));
                    warn!(aborted, "{err}; in-flight tickers yield no decision");
                    break;
                }
            }
        }

        info!(
            decided = records.len(),
            total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        records
    }

    /// Feedback entrypoint for an external scheduler once realized returns
    /// are known.
    pub fn record_outcome(
        &self,
        decision_id: &str,
        actual_return: f64,
        observed_at: chrono::DateTime<Utc>,
    ) {
        self.tracker
            .record_outcome(decision_id, actual_return, observed_at);
    }

    pub fn calibration_report(&self) -> CalibrationState {
        self.tracker.calibration_report()
    }
}

/// Fetches all inputs for one ticker, then runs the synchronous pipeline.
/// Provider failures degrade to neutral inputs; only a missing price series
/// makes the decision unreviewable.
async fn analyze_ticker(
    cfg: &Config,
    providers: &Providers,
    ctx: &MarketContext,
    request: &TickerRequest,
) -> DecisionRecord {
    let series = match providers
        .market
        .fetch_series(&request.ticker, cfg.history_bars)
        .await
    {
        Ok(series) if !series.is_empty() => series,
        Ok(_) => {
            let err = EngineError::DataUnavailable {
                ticker: request.ticker.clone(),
                reason: "empty price history".to_string(),
            };
            warn!("{err}");
            return incomplete_record(cfg, request, &err.to_string());
        }
        Err(e) => {
            let err = EngineError::Provider(e);
            warn!(ticker = %request.ticker, "price history unavailable: {err}");
            return incomplete_record(cfg, request, &err.to_string());
        }
    };

    let indicators = match providers.indicators.indicators(&series).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(ticker = %request.ticker, "indicators unavailable, using neutral: {e:#}");
            IndicatorSnapshot::neutral()
        }
    };

    let fundamentals = match providers.fundamentals.fundamentals(&request.ticker).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(ticker = %request.ticker, "fundamentals unavailable, using defaults: {e:#}");
            FundamentalSnapshot::default()
        }
    };

    let catalyst = match providers.catalyst.catalyst(&request.ticker).await {
        Ok(signal) => signal,
        Err(e) => {
            debug!(ticker = %request.ticker, "catalyst unavailable: {e:#}");
            None
        }
    };

    run_pipeline(
        cfg,
        ctx,
        request,
        &series,
        &indicators,
        &fundamentals,
        catalyst.as_ref(),
    )
}

/// The synchronous per-ticker pipeline: detector, reversal, scorer, gates,
/// breaker, mapper, supervisor.
fn run_pipeline(
    cfg: &Config,
    ctx: &MarketContext,
    request: &TickerRequest,
    series: &PriceSeries,
    indicators: &IndicatorSnapshot,
    fundamentals: &FundamentalSnapshot,
    catalyst: Option<&CatalystSignal>,
) -> DecisionRecord {
    let decided_at = Utc::now();
    let decision_id = format!("{}-{}", request.ticker, decided_at.timestamp_millis());
    let mapper = BoostMapper::new(cfg);
    let supervisor = Supervisor::new(cfg);
    let mut reasoning = Vec::new();

    let Some(event) = CorrectionDetector::new(cfg).detect(series) else {
        reasoning.push("no correction event detected".to_string());
        let boost = mapper.map(0.0, request.base_score, true, false);
        let scores = ScoreComponents::default();
        let supervision = supervisor.review(
            &request.ticker,
            &SupervisionContext {
                correction: None,
                reversal: None,
                scores: &scores,
                final_confidence: 0.0,
                risk: &RiskAssessment::clean(),
                emergency_veto: None,
                boost: &boost,
            },
        );
        return DecisionRecord {
            decision_id,
            ticker: request.ticker.clone(),
            decided_at,
            correction_detected: false,
            correction: None,
            reversal: None,
            scores,
            raw_confidence: 0.0,
            final_confidence: 0.0,
            risk: RiskAssessment::clean(),
            emergency_veto: None,
            boost,
            supervision,
            predicted_return: 0.0,
            reasoning,
        };
    };

    reasoning.push(format!(
        "correction: {:.1}% off peak over {} days, volume spike {:.2}x",
        event.decline_pct * 100.0,
        event.decline_duration_days,
        event.volume_spike_ratio
    ));

    let reversal = ReversalDetector::new(cfg).evaluate(series, indicators);
    reasoning.push(format!(
        "reversal signals confirmed: {}/4",
        reversal.confirmed_count
    ));

    if !reversal.is_confirmed {
        reasoning.push("reversal unconfirmed, scoring skipped".to_string());
        let boost = mapper.map(0.0, request.base_score, true, false);
        let scores = ScoreComponents::default();
        let supervision = supervisor.review(
            &request.ticker,
            &SupervisionContext {
                correction: Some(&event),
                reversal: Some(&reversal),
                scores: &scores,
                final_confidence: 0.0,
                risk: &RiskAssessment::clean(),
                emergency_veto: None,
                boost: &boost,
            },
        );
        return DecisionRecord {
            decision_id,
            ticker: request.ticker.clone(),
            decided_at,
            correction_detected: true,
            correction: Some(event),
            reversal: Some(reversal),
            scores,
            raw_confidence: 0.0,
            final_confidence: 0.0,
            risk: RiskAssessment::clean(),
            emergency_veto: None,
            boost,
            supervision,
            predicted_return: 0.0,
            reasoning,
        };
    }

    let (scores, raw_confidence) =
        OpportunityScorer::new(cfg).score(indicators, fundamentals.health_score, catalyst);
    reasoning.push(format!(
        "scores: oversold {:.0}, fundamental {:.0}, catalyst {:.0} -> confidence {:.3}",
        scores.oversold_score, scores.fundamental_score, scores.catalyst_score, raw_confidence
    ));

    let gate = RiskGate::new(cfg);
    let risk = gate.assess(&request.ticker, fundamentals);
    if !risk.passed {
        let names: Vec<&str> = risk.violations.iter().map(|v| v.as_str()).collect();
        reasoning.push(format!("risk filters failed: {}", names.join(", ")));
    }

    let final_confidence = gate.adjust_confidence(raw_confidence, ctx);
    reasoning.push(format!(
        "regime {} adjusted confidence {:.3} -> {:.3}",
        ctx.regime, raw_confidence, final_confidence
    ));

    let emergency_veto = EmergencyBreaker::new(cfg).check(&request.ticker, ctx, fundamentals);
    if let Some(reason) = &emergency_veto {
        reasoning.push(format!("emergency veto: {}", reason));
    }

    let boost = mapper.map(
        final_confidence,
        request.base_score,
        risk.passed,
        emergency_veto.is_some(),
    );
    reasoning.push(format!(
        "boost tier {} ({:+.0} points) -> final score {:.1}",
        boost.tier, boost.point_adjustment, boost.final_score
    ));

    // Expected partial retrace of the correction, recorded for calibration.
    let predicted_return = if boost.point_adjustment > 0.0 {
        event.decline_pct * final_confidence * 0.5
    } else {
        0.0
    };

    let supervision = supervisor.review(
        &request.ticker,
        &SupervisionContext {
            correction: Some(&event),
            reversal: Some(&reversal),
            scores: &scores,
            final_confidence,
            risk: &risk,
            emergency_veto: emergency_veto.as_deref(),
            boost: &boost,
        },
    );
    reasoning.push(format!("supervision verdict: {}", supervision.verdict));

    DecisionRecord {
        decision_id,
        ticker: request.ticker.clone(),
        decided_at,
        correction_detected: true,
        correction: Some(event),
        reversal: Some(reversal),
        scores,
        raw_confidence,
        final_confidence,
        risk,
        emergency_veto,
        boost,
        supervision,
        predicted_return,
        reasoning,
    }
}

/// A decision record for a ticker whose inputs could not be fetched. The
/// supervisor sees a non-finite confidence and flags it for review.
fn incomplete_record(cfg: &Config, request: &TickerRequest, reason: &str) -> DecisionRecord {
    let decided_at = Utc::now();
    let mapper = BoostMapper::new(cfg);
    let boost = mapper.map(0.0, request.base_score, true, false);
    let scores = ScoreComponents::default();
    let supervision = Supervisor::new(cfg).review(
        &request.ticker,
        &SupervisionContext {
            correction: None,
            reversal: None,
            scores: &scores,
            final_confidence: f64::NAN,
            risk: &RiskAssessment::clean(),
            emergency_veto: None,
            boost: &boost,
        },
    );

    DecisionRecord {
        decision_id: format!("{}-{}", request.ticker, decided_at.timestamp_millis()),
        ticker: request.ticker.clone(),
        decided_at,
        correction_detected: false,
        correction: None,
        reversal: None,
        scores,
        raw_confidence: f64::NAN,
        final_confidence: f64::NAN,
        risk: RiskAssessment::clean(),
        emergency_veto: None,
        boost,
        supervision,
        predicted_return: 0.0,
        reasoning: vec![reason.to_string()],
    }
}

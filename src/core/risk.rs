use tracing::debug;

use crate::config::Config;
use crate::models::{FundamentalSnapshot, MarketContext, Regime, RiskAssessment, RiskViolation};

/// Hard pass/fail risk filters plus the soft regime multiplier.
///
/// All filters are evaluated exhaustively, never short-circuited, so the
/// violation list is complete for audit purposes. Missing instrument data
/// passes a filter (the scorer already degrades to neutral on missing data;
/// the filters only fail on evidence).
pub struct RiskGate {
    max_debt_equity: f64,
    min_dollar_volume: f64,
    min_market_cap: f64,
    max_beta: f64,
    min_listing_age_days: u32,
    bull_multiplier: f64,
    bear_multiplier: f64,
    sector_momentum_adjust: f64,
}

impl RiskGate {
    pub fn new(cfg: &Config) -> Self {
        Self {
            max_debt_equity: cfg.max_debt_equity,
            min_dollar_volume: cfg.min_dollar_volume,
            min_market_cap: cfg.min_market_cap,
            max_beta: cfg.max_beta,
            min_listing_age_days: cfg.min_listing_age_days,
            bull_multiplier: cfg.bull_multiplier,
            bear_multiplier: cfg.bear_multiplier,
            sector_momentum_adjust: cfg.sector_momentum_adjust,
        }
    }

    pub fn assess(&self, ticker: &str, fundamentals: &FundamentalSnapshot) -> RiskAssessment {
        let mut violations = Vec::new();

        if let Some(de) = fundamentals.debt_equity {
            if de > self.max_debt_equity {
                violations.push(RiskViolation::Leverage);
            }
        }
        if let Some(adv) = fundamentals.avg_dollar_volume {
            if adv < self.min_dollar_volume {
                violations.push(RiskViolation::Liquidity);
            }
        }
        if let Some(cap) = fundamentals.market_cap {
            if cap < self.min_market_cap {
                violations.push(RiskViolation::MarketCap);
            }
        }
        if let Some(beta) = fundamentals.beta {
            if beta > self.max_beta {
                violations.push(RiskViolation::Beta);
            }
        }
        if let Some(age) = fundamentals.listing_age_days {
            if age < self.min_listing_age_days {
                violations.push(RiskViolation::ListingAge);
            }
        }

        if !violations.is_empty() {
            debug!(ticker, ?violations, "hard risk filters failed");
        }

        RiskAssessment {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Soft multiplicative regime adjustment. Bull raises confidence, bear
    /// lowers it, uncertain leaves it alone; sector momentum adds a further
    /// +/-10% based on the sector's position against its moving average.
    /// The result never leaves [0,1].
    pub fn adjust_confidence(&self, confidence: f64, ctx: &MarketContext) -> f64 {
        let regime_mult = match ctx.regime {
            Regime::Bull => self.bull_multiplier,
            Regime::Bear => self.bear_multiplier,
            Regime::Uncertain => 1.0,
        };

        let sector_mult = if ctx.sector_vs_ma > 0.0 {
            1.0 + self.sector_momentum_adjust
        } else if ctx.sector_vs_ma < 0.0 {
            1.0 - self.sector_momentum_adjust
        } else {
            1.0
        };

        round3((confidence * regime_mult * sector_mult).clamp(0.0, 1.0))
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounded-magnitude decline from a recent peak. Created transiently per
/// analysis; only exists when the decline is inside the configured band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionEvent {
    pub ticker: String,
    pub peak_price: f64,
    pub peak_timestamp: DateTime<Utc>,
    pub current_price: f64,
    /// Decline from peak as a fraction (0.15 = 15%).
    pub decline_pct: f64,
    pub decline_duration_days: u32,
    /// Max volume-to-rolling-average ratio over the decline window.
    pub volume_spike_ratio: f64,
}

/// Multi-signal evidence that a decline has stabilized or turned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalSignal {
    pub consolidation_confirmed: bool,
    pub ma_cross_confirmed: bool,
    pub momentum_confirmed: bool,
    pub pattern_confirmed: bool,
    pub confirmed_count: usize,
    pub is_confirmed: bool,
}

/// Component scores feeding the confidence blend, each in [0,100].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub oversold_score: f64,
    pub fundamental_score: f64,
    pub catalyst_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskViolation {
    Leverage,
    Liquidity,
    MarketCap,
    Beta,
    ListingAge,
}

impl RiskViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskViolation::Leverage => "leverage",
            RiskViolation::Liquidity => "liquidity",
            RiskViolation::MarketCap => "market_cap",
            RiskViolation::Beta => "beta",
            RiskViolation::ListingAge => "listing_age",
        }
    }
}

impl fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the hard risk filters. Any violation is terminal: the boost is
/// forced to None regardless of confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub passed: bool,
    pub violations: Vec<RiskViolation>,
}

impl RiskAssessment {
    pub fn clean() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostTier {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for BoostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoostTier::None => write!(f, "none"),
            BoostTier::Low => write!(f, "low"),
            BoostTier::Medium => write!(f, "medium"),
            BoostTier::High => write!(f, "high"),
            BoostTier::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// Bounded additive adjustment to an externally computed base score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostDecision {
    pub tier: BoostTier,
    pub point_adjustment: f64,
    pub base_score: f64,
    /// base_score + point_adjustment, capped at the configured ceiling.
    pub final_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Approve,
    Caution,
    Reject,
    Review,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approve => write!(f, "APPROVE"),
            Verdict::Caution => write!(f, "CAUTION"),
            Verdict::Reject => write!(f, "REJECT"),
            Verdict::Review => write!(f, "REVIEW"),
        }
    }
}

/// Independent assessment of a boost decision. One per decision, immutable
/// once created; always produced, even on Review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionVerdict {
    pub verdict: Verdict,
    pub confidence: f64,
    pub alignment_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Flat, serializable roll-up of one ticker's pipeline run, suitable for
/// tabular export by downstream report collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: String,
    pub ticker: String,
    pub decided_at: DateTime<Utc>,
    pub correction_detected: bool,
    pub correction: Option<CorrectionEvent>,
    pub reversal: Option<ReversalSignal>,
    pub scores: ScoreComponents,
    /// Confidence before the regime multiplier.
    pub raw_confidence: f64,
    /// Confidence after regime adjustment, clamped to [0,1].
    pub final_confidence: f64,
    pub risk: RiskAssessment,
    pub emergency_veto: Option<String>,
    pub boost: BoostDecision,
    pub supervision: SupervisionVerdict,
    /// Expected return implied by the decision, used by the calibrator.
    pub predicted_return: f64,
    pub reasoning: Vec<String>,
}

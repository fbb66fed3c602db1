use tracing::warn;

use crate::config::Config;
use crate::core::boost::BoostMapper;
use crate::models::{
    BoostDecision, BoostTier, CorrectionEvent, ReversalSignal, RiskAssessment, ScoreComponents,
    SupervisionVerdict, Verdict,
};

/// Everything the supervisor sees about one decision: the output plus all
/// intermediate artifacts.
pub struct SupervisionContext<'a> {
    pub correction: Option<&'a CorrectionEvent>,
    pub reversal: Option<&'a ReversalSignal>,
    pub scores: &'a ScoreComponents,
    pub final_confidence: f64,
    pub risk: &'a RiskAssessment,
    pub emergency_veto: Option<&'a str>,
    pub boost: &'a BoostDecision,
}

/// Independent re-assessment of every boost decision. This is a check
/// against a fixed set of alignment principles, not a re-derivation; its job
/// is to catch implementation drift and internal inconsistency. A verdict is
/// always produced, never omitted.
pub struct Supervisor {
    approve_confidence: f64,
    caution_boost_factor: f64,
}

impl Supervisor {
    pub fn new(cfg: &Config) -> Self {
        Self {
            approve_confidence: cfg.approve_confidence,
            caution_boost_factor: cfg.caution_boost_factor,
        }
    }

    pub fn review(&self, ticker: &str, ctx: &SupervisionContext<'_>) -> SupervisionVerdict {
        // Unusable inputs: no reliable verdict can be formed.
        if !ctx.final_confidence.is_finite()
            || !ctx.scores.oversold_score.is_finite()
            || !ctx.scores.fundamental_score.is_finite()
            || !ctx.scores.catalyst_score.is_finite()
        {
            warn!(ticker, "supervision inputs not usable, flagging for review");
            return SupervisionVerdict {
                verdict: Verdict::Review,
                confidence: 0.3,
                alignment_issues: vec!["non-finite confidence or score component".to_string()],
                recommendations: vec!["re-run analysis with fresh provider data".to_string()],
            };
        }

        let issues = self.principle_violations(ctx);
        if !issues.is_empty() {
            warn!(ticker, ?issues, "supervision rejected decision");
            return SupervisionVerdict {
                verdict: Verdict::Reject,
                confidence: 0.95,
                alignment_issues: issues,
                recommendations: vec!["discard boost for this ticker".to_string()],
            };
        }

        // No correction established: nothing was proposed, pipeline consistent.
        if ctx.correction.is_none() {
            return SupervisionVerdict {
                verdict: Verdict::Approve,
                confidence: 0.9,
                alignment_issues: Vec::new(),
                recommendations: vec!["no correction event; no action proposed".to_string()],
            };
        }

        let boosted = ctx.boost.tier > BoostTier::None;
        let anomalies = self.soft_anomalies(ctx);

        if boosted && ctx.final_confidence >= self.approve_confidence && anomalies.is_empty() {
            return SupervisionVerdict {
                verdict: Verdict::Approve,
                confidence: 0.9,
                alignment_issues: Vec::new(),
                recommendations: Vec::new(),
            };
        }

        // Gates respected but confidence marginal or a non-fatal anomaly:
        // recommend halving any applied boost.
        let mut recommendations = Vec::new();
        if boosted {
            let halved = ctx.boost.point_adjustment * self.caution_boost_factor;
            recommendations.push(format!(
                "reduce boost from {:+.0} to {:+.1} points",
                ctx.boost.point_adjustment, halved
            ));
        } else {
            recommendations.push("no boost applied; monitor for confirmation".to_string());
        }

        SupervisionVerdict {
            verdict: Verdict::Caution,
            confidence: 0.6,
            alignment_issues: anomalies,
            recommendations,
        }
    }

    /// The fixed alignment principles. Any hit rejects the decision — either
    /// the candidate itself failed a hard gate, or the pipeline proposed a
    /// boost a gate should have zeroed.
    fn principle_violations(&self, ctx: &SupervisionContext<'_>) -> Vec<String> {
        let mut issues = Vec::new();
        let boosted = ctx.boost.tier > BoostTier::None;

        if !ctx.risk.passed {
            let names: Vec<&str> = ctx.risk.violations.iter().map(|v| v.as_str()).collect();
            issues.push(format!("hard risk filters failed: {}", names.join(", ")));
            if boosted {
                issues.push("boost proposed despite failed risk filter".to_string());
            }
        }

        if let Some(reason) = ctx.emergency_veto {
            issues.push(format!("emergency condition active: {}", reason));
            if boosted {
                issues.push("boost proposed despite emergency veto".to_string());
            }
        }

        if boosted {
            match ctx.reversal {
                Some(r) if r.is_confirmed => {}
                _ => issues.push("boost proposed without confirmed reversal".to_string()),
            }
            if ctx.correction.is_none() {
                issues.push("boost proposed without a correction event".to_string());
            }
        }

        for (name, value) in [
            ("oversold", ctx.scores.oversold_score),
            ("fundamental", ctx.scores.fundamental_score),
            ("catalyst", ctx.scores.catalyst_score),
        ] {
            if !(0.0..=100.0).contains(&value) {
                issues.push(format!("{} score out of range: {:.1}", name, value));
            }
        }
        if !(0.0..=1.0).contains(&ctx.final_confidence) {
            issues.push(format!(
                "confidence out of range: {:.3}",
                ctx.final_confidence
            ));
        }

        // Tier must not exceed what the confidence supports.
        if boosted && ctx.boost.point_adjustment > Self::max_points_for(ctx.final_confidence) {
            issues.push(format!(
                "tier {} overstates confidence {:.2}",
                ctx.boost.tier, ctx.final_confidence
            ));
        }

        issues
    }

    /// Non-fatal anomalies: the decision stands but deserves caution.
    fn soft_anomalies(&self, ctx: &SupervisionContext<'_>) -> Vec<String> {
        let mut anomalies = Vec::new();

        if let Some(reversal) = ctx.reversal {
            if ctx.boost.tier > BoostTier::None && reversal.confirmed_count == 2 {
                anomalies.push("reversal confirmed by minimum signal count".to_string());
            }
        }
        if let Some(event) = ctx.correction {
            if ctx.boost.tier > BoostTier::None && event.volume_spike_ratio < 1.5 {
                anomalies.push(format!(
                    "volume spike marginal at {:.2}x",
                    event.volume_spike_ratio
                ));
            }
        }

        anomalies
    }

    fn max_points_for(confidence: f64) -> f64 {
        if confidence >= 0.85 {
            BoostMapper::points(BoostTier::VeryHigh)
        } else if confidence >= 0.70 {
            BoostMapper::points(BoostTier::High)
        } else if confidence >= 0.55 {
            BoostMapper::points(BoostTier::Medium)
        } else if confidence >= 0.40 {
            BoostMapper::points(BoostTier::Low)
        } else {
            0.0
        }
    }
}

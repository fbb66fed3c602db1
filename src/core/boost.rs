use crate::config::Config;
use crate::models::{BoostDecision, BoostTier};

/// Maps final confidence to a bounded, tiered score adjustment. This is the
/// single point where every upstream gate converges: a failed risk
/// assessment or an emergency veto forces tier None regardless of
/// confidence.
pub struct BoostMapper {
    thresholds: crate::config::TierThresholds,
    ceiling: f64,
}

impl BoostMapper {
    pub fn new(cfg: &Config) -> Self {
        Self {
            thresholds: cfg.tier_thresholds.clone(),
            ceiling: cfg.score_ceiling,
        }
    }

    pub fn map(
        &self,
        confidence: f64,
        base_score: f64,
        risk_passed: bool,
        emergency_vetoed: bool,
    ) -> BoostDecision {
        let tier = if !risk_passed || emergency_vetoed {
            BoostTier::None
        } else {
            self.tier_for(confidence)
        };

        let point_adjustment = Self::points(tier);
        BoostDecision {
            tier,
            point_adjustment,
            base_score,
            final_score: (base_score + point_adjustment).min(self.ceiling),
        }
    }

    fn tier_for(&self, confidence: f64) -> BoostTier {
        if confidence >= self.thresholds.very_high {
            BoostTier::VeryHigh
        } else if confidence >= self.thresholds.high {
            BoostTier::High
        } else if confidence >= self.thresholds.medium {
            BoostTier::Medium
        } else if confidence >= self.thresholds.low {
            BoostTier::Low
        } else {
            BoostTier::None
        }
    }

    pub fn points(tier: BoostTier) -> f64 {
        match tier {
            BoostTier::None => 0.0,
            BoostTier::Low => 5.0,
            BoostTier::Medium => 10.0,
            BoostTier::High => 15.0,
            BoostTier::VeryHigh => 20.0,
        }
    }
}

use crate::config::Config;
use crate::models::{CatalystSignal, IndicatorSnapshot, ScoreComponents};

/// Blends oversold, fundamental-health and catalyst strength into a single
/// confidence value in [0,1]. Only invoked on confirmed reversals.
pub struct OpportunityScorer {
    weights: crate::config::ScoreWeights,
    neutral_fundamental: f64,
}

impl OpportunityScorer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            weights: cfg.weights.clone(),
            neutral_fundamental: cfg.neutral_fundamental,
        }
    }

    pub fn score(
        &self,
        indicators: &IndicatorSnapshot,
        fundamental_health: Option<f64>,
        catalyst: Option<&CatalystSignal>,
    ) -> (ScoreComponents, f64) {
        let components = ScoreComponents {
            oversold_score: self.oversold_score(indicators),
            fundamental_score: self.fundamental_score(fundamental_health),
            catalyst_score: self.catalyst_score(catalyst),
        };
        let confidence = self.blend(&components);
        (components, confidence)
    }

    /// Tiered point accumulation from oscillator, band position and volume,
    /// capped at 100. Deeper oversold readings contribute more.
    fn oversold_score(&self, ind: &IndicatorSnapshot) -> f64 {
        let mut score: f64 = 0.0;

        // Oscillator: <=30 deeply oversold, <=40 oversold, <=50 leaning
        if ind.oscillator <= 30.0 {
            score += 40.0;
        } else if ind.oscillator <= 40.0 {
            score += 30.0;
        } else if ind.oscillator <= 50.0 {
            score += 15.0;
        }

        // Band position: near the lower band
        if ind.band_position <= 10.0 {
            score += 35.0;
        } else if ind.band_position <= 25.0 {
            score += 25.0;
        } else if ind.band_position <= 40.0 {
            score += 10.0;
        }

        // Volume participation in the selloff/base
        if ind.volume_ratio >= 2.0 {
            score += 25.0;
        } else if ind.volume_ratio >= 1.5 {
            score += 15.0;
        } else if ind.volume_ratio >= 1.2 {
            score += 5.0;
        }

        score.min(100.0)
    }

    /// Pass-through of the external health score, neutral midpoint when the
    /// provider had nothing. Never fails hard on missing fundamentals.
    fn fundamental_score(&self, health: Option<f64>) -> f64 {
        health
            .map(|h| h.clamp(0.0, 100.0))
            .unwrap_or(self.neutral_fundamental)
    }

    /// External catalyst strength scaled by its own confidence.
    fn catalyst_score(&self, catalyst: Option<&CatalystSignal>) -> f64 {
        match catalyst {
            Some(c) => (c.score.clamp(0.0, 100.0) * c.confidence.clamp(0.0, 1.0)).min(100.0),
            None => 0.0,
        }
    }

    fn blend(&self, c: &ScoreComponents) -> f64 {
        let raw = self.weights.oversold * c.oversold_score / 100.0
            + self.weights.fundamental * c.fundamental_score / 100.0
            + self.weights.catalyst * c.catalyst_score / 100.0;
        round3(raw.clamp(0.0, 1.0))
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{BoostTier, DecisionRecord, Verdict};

/// What the tracker remembers about a decision while waiting for ground
/// truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMeta {
    pub decision_id: String,
    pub ticker: String,
    pub verdict: Verdict,
    pub boosted: bool,
    pub predicted_return: f64,
    pub decided_at: DateTime<Utc>,
}

/// Realized outcome for one decision. Append-only; re-recording the same
/// decision updates in place and never double-counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub decision_id: String,
    pub ticker: String,
    pub predicted_return: f64,
    pub actual_return: f64,
    pub correct: bool,
    pub observed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdDelta {
    pub parameter: String,
    pub delta: f64,
    pub reason: String,
}

/// Rolling calibration statistics. Advisory only: the calibrator recommends
/// threshold changes, it never mutates live thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationState {
    pub precision: f64,
    pub hit_rate: f64,
    pub false_positive_rate: f64,
    pub sample_count: usize,
    pub recommended_threshold_deltas: Vec<ThresholdDelta>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerState {
    decisions: HashMap<String, DecisionMeta>,
    outcomes: HashMap<String, OutcomeRecord>,
}

/// Records realized outcomes against past decisions and maintains the
/// rolling precision/hit-rate statistics that drive threshold-adjustment
/// recommendations. The only long-lived mutable state in the system; all
/// writes are serialized behind a mutex, reads return snapshots.
pub struct OutcomeTracker {
    state: Mutex<TrackerState>,
    success_threshold: f64,
    precision_warning: f64,
    false_positive_warning: f64,
    threshold_delta_step: f64,
    state_file: String,
}

impl OutcomeTracker {
    pub fn new(cfg: &Config) -> Self {
        let tracker = Self {
            state: Mutex::new(TrackerState::default()),
            success_threshold: cfg.success_threshold,
            precision_warning: cfg.precision_warning,
            false_positive_warning: cfg.false_positive_warning,
            threshold_delta_step: cfg.threshold_delta_step,
            state_file: format!("{}/calibration.json", cfg.log_dir),
        };
        tracker.load_state();
        tracker
    }

    /// Registers a freshly produced decision so its outcome can be matched
    /// later.
    pub fn register_decision(&self, record: &DecisionRecord) {
        let meta = DecisionMeta {
            decision_id: record.decision_id.clone(),
            ticker: record.ticker.clone(),
            verdict: record.supervision.verdict,
            boosted: record.boost.tier > BoostTier::None,
            predicted_return: record.predicted_return,
            decided_at: record.decided_at,
        };
        let mut state = self.state.lock().unwrap();
        state.decisions.insert(meta.decision_id.clone(), meta);
    }

    /// Records the realized return for a decision once ground truth is
    /// available. Idempotent per decision_id: recording twice updates in
    /// place, last write wins, with an audit note when the values differ.
    pub fn record_outcome(
        &self,
        decision_id: &str,
        actual_return: f64,
        observed_at: DateTime<Utc>,
    ) {
        let mut state = self.state.lock().unwrap();

        let Some(meta) = state.decisions.get(decision_id).cloned() else {
            warn!(decision_id, "outcome recorded for unknown decision, ignoring");
            return;
        };

        let correct = if meta.boosted {
            actual_return >= self.success_threshold
        } else {
            actual_return < self.success_threshold
        };

        let audit_note = match state.outcomes.get(decision_id) {
            Some(prev) if (prev.actual_return - actual_return).abs() > 1e-9 => {
                warn!(
                    decision_id,
                    previous = prev.actual_return,
                    updated = actual_return,
                    "overwriting outcome with different actual_return"
                );
                Some(format!(
                    "overwrote actual_return {:.4} with {:.4}",
                    prev.actual_return, actual_return
                ))
            }
            Some(prev) => prev.audit_note.clone(),
            None => None,
        };

        state.outcomes.insert(
            decision_id.to_string(),
            OutcomeRecord {
                decision_id: decision_id.to_string(),
                ticker: meta.ticker.clone(),
                predicted_return: meta.predicted_return,
                actual_return,
                correct,
                observed_at,
                audit_note,
            },
        );
        drop(state);

        debug!(decision_id, actual_return, correct, "outcome recorded");
        self.save_state();
    }

    /// Calibration report over all recorded outcomes. Recommendations are
    /// advisory output only.
    pub fn calibration_report(&self) -> CalibrationState {
        let state = self.state.lock().unwrap();

        let total = state.outcomes.len();
        let correct = state.outcomes.values().filter(|o| o.correct).count();
        let precision = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };

        // Approve-verdict decisions with a recorded outcome
        let approved: Vec<&OutcomeRecord> = state
            .outcomes
            .values()
            .filter(|o| {
                state
                    .decisions
                    .get(&o.decision_id)
                    .map_or(false, |d| d.verdict == Verdict::Approve)
            })
            .collect();

        let hit_rate = if approved.is_empty() {
            0.0
        } else {
            approved
                .iter()
                .filter(|o| o.actual_return > self.success_threshold)
                .count() as f64
                / approved.len() as f64
        };

        let false_positive_rate = if approved.is_empty() {
            0.0
        } else {
            approved.iter().filter(|o| o.actual_return <= 0.0).count() as f64
                / approved.len() as f64
        };

        let mut warnings = Vec::new();
        let mut deltas = Vec::new();

        if total > 0 && precision < self.precision_warning {
            warnings.push(format!(
                "precision {:.2} below warning threshold {:.2}",
                precision, self.precision_warning
            ));
            deltas.push(ThresholdDelta {
                parameter: "approve_confidence".to_string(),
                delta: self.threshold_delta_step,
                reason: format!("raise approval bar while precision is {:.2}", precision),
            });
        }
        if !approved.is_empty() && false_positive_rate > self.false_positive_warning {
            warnings.push(format!(
                "false positive rate {:.2} above threshold {:.2}",
                false_positive_rate, self.false_positive_warning
            ));
            deltas.push(ThresholdDelta {
                parameter: "tier_thresholds.low".to_string(),
                delta: self.threshold_delta_step,
                reason: "too many unprofitable approvals; demand more confidence per tier"
                    .to_string(),
            });
        }

        CalibrationState {
            precision: round4(precision),
            hit_rate: round4(hit_rate),
            false_positive_rate: round4(false_positive_rate),
            sample_count: total,
            recommended_threshold_deltas: deltas,
            warnings,
        }
    }

    pub fn outcome(&self, decision_id: &str) -> Option<OutcomeRecord> {
        self.state.lock().unwrap().outcomes.get(decision_id).cloned()
    }

    fn save_state(&self) {
        let state = self.state.lock().unwrap();
        if let Some(parent) = std::path::Path::new(&self.state_file).parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&*state) {
            let _ = fs::write(&self.state_file, json);
        }
    }

    fn load_state(&self) {
        if let Ok(content) = fs::read_to_string(&self.state_file) {
            match serde_json::from_str::<TrackerState>(&content) {
                Ok(loaded) => {
                    let mut state = self.state.lock().unwrap();
                    *state = loaded;
                }
                Err(e) => warn!(file = %self.state_file, "ignoring corrupt calibration state: {}", e),
            }
        }
    }
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

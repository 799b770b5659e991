// ============================================================
// Layer 3 — Evaluation Result and Checkpoint State
// ============================================================
// The result accumulator owned by the experiment orchestrator.
//
// Each metric is an Option: None means "pending", Some means
// "computed, never recompute within this run". Serialised with
// the upper-case keys downstream consumers expect:
//
//   { "TA": 0.91, "UA": 0.12, "RA": 0.97, "MIA": { ... } }
//
// A stored checkpoint moves through four states:
//
//   NoCheckpoint → ModelOnly → PartialResult → FullResult
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Split ────────────────────────────────────────────────────────────────────
/// The four disjoint data splits of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Retain,
    Forget,
    Val,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Retain => "retain",
            Split::Forget => "forget",
            Split::Val    => "val",
            Split::Test   => "test",
        }
    }

    /// Training-style loaders shuffle every split except test.
    pub fn shuffled(&self) -> bool {
        !matches!(self, Split::Test)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Metric ───────────────────────────────────────────────────────────────────
/// Metric keys in the fixed order they are computed and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Test accuracy
    Ta,
    /// Unlearning accuracy: 1 − forget accuracy
    Ua,
    /// Retain accuracy
    Ra,
    /// Membership inference attack on the forget set
    Mia,
}

impl Metric {
    pub const ORDER: [Metric; 4] = [Metric::Ta, Metric::Ua, Metric::Ra, Metric::Mia];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::Ta  => "TA",
            Metric::Ua  => "UA",
            Metric::Ra  => "RA",
            Metric::Mia => "MIA",
        }
    }
}

// ─── MiaResult ────────────────────────────────────────────────────────────────
/// Attack score per membership signal, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MiaResult {
    pub correctness: f64,
    pub confidence:  f64,
    pub entropy:     f64,
    pub m_entropy:   f64,
    pub prob:        f64,
}

impl MiaResult {
    /// Headline score reported alongside TA/UA/RA.
    pub fn score(&self) -> f64 {
        self.confidence
    }
}

// ─── EvaluationResult ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(rename = "TA", default, skip_serializing_if = "Option::is_none")]
    pub ta: Option<f64>,

    #[serde(rename = "UA", default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<f64>,

    #[serde(rename = "RA", default, skip_serializing_if = "Option::is_none")]
    pub ra: Option<f64>,

    #[serde(rename = "MIA", default, skip_serializing_if = "Option::is_none")]
    pub mia: Option<MiaResult>,
}

impl EvaluationResult {
    pub fn contains(&self, metric: Metric) -> bool {
        match metric {
            Metric::Ta  => self.ta.is_some(),
            Metric::Ua  => self.ua.is_some(),
            Metric::Ra  => self.ra.is_some(),
            Metric::Mia => self.mia.is_some(),
        }
    }

    pub fn is_complete(&self) -> bool {
        Metric::ORDER.iter().all(|&m| self.contains(m))
    }

    #[cfg(test)]
    pub fn missing(&self) -> Vec<Metric> {
        Metric::ORDER.iter().copied().filter(|&m| !self.contains(m)).collect()
    }
}

// ─── Checkpoint state machine ─────────────────────────────────────────────────
/// What a restore found on disk: unlearned weights are implied,
/// the result may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checkpoint {
    pub result: Option<EvaluationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointState {
    NoCheckpoint,
    ModelOnly,
    PartialResult,
    FullResult,
}

impl CheckpointState {
    pub fn of(checkpoint: Option<&Checkpoint>) -> Self {
        match checkpoint.map(|c| c.result.as_ref()) {
            None                        => CheckpointState::NoCheckpoint,
            Some(None)                  => CheckpointState::ModelOnly,
            Some(Some(r)) if r.is_complete() => CheckpointState::FullResult,
            Some(Some(_))               => CheckpointState::PartialResult,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mia(v: f64) -> MiaResult {
        MiaResult { correctness: v, confidence: v, entropy: v, m_entropy: v, prob: v }
    }

    #[test]
    fn test_serialises_with_upper_case_keys() {
        let r = EvaluationResult { ta: Some(0.5), ua: Some(0.25), ..Default::default() };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["TA"], 0.5);
        assert_eq!(json["UA"], 0.25);
        assert!(json.get("RA").is_none());
        assert!(json.get("MIA").is_none());
    }

    #[test]
    fn test_missing_keeps_report_order() {
        let r = EvaluationResult { ua: Some(0.1), mia: Some(mia(0.3)), ..Default::default() };
        assert_eq!(r.missing(), vec![Metric::Ta, Metric::Ra]);
    }

    #[test]
    fn test_checkpoint_states() {
        assert_eq!(CheckpointState::of(None), CheckpointState::NoCheckpoint);

        let model_only = Checkpoint { result: None };
        assert_eq!(CheckpointState::of(Some(&model_only)), CheckpointState::ModelOnly);

        let partial = Checkpoint {
            result: Some(EvaluationResult { ta: Some(0.9), ..Default::default() }),
        };
        assert_eq!(CheckpointState::of(Some(&partial)), CheckpointState::PartialResult);

        let full = Checkpoint {
            result: Some(EvaluationResult {
                ta:  Some(0.9),
                ua:  Some(0.1),
                ra:  Some(0.95),
                mia: Some(mia(0.4)),
            }),
        };
        assert_eq!(CheckpointState::of(Some(&full)), CheckpointState::FullResult);
    }

    #[test]
    fn test_mia_score_is_confidence() {
        let m = MiaResult { correctness: 0.1, confidence: 0.7, entropy: 0.2, m_entropy: 0.3, prob: 0.4 };
        assert_eq!(m.score(), 0.7);
    }
}

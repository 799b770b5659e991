// ============================================================
// Layer 5 — Membership Inference Attack
// ============================================================
// Shadow members are retain samples, shadow non-members are test
// samples (equal-length, unshuffled). For each attack feature an RBF
// SVC learns member vs non-member from the model's softmax outputs
// and is then applied to the targets:
//
//   target_train  score = predicted member rate
//   target_test   score = 1 − predicted member rate
//
// The feature score is the mean over present targets. With
// `target_test = forget` a high score means forgotten samples look
// like held-out data. An empty shadow split leaves nothing to fit,
// so every feature scores 0.

use anyhow::Result;
use burn::{data::dataloader::DataLoader, prelude::*, tensor::activation::softmax};

use crate::data::loaders::BatchLoader;
use crate::domain::result::MiaResult;
use crate::ml::model::TextClassifier;
use crate::ml::svm::{Svc, SvcConfig};

const LOG_FLOOR: f64 = 1e-30;

/// Softmax outputs and true labels of one split.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub probs:  Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl Outputs {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Run `model` over `loader` in inference mode and collect per-sample
/// class probabilities.
pub fn collect_prob<B: Backend>(loader: &BatchLoader<B>, model: &TextClassifier<B>) -> Result<Outputs> {
    let mut out = Outputs::default();
    for batch in loader.iter() {
        if batch.size() == 0 {
            continue;
        }
        let probs = softmax(model.forward(batch.input_ids, batch.attention_mask), 1);
        let nb_class = probs.dims()[1];
        let flat: Vec<f32> = probs
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("reading probabilities: {e:?}"))?;
        let labels: Vec<i64> = batch
            .labels
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("reading labels: {e:?}"))?;

        out.probs.extend(flat.chunks(nb_class).map(|row| row.iter().map(|&p| p as f64).collect()));
        out.labels.extend(labels.into_iter().map(|l| l as usize));
    }
    Ok(out)
}

// ─── Attack features ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Correctness,
    Confidence,
    Entropy,
    ModifiedEntropy,
    Prob,
}

impl Feature {
    pub fn rows(self, outputs: &Outputs) -> Vec<Vec<f64>> {
        outputs
            .probs
            .iter()
            .zip(&outputs.labels)
            .map(|(p, &y)| match self {
                Feature::Correctness     => vec![correctness(p, y)],
                Feature::Confidence      => vec![confidence(p, y)],
                Feature::Entropy         => vec![entropy(p)],
                Feature::ModifiedEntropy => vec![m_entropy(p, y)],
                Feature::Prob            => p.clone(),
            })
            .collect()
    }
}

fn argmax(p: &[f64]) -> usize {
    p.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

pub fn correctness(p: &[f64], label: usize) -> f64 {
    if argmax(p) == label { 1.0 } else { 0.0 }
}

pub fn confidence(p: &[f64], label: usize) -> f64 {
    p.get(label).copied().unwrap_or(0.0)
}

/// −Σ pᵢ log pᵢ
pub fn entropy(p: &[f64]) -> f64 {
    -p.iter().map(|&v| v * v.max(LOG_FLOOR).ln()).sum::<f64>()
}

/// Song & Mittal (2021):
/// −(1 − p_y) log p_y − Σ_{i≠y} pᵢ log(1 − pᵢ)
pub fn m_entropy(p: &[f64], label: usize) -> f64 {
    p.iter()
        .enumerate()
        .map(|(i, &v)| {
            if i == label {
                -(1.0 - v) * v.max(LOG_FLOOR).ln()
            } else {
                -v * (1.0 - v).max(LOG_FLOOR).ln()
            }
        })
        .sum()
}

// ─── Attack ───────────────────────────────────────────────────────────────────
/// Fit the attack on one feature and score the targets.
pub fn svc_fit_predict(
    feature:      Feature,
    shadow_train: &Outputs,
    shadow_test:  &Outputs,
    target_train: Option<&Outputs>,
    target_test:  Option<&Outputs>,
    config:       &SvcConfig,
) -> Result<f64> {
    let mut x = feature.rows(shadow_train);
    x.extend(feature.rows(shadow_test));
    let mut y = vec![true; shadow_train.len()];
    y.extend(std::iter::repeat(false).take(shadow_test.len()));

    let svc = Svc::fit(&x, &y, config)?;
    let member_rate = |outputs: &Outputs| -> Option<f64> {
        if outputs.is_empty() {
            return None;
        }
        let rows = feature.rows(outputs);
        let members = rows.iter().filter(|row| svc.predict(row)).count();
        Some(members as f64 / rows.len() as f64)
    };

    let scores: Vec<f64> = [
        target_train.and_then(member_rate),
        target_test.and_then(member_rate).map(|rate| 1.0 - rate),
    ]
    .into_iter()
    .flatten()
    .collect();

    if scores.is_empty() {
        return Ok(0.0);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Collect the model's outputs on every loader and run the attack for
/// all five features.
pub fn svc_mia<B: Backend>(
    shadow_train: &BatchLoader<B>,
    shadow_test:  &BatchLoader<B>,
    target_train: Option<&BatchLoader<B>>,
    target_test:  Option<&BatchLoader<B>>,
    model:        &TextClassifier<B>,
) -> Result<MiaResult> {
    let shadow_train = collect_prob(shadow_train, model)?;
    let shadow_test  = collect_prob(shadow_test, model)?;
    if shadow_train.is_empty() || shadow_test.is_empty() {
        tracing::warn!(
            shadow_train = shadow_train.len(),
            shadow_test = shadow_test.len(),
            "Empty shadow split; reporting a zero attack score",
        );
        return Ok(MiaResult::default());
    }
    let target_train = target_train.map(|l| collect_prob(l, model)).transpose()?;
    let target_test  = target_test.map(|l| collect_prob(l, model)).transpose()?;

    let config = SvcConfig::default();
    let score = |feature| {
        svc_fit_predict(feature, &shadow_train, &shadow_test, target_train.as_ref(), target_test.as_ref(), &config)
    };

    let result = MiaResult {
        correctness: score(Feature::Correctness)?,
        confidence:  score(Feature::Confidence)?,
        entropy:     score(Feature::Entropy)?,
        m_entropy:   score(Feature::ModifiedEntropy)?,
        prob:        score(Feature::Prob)?,
    };
    tracing::info!(?result, "Membership inference attack finished");
    Ok(result)
}

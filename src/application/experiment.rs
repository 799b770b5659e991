// ============================================================
// Layer 2 — Experiment State Machine
// ============================================================
// Sequences one unlearning experiment over any ExperimentSteps:
//
//   restore ──┬── checkpoint found, no rerun ──► seed result
//             └── absent or rerun ──► unlearn ──► persist(None)
//
//   for metric in [TA, UA, RA, MIA]:
//       if missing: compute ──► insert ──► persist(result)
//
// Every completed step is persisted before the next begins, so
// an interrupted run resumes at the first missing metric and
// never re-runs the unlearning procedure. A fully stored result
// is returned without writing anything.

use anyhow::Result;

use crate::domain::result::{CheckpointState, EvaluationResult, Metric, Split};
use crate::domain::traits::ExperimentSteps;

/// Drive `steps` to a complete evaluation result.
pub fn run_experiment<S: ExperimentSteps>(steps: &mut S, rerun: bool) -> Result<EvaluationResult> {
    let restored = if rerun { None } else { steps.restore()? };
    let state = CheckpointState::of(restored.as_ref());
    tracing::info!("Checkpoint state: {:?} (rerun={})", state, rerun);

    let mut result = match restored {
        Some(checkpoint) => checkpoint.result.unwrap_or_default(),
        None => {
            steps.unlearn()?;
            steps.persist(None)?;
            tracing::info!("Unlearning finished and checkpoint saved");
            EvaluationResult::default()
        }
    };

    for metric in Metric::ORDER {
        if result.contains(metric) {
            tracing::debug!("{} already computed, skipping", metric.key());
            continue;
        }
        compute_metric(steps, metric, &mut result)?;
        steps.persist(Some(&result))?;
    }

    Ok(result)
}

fn compute_metric<S: ExperimentSteps>(
    steps:  &mut S,
    metric: Metric,
    result: &mut EvaluationResult,
) -> Result<()> {
    match metric {
        Metric::Ta => {
            let ta = steps.accuracy(Split::Test)?;
            println!("TA  {:.4}", ta);
            result.ta = Some(ta);
        }
        Metric::Ua => {
            let ua = 1.0 - steps.accuracy(Split::Forget)?;
            println!("UA  {:.4}", ua);
            result.ua = Some(ua);
        }
        Metric::Ra => {
            let ra = steps.accuracy(Split::Retain)?;
            println!("RA  {:.4}", ra);
            result.ra = Some(ra);
        }
        Metric::Mia => {
            let mia = steps.membership_attack()?;
            println!("MIA {:.4} {:?}", mia.score(), mia);
            result.mia = Some(mia);
        }
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::{Checkpoint, MiaResult};

    /// Records every call so tests can check what ran.
    #[derive(Default)]
    struct Recorder {
        stored:        Option<Checkpoint>,
        calls:         Vec<String>,
        persisted:     Vec<Option<EvaluationResult>>,
        fail_on:       Option<Split>,
    }

    impl Recorder {
        fn with_stored(result: Option<EvaluationResult>) -> Self {
            Self { stored: Some(Checkpoint { result }), ..Default::default() }
        }
    }

    fn mia(v: f64) -> MiaResult {
        MiaResult { correctness: v, confidence: v, entropy: v, m_entropy: v, prob: v }
    }

    impl ExperimentSteps for Recorder {
        fn restore(&mut self) -> Result<Option<Checkpoint>> {
            self.calls.push("restore".into());
            Ok(self.stored.clone())
        }

        fn unlearn(&mut self) -> Result<()> {
            self.calls.push("unlearn".into());
            Ok(())
        }

        fn accuracy(&mut self, split: Split) -> Result<f64> {
            self.calls.push(format!("accuracy:{split}"));
            if self.fail_on == Some(split) {
                anyhow::bail!("device lost");
            }
            Ok(match split {
                Split::Test   => 0.8,
                Split::Forget => 0.75,
                Split::Retain => 0.9,
                Split::Val    => 0.0,
            })
        }

        fn membership_attack(&mut self) -> Result<MiaResult> {
            self.calls.push("mia".into());
            Ok(mia(0.6))
        }

        fn persist(&mut self, result: Option<&EvaluationResult>) -> Result<()> {
            self.persisted.push(result.cloned());
            self.stored = Some(Checkpoint { result: result.cloned() });
            Ok(())
        }
    }

    #[test]
    fn test_fresh_run_unlearns_then_computes_in_order() {
        let mut steps = Recorder::default();
        let result = run_experiment(&mut steps, false).unwrap();

        assert_eq!(
            steps.calls,
            vec!["restore", "unlearn", "accuracy:test", "accuracy:forget", "accuracy:retain", "mia"]
        );
        assert_eq!(result.ta, Some(0.8));
        assert_eq!(result.ua, Some(0.25));
        assert_eq!(result.ra, Some(0.9));
        assert_eq!(result.mia, Some(mia(0.6)));

        // first save has no result, then one save per metric
        assert_eq!(steps.persisted.len(), 5);
        assert_eq!(steps.persisted[0], None);
        assert_eq!(steps.persisted[1].as_ref().unwrap().missing().len(), 3);
    }

    #[test]
    fn test_resume_computes_only_missing_metrics() {
        let stored = EvaluationResult { ta: Some(0.11), ua: Some(0.22), ..Default::default() };
        let mut steps = Recorder::with_stored(Some(stored));

        let result = run_experiment(&mut steps, false).unwrap();

        assert_eq!(steps.calls, vec!["restore", "accuracy:retain", "mia"]);
        assert_eq!(result.ta, Some(0.11));
        assert_eq!(result.ua, Some(0.22));
        assert_eq!(result.ra, Some(0.9));
        assert!(result.mia.is_some());
    }

    #[test]
    fn test_full_result_skips_everything() {
        let stored = EvaluationResult {
            ta:  Some(0.1),
            ua:  Some(0.2),
            ra:  Some(0.3),
            mia: Some(mia(0.4)),
        };
        let mut steps = Recorder::with_stored(Some(stored.clone()));

        let result = run_experiment(&mut steps, false).unwrap();

        assert_eq!(steps.calls, vec!["restore"]);
        assert!(steps.persisted.is_empty());
        assert_eq!(result, stored);
    }

    #[test]
    fn test_model_only_checkpoint_skips_unlearning() {
        let mut steps = Recorder::with_stored(None);
        run_experiment(&mut steps, false).unwrap();
        assert!(!steps.calls.contains(&"unlearn".to_string()));
        assert_eq!(steps.calls.len(), 5);
    }

    #[test]
    fn test_rerun_ignores_stored_result() {
        let stored = EvaluationResult { ta: Some(0.01), ..Default::default() };
        let mut steps = Recorder::with_stored(Some(stored));

        let result = run_experiment(&mut steps, true).unwrap();

        assert_eq!(steps.calls[0], "unlearn");
        assert_eq!(result.ta, Some(0.8));
    }

    #[test]
    fn test_failure_keeps_earlier_metrics_persisted() {
        let mut steps = Recorder { fail_on: Some(Split::Retain), ..Default::default() };
        assert!(run_experiment(&mut steps, false).is_err());

        let saved = steps.stored.clone().unwrap().result.unwrap();
        assert_eq!(saved.ta, Some(0.8));
        assert_eq!(saved.ua, Some(0.25));
        assert_eq!(saved.ra, None);

        // the next run picks up at RA without unlearning again
        steps.fail_on = None;
        steps.calls.clear();
        let result = run_experiment(&mut steps, false).unwrap();
        assert_eq!(steps.calls, vec!["restore", "accuracy:retain", "mia"]);
        assert!(result.is_complete());
    }
}

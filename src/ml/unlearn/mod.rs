// ============================================================
// Layer 5 — Unlearning Method Registry
// ============================================================
// Every unlearning procedure satisfies one contract:
//
//   (split loaders, model, criterion, settings) → updated model
//
// Burn modules are values, so "mutating the model" means taking
// it by value and returning the updated one. The registry maps
// names to procedures; it is built once at startup and passed
// by reference into the experiment.
//
//   raw        no-op baseline
//   FT, FT_l1  fine-tune on retain (optionally with L1 penalty)
//   GA, GA_l1  gradient ascent on forget (optionally with L1)
//   RL         random labels on forget, true labels on retain
//   retrain    fresh model trained on retain only
//   fisher, fisher_new, wfisher
//              Fisher-information based parameter updates

use anyhow::Result;
use burn::{nn::loss::CrossEntropyLoss, tensor::backend::AutodiffBackend};
use std::collections::BTreeMap;

use crate::data::loaders::SplitLoaders;
use crate::domain::error::HarnessError;
use crate::ml::model::{TextClassifier, TextClassifierConfig};

pub mod fisher;
pub mod gradient;

/// Hyper-parameters shared by all procedures.
#[derive(Debug, Clone)]
pub struct UnlearnSettings {
    pub epochs: usize,
    pub lr:     f64,
    /// L1 strength for *_l1 methods, noise/step scale for Fisher methods
    pub alpha:  f64,
    pub seed:   u64,
    /// Architecture used when a method needs a fresh model
    pub model:  TextClassifierConfig,
}

pub trait UnlearnMethod<B: AutodiffBackend> {
    fn name(&self) -> &'static str;

    /// Whether the model must hold fine-tuned weights before `unlearn`.
    fn needs_pretrained(&self) -> bool {
        true
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        model:     TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>>;
}

// ─── raw ──────────────────────────────────────────────────────────────────────
pub struct Raw;

impl<B: AutodiffBackend> UnlearnMethod<B> for Raw {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn unlearn(
        &self,
        _loaders:   &SplitLoaders<B>,
        model:      TextClassifier<B>,
        _criterion: &CrossEntropyLoss<B>,
        _settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        Ok(model)
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────
pub struct UnlearnRegistry<B: AutodiffBackend> {
    methods: BTreeMap<&'static str, Box<dyn UnlearnMethod<B>>>,
}

impl<B: AutodiffBackend> UnlearnRegistry<B> {
    pub fn empty() -> Self {
        Self { methods: BTreeMap::new() }
    }

    /// Registry holding every built-in method.
    pub fn standard() -> Self {
        use fisher::{Fisher, FisherVariant};
        use gradient::{FineTune, GradientAscent, RandomLabel, Retrain};

        let mut registry = Self::empty();
        registry.register(Box::new(Raw));
        registry.register(Box::new(RandomLabel));
        registry.register(Box::new(GradientAscent { l1: false }));
        registry.register(Box::new(GradientAscent { l1: true }));
        registry.register(Box::new(FineTune { l1: false }));
        registry.register(Box::new(FineTune { l1: true }));
        registry.register(Box::new(Fisher { variant: FisherVariant::Retain }));
        registry.register(Box::new(Fisher { variant: FisherVariant::ForgetRatio }));
        registry.register(Box::new(Retrain));
        registry.register(Box::new(Fisher { variant: FisherVariant::Newton }));
        registry
    }

    pub fn register(&mut self, method: Box<dyn UnlearnMethod<B>>) {
        self.methods.insert(method.name(), method);
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn UnlearnMethod<B>, HarnessError> {
        self.methods
            .get(name)
            .map(|m| m.as_ref())
            .ok_or_else(|| HarnessError::MethodNotImplemented(name.to_string()))
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&'static str> {
        self.methods.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{tiny_config, toy_loaders, toy_settings, TestBackend};
    use burn::nn::loss::CrossEntropyLossConfig;

    #[test]
    fn test_registry_covers_every_method_name() {
        let registry = UnlearnRegistry::<TestBackend>::standard();
        for name in ["raw", "RL", "GA", "GA_l1", "FT", "FT_l1", "fisher", "fisher_new", "retrain", "wfisher"] {
            let method = registry.resolve(name).unwrap();
            assert_eq!(method.name(), name);
        }
        assert_eq!(registry.names().len(), 10);
    }

    #[test]
    fn test_unknown_name_fails() {
        let registry = UnlearnRegistry::<TestBackend>::standard();
        let err = registry.resolve("SCRUB").err().unwrap();
        assert!(matches!(err, HarnessError::MethodNotImplemented(ref n) if n == "SCRUB"));
        assert!(registry.resolve("ft").is_err());
    }

    #[test]
    fn test_only_retrain_skips_pretrained() {
        let registry = UnlearnRegistry::<TestBackend>::standard();
        let without: Vec<_> = registry
            .names()
            .into_iter()
            .filter(|n| !registry.resolve(n).unwrap().needs_pretrained())
            .collect();
        assert_eq!(without, vec!["retrain"]);
    }

    #[test]
    fn test_raw_leaves_weights_untouched() {
        let device = Default::default();
        let model = tiny_config(2).init::<TestBackend>(&device);
        let before = model.classifier.weight.val().into_data();
        let ce = CrossEntropyLossConfig::new().init(&device);

        let after = Raw.unlearn(&toy_loaders([8, 4, 2, 4], 5), model, &ce, &toy_settings()).unwrap();

        assert_eq!(after.classifier.weight.val().into_data(), before);
    }
}

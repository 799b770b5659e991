// ============================================================
// Layer 3 — Harness Error Taxonomy
// ============================================================
// Typed failures the harness can raise. Everything else is
// propagated as anyhow::Error with context attached.
//
// Reference: Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

/// Failures with a meaning the caller may want to match on.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The registry has no procedure under this name
    #[error("Unlearn method {0} not implemented!")]
    MethodNotImplemented(String),

    /// A non-`retrain` method needs a fine-tuned model to start from
    #[error("pretrained checkpoint not found at '{}'; run `finetune` first", .path.display())]
    MissingPretrained { path: PathBuf },

    /// The stored model was fine-tuned on a different label set
    #[error("stored model has {stored} classes but the corpus has {corpus}")]
    ClassCountMismatch { stored: usize, corpus: usize },

    /// Forget ratio must lie in [0, 1)
    #[error("forget ratio {0} is outside [0, 1)")]
    InvalidForgetRatio(f64),

    /// Two split masks both claim the same sample
    #[error("split masks overlap at sample {index}")]
    OverlappingMasks { index: usize },

    /// No split mask claims this sample
    #[error("sample {index} is not covered by any split mask")]
    UncoveredSample { index: usize },

    /// Text file and meta file disagree on the document count
    #[error("corpus has {texts} documents but {labels} labels")]
    CorpusMismatch { texts: usize, labels: usize },

    /// A meta line could not be parsed
    #[error("malformed meta line {line}: '{content}'")]
    MalformedMeta { line: usize, content: String },

    /// A train line appears after the first test line
    #[error("meta line {line} is a train document after the test block")]
    TrainAfterTest { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_names_the_method() {
        let e = HarnessError::MethodNotImplemented("SCRUB".into());
        assert_eq!(e.to_string(), "Unlearn method SCRUB not implemented!");
    }
}

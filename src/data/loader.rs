// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a TextGCN-style corpus from disk:
//
//   {data_dir}/{dataset}_shuffle.txt          meta, one line per doc:
//                                             name<TAB>train|test<TAB>label
//   {data_dir}/corpus/{dataset}_shuffle.txt   text, one line per doc
//
// Meta lines and text lines are aligned by position. Train lines
// must come first and test lines last; a train line after the
// first test line is rejected. The class set is the sorted list
// of distinct labels.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::{fs, path::PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::corpus::Corpus;
use crate::domain::error::HarnessError;
use crate::domain::traits::CorpusSource;

/// One parsed meta line; the document name is not kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub is_train: bool,
    pub label:    String,
}

pub struct CorpusLoader {
    data_dir:  PathBuf,
    dataset:   String,
    val_ratio: f64,
}

impl CorpusLoader {
    pub fn new(data_dir: impl Into<PathBuf>, dataset: impl Into<String>, val_ratio: f64) -> Self {
        Self { data_dir: data_dir.into(), dataset: dataset.into(), val_ratio }
    }

    pub fn meta_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}_shuffle.txt", self.dataset))
    }

    pub fn text_path(&self) -> PathBuf {
        self.data_dir.join("corpus").join(format!("{}_shuffle.txt", self.dataset))
    }
}

impl CorpusSource for CorpusLoader {
    fn load(&self) -> Result<Corpus> {
        let meta_path = self.meta_path();
        let meta_raw = fs::read_to_string(&meta_path)
            .with_context(|| format!("Cannot read meta file '{}'", meta_path.display()))?;
        let meta = parse_meta(&meta_raw)?;

        let text_path = self.text_path();
        let text_raw = fs::read_to_string(&text_path)
            .with_context(|| format!("Cannot read corpus file '{}'", text_path.display()))?;
        let texts = split_documents(&text_raw);

        let train_size = meta.iter().filter(|m| m.is_train).count();
        let test_size  = meta.len() - train_size;

        let class_names: Vec<String> = meta
            .iter()
            .map(|m| m.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let labels: Vec<usize> = meta
            .iter()
            .map(|m| class_names.binary_search(&m.label).unwrap_or_default())
            .collect();

        tracing::info!(
            "Loaded '{}': {} documents ({} train, {} test), {} classes",
            self.dataset, texts.len(), train_size, test_size, class_names.len(),
        );

        Ok(Corpus::from_sizes(texts, labels, class_names, train_size, test_size, self.val_ratio)?)
    }
}

/// Parse meta lines, skipping blank ones. Fails on a malformed
/// line or on a train line that follows a test line.
pub fn parse_meta(raw: &str) -> Result<Vec<MetaEntry>, HarnessError> {
    let mut entries = Vec::new();
    let mut seen_test = false;
    for (i, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let entry = match (fields.next(), fields.next(), fields.next()) {
            (Some(_name), Some(split), Some(label)) => MetaEntry {
                is_train: split.contains("train"),
                label:    label.trim().to_string(),
            },
            _ => return Err(HarnessError::MalformedMeta { line: i + 1, content: line.to_string() }),
        };
        if entry.is_train && seen_test {
            return Err(HarnessError::TrainAfterTest { line: i + 1 });
        }
        seen_test |= !entry.is_train;
        entries.push(entry);
    }
    Ok(entries)
}

/// Clean each line of the corpus file; a trailing newline does
/// not produce an extra empty document.
pub fn split_documents(raw: &str) -> Vec<String> {
    let prep = Preprocessor::new();
    raw.lines().map(|line| prep.clean(line)).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = "d0\ttrain\tsport\nd1\ttrain\tpolitics\nd2\ttrain\tsport\nd3\ttest\tpolitics\n";
    const TEXT: &str = "goal scored\\n late\nvote passed\nmatch drawn\nelection held\n";

    fn write_corpus(dir: &std::path::Path) {
        fs::create_dir_all(dir.join("corpus")).unwrap();
        fs::write(dir.join("toy_shuffle.txt"), META).unwrap();
        fs::write(dir.join("corpus").join("toy_shuffle.txt"), TEXT).unwrap();
    }

    #[test]
    fn test_parse_meta() {
        let meta = parse_meta(META).unwrap();
        assert_eq!(meta.len(), 4);
        assert!(meta[0].is_train);
        assert!(!meta[3].is_train);
        assert_eq!(meta[1].label, "politics");
    }

    #[test]
    fn test_malformed_meta_line() {
        let err = parse_meta("ok\ttrain\ta\nbroken line\n").unwrap_err();
        assert!(matches!(err, HarnessError::MalformedMeta { line: 2, .. }));
    }

    #[test]
    fn test_train_line_after_test_block_is_rejected() {
        let err = parse_meta("a\ttrain\tx\nb\ttest\ty\n\nc\ttrain\tx\n").unwrap_err();
        assert!(matches!(err, HarnessError::TrainAfterTest { line: 4 }));
    }

    #[test]
    fn test_load_rejects_interleaved_splits() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("corpus")).unwrap();
        fs::write(dir.path().join("mixed_shuffle.txt"), "d0\ttest\ta\nd1\ttrain\tb\n").unwrap();
        fs::write(dir.path().join("corpus").join("mixed_shuffle.txt"), "one\ntwo\n").unwrap();

        let err = CorpusLoader::new(dir.path(), "mixed", 0.0).load().unwrap_err();

        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::TrainAfterTest { line: 2 })));
    }

    #[test]
    fn test_load_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let corpus = CorpusLoader::new(dir.path(), "toy", 0.0).load().unwrap();

        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.class_names, vec!["politics", "sport"]);
        assert_eq!(corpus.labels, vec![1, 0, 1, 0]);
        assert_eq!(corpus.train_size, 3);
        assert_eq!(corpus.test_size, 1);
        assert_eq!(corpus.texts[0], "goal scoredn late");
    }

    #[test]
    fn test_missing_files_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = CorpusLoader::new(dir.path(), "absent", 0.1).load().unwrap_err();
        assert!(err.to_string().contains("absent_shuffle.txt"));
    }
}

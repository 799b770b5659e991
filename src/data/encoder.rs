// ============================================================
// Layer 4 — Corpus Encoder
// ============================================================
// Turns every document of the corpus into an EncodedSample:
//
//   [CLS] token ids [SEP]   truncated to max_length
//   [PAD] ...               up to the longest encoded document
//
// The whole corpus is padded together before it is partitioned,
// so every split shares one sequence length.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::dataset::EncodedSample;
use crate::domain::corpus::Corpus;

pub const PAD_ID: u32 = 0;
pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

pub fn encode_corpus(
    corpus:     &Corpus,
    tokenizer:  &Tokenizer,
    max_length: usize,
) -> Result<Vec<EncodedSample>> {
    let max_length = max_length.max(2);

    let mut sequences = Vec::with_capacity(corpus.len());
    for text in &corpus.texts {
        let enc = tokenizer
            .encode(text.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut ids = Vec::with_capacity(max_length);
        ids.push(CLS_ID);
        ids.extend(enc.get_ids().iter().take(max_length - 2));
        ids.push(SEP_ID);
        sequences.push(ids);
    }

    let padded_len = sequences.iter().map(Vec::len).max().unwrap_or(2);
    tracing::debug!("Encoded {} documents, padded length {}", sequences.len(), padded_len);

    let samples = sequences
        .into_iter()
        .zip(&corpus.labels)
        .map(|(mut input_ids, &label)| {
            let real = input_ids.len();
            let mut attention_mask = vec![1u32; real];
            input_ids.resize(padded_len, PAD_ID);
            attention_mask.resize(padded_len, 0);
            EncodedSample { input_ids, attention_mask, label }
        })
        .collect();

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;

    fn corpus(texts: &[&str]) -> Corpus {
        let n = texts.len();
        Corpus::from_sizes(
            texts.iter().map(|t| t.to_string()).collect(),
            (0..n).map(|i| i % 2).collect(),
            vec!["a".into(), "b".into()],
            n,
            0,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_padding_and_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let c = corpus(&["one two three four five six", "one", "two three"]);
        let tok = TokenizerStore::new(dir.path()).load_or_build(&c.texts, 100).unwrap();

        let samples = encode_corpus(&c, &tok, 5).unwrap();

        assert!(samples.iter().all(|s| s.input_ids.len() == 5));
        // longest doc: [CLS] + 3 tokens + [SEP]
        assert_eq!(samples[0].input_ids[0], CLS_ID);
        assert_eq!(samples[0].input_ids[4], SEP_ID);
        assert_eq!(samples[0].attention_mask, vec![1, 1, 1, 1, 1]);
        // "one" → [CLS] one [SEP] [PAD] [PAD]
        assert_eq!(samples[1].attention_mask, vec![1, 1, 1, 0, 0]);
        assert_eq!(samples[1].input_ids[3], PAD_ID);
        assert_eq!(samples[2].label, 0);
    }

    #[test]
    fn test_pads_to_longest_not_max_length() {
        let dir = tempfile::tempdir().unwrap();
        let c = corpus(&["a b", "a"]);
        let tok = TokenizerStore::new(dir.path()).load_or_build(&c.texts, 100).unwrap();

        let samples = encode_corpus(&c, &tok, 128).unwrap();
        assert_eq!(samples[0].input_ids.len(), 4);
    }
}

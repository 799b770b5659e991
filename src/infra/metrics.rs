// ============================================================
// Layer 6 — Results Logger
// ============================================================
// Appends one CSV row per finished experiment so runs across
// methods and forget ratios can be compared in one table.
//
// Output file: {checkpoint_dir}/results.csv
//
//   dataset,model,method,forget_ratio,TA,UA,RA,MIA
//   R8,tiny,GA,0.1,0.912300,0.204100,0.958800,0.731000
//
// MIA is the headline (confidence) attack score. A metric that
// is missing is written as an empty cell.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::result::EvaluationResult;

const HEADER: &str = "dataset,model,method,forget_ratio,TA,UA,RA,MIA";

/// One experiment's identity plus its result
#[derive(Debug, Clone)]
pub struct ResultRow<'a> {
    pub dataset:      &'a str,
    pub model:        &'a str,
    pub method:       &'a str,
    pub forget_ratio: f64,
    pub result:       &'a EvaluationResult,
}

impl ResultRow<'_> {
    pub fn to_csv(&self) -> String {
        let cell = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
        format!(
            "{},{},{},{},{},{},{},{}",
            self.dataset,
            self.model,
            self.method,
            self.forget_ratio,
            cell(self.result.ta),
            cell(self.result.ua),
            cell(self.result.ra),
            cell(self.result.mia.map(|m| m.score())),
        )
    }
}

pub struct ResultsLogger {
    csv_path: PathBuf,
}

impl ResultsLogger {
    /// Writes the header if the file does not exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("results.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created results CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, row: &ResultRow<'_>) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{}", row.to_csv())?;

        tracing::debug!(method = row.method, forget_ratio = row.forget_ratio, "Logged experiment result");
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::MiaResult;

    #[test]
    fn test_row_formats_missing_cells_empty() {
        let result = EvaluationResult { ta: Some(0.5), ra: Some(1.0), ..Default::default() };
        let row = ResultRow { dataset: "R8", model: "tiny", method: "raw", forget_ratio: 0.1, result: &result };
        assert_eq!(row.to_csv(), "R8,tiny,raw,0.1,0.500000,,1.000000,");
    }

    #[test]
    fn test_appends_rows_under_single_header() {
        let tmp = tempfile::tempdir().unwrap();
        let mia = MiaResult { correctness: 0.1, confidence: 0.75, entropy: 0.2, m_entropy: 0.3, prob: 0.4 };
        let result = EvaluationResult { ta: Some(0.9), ua: Some(0.2), ra: Some(0.95), mia: Some(mia) };

        for method in ["GA", "FT"] {
            let logger = ResultsLogger::new(tmp.path()).unwrap();
            let row = ResultRow { dataset: "R8", model: "tiny", method, forget_ratio: 0.2, result: &result };
            logger.log(&row).unwrap();
        }

        let csv = fs::read_to_string(tmp.path().join("results.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("R8,tiny,GA,0.2,"));
        assert!(lines[2].ends_with(",0.750000"));
    }
}

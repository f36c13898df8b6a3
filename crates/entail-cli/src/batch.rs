//! CSV batch comparison harness
//!
//! Rows are isolated: a malformed row or a predicate the core rejects is
//! counted as failed and the run continues.

use anyhow::{Context, Result};
use entail_core::Comparator;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Row {
    predicate: String,
    diversified_predicate: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub ok: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} compared, {} failed", self.ok, self.failed)
    }
}

pub fn run(comparator: &Comparator, input: &Path) -> Result<Summary> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("opening {}", input.display()))?;

    let mut summary = Summary::default();
    for (index, record) in reader.deserialize::<Row>().enumerate() {
        // Header occupies the first line
        let line = index + 2;
        match record {
            Err(error) => {
                tracing::warn!(line, %error, "skipping malformed row");
                println!("row {line}: error: {error}");
                summary.failed += 1;
            }
            Ok(row) => match comparator.compare(&row.predicate, &row.diversified_predicate) {
                Ok(verdict) => {
                    println!("row {line}: {verdict}");
                    summary.ok += 1;
                }
                Err(error) => {
                    tracing::warn!(line, %error, "comparison failed");
                    println!("row {line}: error: {error}");
                    summary.failed += 1;
                }
            },
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_all_rows_compared() {
        let file = write_csv(
            "predicate,diversified_predicate\n\
             a > 12,a > 13\n\
             msg.sender == msg.origin,msg.origin == msg.sender\n",
        );
        let summary = run(&Comparator::new(), file.path()).unwrap();
        assert_eq!(summary, Summary { ok: 2, failed: 0 });
    }

    #[test]
    fn test_failing_row_does_not_abort() {
        let file = write_csv(
            "predicate,diversified_predicate\n\
             a > 12,a >\n\
             a > 12,a > 13\n\
             a % 2 == 0,a == 0\n",
        );
        let summary = run(&Comparator::new(), file.path()).unwrap();
        assert_eq!(summary, Summary { ok: 1, failed: 2 });
    }

    #[test]
    fn test_missing_column_counts_as_failed() {
        let file = write_csv("predicate\na > 12\n");
        let summary = run(&Comparator::new(), file.path()).unwrap();
        assert_eq!(summary.ok, 0);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(run(&Comparator::new(), Path::new("/nonexistent/batch.csv")).is_err());
    }
}

// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records embedding-training metrics to a CSV file after each
// epoch, next to the trained model.
//
// Metrics recorded per epoch:
//   - epoch:    the epoch number (1, 2, 3, ...)
//   - examples: number of training examples drawn that epoch
//   - loss:     average negative-sampling loss over the batches
//
// Output file: <processed dir>/<model_name>_metrics.csv
//
//   epoch,examples,loss
//   1,1830022,2.481203
//   2,1829517,2.104880
//
// With negative = k, an untrained model scores (k + 1) * ln 2;
// the loss should fall well below that within a few epochs.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Examples produced by the sampler this epoch; varies with
    /// subsampling and window draws
    pub examples: usize,

    /// Average loss over all batches of the epoch
    pub loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, examples: usize, loss: f64) -> Self {
        Self { epoch, examples, loss }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a logger writing to `dir/file_name`.
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to one log.
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join(file_name);

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,examples,loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{},{:.6}", m.epoch, m.examples, m.loss)?;

        tracing::debug!("Logged epoch {} metrics: loss={:.4}", m.epoch, m.loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "m.csv").unwrap();
        logger.log(&EpochMetrics::new(1, 10, 2.0794415)).unwrap();
        logger.log(&EpochMetrics::new(2, 12, 1.5)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["epoch,examples,loss", "1,10,2.079442", "2,12,1.500000"]);
    }

    #[test]
    fn test_existing_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path(), "m.csv").unwrap()
            .log(&EpochMetrics::new(1, 1, 1.0)).unwrap();
        let again = MetricsLogger::new(dir.path(), "m.csv").unwrap();
        again.log(&EpochMetrics::new(1, 1, 1.0)).unwrap();

        let text = fs::read_to_string(again.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}

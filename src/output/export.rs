//! JSON exports of the merged dataset and the record log

use crate::output::traits::{OutputHandler, OutputResult};
use crate::pipeline::Listing;
use crate::storage::RecordLogEntry;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the dataset as one pretty JSON object and the log as JSON lines
#[derive(Debug, Clone)]
pub struct JsonExporter {
    dataset_path: PathBuf,
    record_log_path: PathBuf,
}

impl JsonExporter {
    pub fn new(dataset_path: impl Into<PathBuf>, record_log_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            record_log_path: record_log_path.into(),
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn record_log_path(&self) -> &Path {
        &self.record_log_path
    }
}

fn create(path: &Path) -> OutputResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

impl OutputHandler for JsonExporter {
    fn write_dataset(&self, listings: &BTreeMap<String, Listing>) -> OutputResult<()> {
        let mut out = create(&self.dataset_path)?;
        serde_json::to_writer_pretty(&mut out, listings)?;
        out.write_all(b"\n")?;
        out.flush()?;
        tracing::info!("Wrote {} listings to {}", listings.len(), self.dataset_path.display());
        Ok(())
    }

    fn write_record_log(&self, entries: &[RecordLogEntry]) -> OutputResult<()> {
        let mut out = create(&self.record_log_path)?;
        for entry in entries {
            serde_json::to_writer(&mut out, entry)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        tracing::info!(
            "Wrote {} record log entries to {}",
            entries.len(),
            self.record_log_path.display()
        );
        Ok(())
    }
}

//! CSV dataset storage.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::RecordSink;
use crate::domain::{CaptureDataset, PacketRecord};
use crate::error::SinkError;

/// Header row of the persisted dataset.
pub const CSV_HEADER: [&str; 2] = ["Source IP", "Destination IP"];

/// Where captures are written when no path is given.
pub const DEFAULT_OUTPUT_PATH: &str = "packet_log.csv";

/// Stores datasets as `Source IP,Destination IP` CSV files.
///
/// Saves go to a temporary file in the destination directory which is then
/// renamed over the target.
pub struct CsvSink;

impl CsvSink {
    /// Create a new CSV sink.
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for CsvSink {
    fn save(&self, dataset: &[PacketRecord], path: &Path) -> Result<(), SinkError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        debug!("Writing {} records to {:?}", dataset.len(), tmp.path());

        {
            // Header written by hand so an empty dataset still gets one.
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut tmp);
            writer.write_record(CSV_HEADER)?;
            for record in dataset {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!("Saved {} records to {}", dataset.len(), path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<CaptureDataset, SinkError> {
        if !path.exists() {
            return Err(SinkError::DatasetNotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let headers = reader.headers()?;
        if !headers.iter().map(str::trim).eq(CSV_HEADER) {
            return Err(SinkError::InvalidHeader {
                path: path.to_path_buf(),
                found: headers.iter().map(str::to_string).collect(),
            });
        }

        let dataset = reader
            .deserialize()
            .collect::<Result<CaptureDataset, csv::Error>>()?;

        debug!("Loaded {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }
}

//! Dataset persistence.
//!
//! This module defines the `RecordSink` trait and the CSV implementation
//! shared by the capture run and the display/stats commands.

mod csv_sink;

pub use csv_sink::{CsvSink, CSV_HEADER, DEFAULT_OUTPUT_PATH};

use std::path::Path;

use crate::domain::{CaptureDataset, PacketRecord};
use crate::error::SinkError;

/// Trait for durable dataset storage.
pub trait RecordSink {
    /// Persist `dataset` at `path`, replacing whatever was there.
    ///
    /// Readers of `path` see either the previous file or the complete new
    /// one, never a partial write.
    fn save(&self, dataset: &[PacketRecord], path: &Path) -> Result<(), SinkError>;

    /// Load a dataset previously written by `save`.
    fn load(&self, path: &Path) -> Result<CaptureDataset, SinkError>;
}

//! Reporting module for saved capture datasets.
//!
//! This module defines the `DatasetReporter` trait (ISP, DIP) and provides
//! terminal renderings of a loaded dataset. Reporters never capture; they
//! only read what `RecordSink::load` returns.

mod histogram;
mod table;

pub use histogram::{source_counts, SourceHistogram, MAX_WIDTH};
pub use table::TableReporter;

use std::io::{self, Write};

use crate::domain::PacketRecord;

/// Trait for rendering a dataset (Interface Segregation Principle).
pub trait DatasetReporter {
    /// Render the dataset as text.
    fn render(&self, dataset: &[PacketRecord]) -> String;

    /// Write the rendering to stdout.
    fn report(&self, dataset: &[PacketRecord]) {
        let output = self.render(dataset);
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", output);
    }
}

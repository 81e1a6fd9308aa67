//! Tabular dataset display.

use std::fmt::Write;

use crate::domain::PacketRecord;
use crate::reporter::DatasetReporter;
use crate::sink::CSV_HEADER;

/// Renders records as a numbered two-column table.
pub struct TableReporter {
    /// Print at most this many rows
    limit: Option<usize>,
}

impl TableReporter {
    /// Create a new table reporter.
    pub fn new() -> Self {
        Self { limit: None }
    }

    /// Only show the first `limit` rows.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetReporter for TableReporter {
    fn render(&self, dataset: &[PacketRecord]) -> String {
        let shown = self.limit.unwrap_or(dataset.len()).min(dataset.len());
        let index_width = shown.saturating_sub(1).to_string().len();

        let sources: Vec<String> = dataset[..shown].iter().map(|r| r.source.to_string()).collect();
        let source_width = sources
            .iter()
            .map(String::len)
            .chain(std::iter::once(CSV_HEADER[0].len()))
            .max()
            .unwrap_or(0);

        let mut output = String::from("\n--- Packet Data ---\n");
        let _ = writeln!(
            output,
            "{:>iw$}  {:<sw$}  {}",
            "",
            CSV_HEADER[0],
            CSV_HEADER[1],
            iw = index_width,
            sw = source_width
        );

        for (i, (record, source)) in dataset.iter().zip(&sources).enumerate() {
            let _ = writeln!(
                output,
                "{:>iw$}  {:<sw$}  {}",
                i,
                source,
                record.destination,
                iw = index_width,
                sw = source_width
            );
        }

        if shown < dataset.len() {
            let _ = writeln!(output, "... {} more rows", dataset.len() - shown);
        }
        let _ = writeln!(output, "\n[{} rows x 2 columns]", dataset.len());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn record(src: [u8; 4], dst: [u8; 4]) -> PacketRecord {
        PacketRecord::new(Ipv4Addr::from(src), Ipv4Addr::from(dst))
    }

    #[test]
    fn test_render_rows() {
        let dataset = vec![
            record([10, 0, 0, 5], [10, 0, 0, 1]),
            record([192, 168, 100, 200], [8, 8, 8, 8]),
        ];

        let output = TableReporter::new().render(&dataset);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[1], "--- Packet Data ---");
        assert_eq!(lines[2], "   Source IP        Destination IP");
        assert_eq!(lines[3], "0  10.0.0.5         10.0.0.1");
        assert_eq!(lines[4], "1  192.168.100.200  8.8.8.8");
        assert!(output.ends_with("[2 rows x 2 columns]\n"));
    }

    #[test]
    fn test_render_with_limit() {
        let dataset: Vec<_> = (1..=5).map(|i| record([10, 0, 0, i], [10, 0, 0, 1])).collect();

        let output = TableReporter::new().with_limit(Some(2)).render(&dataset);

        assert!(output.contains("1  10.0.0.2"));
        assert!(!output.contains("10.0.0.3 "));
        assert!(output.contains("... 3 more rows"));
        assert!(output.contains("[5 rows x 2 columns]"));
    }

    #[test]
    fn test_render_empty() {
        let output = TableReporter::new().render(&[]);
        assert!(output.contains("Source IP"));
        assert!(output.contains("[0 rows x 2 columns]"));
    }
}

//! Source address frequency chart.

use std::collections::HashMap;
use std::fmt::Write;
use std::net::Ipv4Addr;

use crate::domain::PacketRecord;
use crate::reporter::DatasetReporter;

/// Default bar length for the most frequent source
const DEFAULT_WIDTH: usize = 50;
/// Longest bar that will be drawn
pub const MAX_WIDTH: usize = 1000;

/// Count packets per source address.
///
/// Sorted by descending count; ties keep the order in which sources first
/// appeared in the trace.
pub fn source_counts(dataset: &[PacketRecord]) -> Vec<(Ipv4Addr, usize)> {
    let mut index: HashMap<Ipv4Addr, usize> = HashMap::new();
    let mut counts: Vec<(Ipv4Addr, usize)> = Vec::new();

    for record in dataset {
        match index.get(&record.source) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(record.source, counts.len());
                counts.push((record.source, 1));
            }
        }
    }

    // Stable sort preserves first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Horizontal bar chart of packets per source address.
pub struct SourceHistogram {
    /// Length of the longest bar in characters
    width: usize,
    /// Show only the most frequent sources
    top: Option<usize>,
}

impl SourceHistogram {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            top: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.clamp(1, MAX_WIDTH);
        self
    }

    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }
}

impl Default for SourceHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetReporter for SourceHistogram {
    fn render(&self, dataset: &[PacketRecord]) -> String {
        let mut counts = source_counts(dataset);
        let distinct = counts.len();
        if let Some(top) = self.top {
            counts.truncate(top);
        }

        let mut output = String::from("\nPacket Source IP Distribution\n");
        let Some(&(_, max)) = counts.first() else {
            output.push_str("(no packets)\n");
            return output;
        };

        let label_width = counts
            .iter()
            .map(|(ip, _)| ip.to_string().len())
            .max()
            .unwrap_or(0);

        for (ip, count) in &counts {
            // Round to nearest, but never hide a source entirely
            let len = (count.saturating_mul(self.width).saturating_add(max / 2) / max).max(1);
            let _ = writeln!(
                output,
                "{:<lw$} | {} {}",
                ip.to_string(),
                "#".repeat(len),
                count,
                lw = label_width
            );
        }
        let _ = writeln!(
            output,
            "{} packets from {} source addresses",
            dataset.len(),
            distinct
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_sources(sources: &[[u8; 4]]) -> Vec<PacketRecord> {
        sources
            .iter()
            .map(|&src| PacketRecord::new(Ipv4Addr::from(src), Ipv4Addr::new(10, 0, 0, 1)))
            .collect()
    }

    #[test]
    fn test_source_counts_order() {
        let dataset = from_sources(&[
            [10, 0, 0, 9],
            [10, 0, 0, 5],
            [10, 0, 0, 5],
            [10, 0, 0, 7],
            [10, 0, 0, 9],
            [10, 0, 0, 5],
        ]);

        let counts = source_counts(&dataset);
        assert_eq!(
            counts,
            vec![
                (Ipv4Addr::new(10, 0, 0, 5), 3),
                (Ipv4Addr::new(10, 0, 0, 9), 2),
                (Ipv4Addr::new(10, 0, 0, 7), 1),
            ]
        );
    }

    #[test]
    fn test_source_counts_tie_keeps_first_seen() {
        let dataset = from_sources(&[[1, 1, 1, 1], [2, 2, 2, 2], [2, 2, 2, 2], [1, 1, 1, 1]]);
        let counts = source_counts(&dataset);
        assert_eq!(counts[0].0, Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(counts[1].0, Ipv4Addr::new(2, 2, 2, 2));
    }

    #[test]
    fn test_render_scales_bars() {
        let dataset = from_sources(&[
            [10, 0, 0, 5],
            [10, 0, 0, 5],
            [10, 0, 0, 5],
            [10, 0, 0, 5],
            [192, 168, 1, 2],
        ]);

        let output = SourceHistogram::new().with_width(8).render(&dataset);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[1], "Packet Source IP Distribution");
        assert_eq!(lines[2], "10.0.0.5    | ######## 4");
        assert_eq!(lines[3], "192.168.1.2 | ## 1");
        assert_eq!(lines[4], "5 packets from 2 source addresses");
    }

    #[test]
    fn test_render_clamps_huge_width() {
        let dataset = from_sources(&[[10, 0, 0, 5], [10, 0, 0, 5], [10, 0, 0, 6]]);

        let output = SourceHistogram::new()
            .with_width(usize::MAX / 2 + 1)
            .render(&dataset);
        let longest = output
            .lines()
            .map(|line| line.matches('#').count())
            .max()
            .unwrap();
        assert_eq!(longest, MAX_WIDTH);
        assert!(output.contains(&format!("{} 1", "#".repeat(MAX_WIDTH / 2))));
    }

    #[test]
    fn test_render_top() {
        let dataset = from_sources(&[[10, 0, 0, 5], [10, 0, 0, 5], [10, 0, 0, 6]]);
        let output = SourceHistogram::new().with_top(Some(1)).render(&dataset);
        assert!(output.contains("10.0.0.5"));
        assert!(!output.contains("10.0.0.6 |"));
        assert!(output.contains("3 packets from 2 source addresses"));
    }

    #[test]
    fn test_render_empty() {
        let output = SourceHistogram::new().render(&[]);
        assert!(output.contains("(no packets)"));
    }
}

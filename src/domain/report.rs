//! Outcome of a capture run.

use std::fmt;

use super::CaptureDataset;

/// Why the receive loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every requested receive attempt was made.
    Completed,
    /// The socket failed; the remaining attempts were abandoned.
    SocketError(String),
    /// The running flag was cleared (Ctrl+C).
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::SocketError(msg) => write!(f, "socket error: {}", msg),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Result of a capture run whose dataset was persisted.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Records that were parsed and saved
    pub dataset: CaptureDataset,
    /// Receive attempts made (each consumes one unit of the packet count)
    pub attempts: usize,
    /// Attempts whose packet could not be decoded
    pub skipped: usize,
    /// How the loop ended
    pub stop: StopReason,
    /// Whether promiscuous mode was on for the capture
    pub promiscuous: bool,
}

impl CaptureReport {
    /// Whether every requested attempt ran.
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed
    }
}

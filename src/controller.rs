//! Bounded capture run orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capture::{CaptureSession, SessionState};
use crate::config::CaptureConfig;
use crate::domain::{CaptureReport, StopReason};
use crate::error::{CaptureError, ControllerError};
use crate::parser::HeaderParser;
use crate::sink::{CsvSink, RecordSink};

/// Drives one capture run: open, receive, parse, close, save.
///
/// Every run makes exactly `packet_count` receive attempts unless the socket
/// fails or the running flag is cleared. Packets too short to decode use up
/// their attempt and are not retried, which keeps the run length bounded.
pub struct CaptureController<R = CsvSink> {
    parser: HeaderParser,
    sink: R,
    running: Option<Arc<AtomicBool>>,
}

impl CaptureController<CsvSink> {
    /// Create a controller that saves to CSV.
    pub fn new() -> Self {
        Self::with_sink(CsvSink::new())
    }
}

impl Default for CaptureController<CsvSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RecordSink> CaptureController<R> {
    pub fn with_sink(sink: R) -> Self {
        Self {
            parser: HeaderParser::new(),
            sink,
            running: None,
        }
    }

    /// Stop early, keeping what was captured, once `running` goes false.
    ///
    /// Only takes effect between receives, so the session should be opened
    /// with a poll interval.
    pub fn with_running(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    /// Run one capture and persist its records to `config.output_path`.
    ///
    /// `open` acquires the session. If it fails nothing is written and the
    /// error is returned. Once it succeeds the session is always closed and
    /// whatever was captured is saved, including after a socket error.
    pub fn run<S, F>(&self, config: &CaptureConfig, open: F) -> Result<CaptureReport, ControllerError>
    where
        S: CaptureSession,
        F: FnOnce() -> Result<S, CaptureError>,
    {
        config.validate()?;

        let mut session = open()?;

        if let Err(e) = session.set_promiscuous(true) {
            warn!("{}; continuing without promiscuous mode", e);
        }
        let promiscuous = session.state() == SessionState::PromiscuousEnabled;

        info!(
            "Capturing {} packets on {} ({})",
            config.packet_count,
            session.interface_name(),
            if promiscuous { "promiscuous" } else { "non-promiscuous" }
        );

        let mut report = self.capture_loop(&mut session, config);
        report.promiscuous = promiscuous;
        session.close();

        match &report.stop {
            StopReason::Completed => info!(
                "Packet capture completed: {} records, {} skipped",
                report.dataset.len(),
                report.skipped
            ),
            stop => warn!(
                "Packet capture stopped early ({}) after {} of {} packets",
                stop, report.attempts, config.packet_count
            ),
        }

        self.sink.save(&report.dataset, &config.output_path)?;
        Ok(report)
    }

    fn capture_loop<S: CaptureSession>(&self, session: &mut S, config: &CaptureConfig) -> CaptureReport {
        let mut dataset = Vec::with_capacity(config.packet_count.min(4096));
        let mut attempts = 0;
        let mut skipped = 0;

        let stop = loop {
            if attempts == config.packet_count {
                break StopReason::Completed;
            }
            if !self.is_running() {
                break StopReason::Interrupted;
            }

            let data = match session.receive(config.buffer_size) {
                Ok(data) => data,
                // Idle poll interval, not a packet
                Err(CaptureError::TimedOut) => continue,
                Err(e) => {
                    warn!("Receive failed: {}", e);
                    break StopReason::SocketError(e.to_string());
                }
            };
            attempts += 1;

            match self.parser.parse(&data) {
                Ok(record) => {
                    debug!("Packet {}: {}", attempts, record);
                    dataset.push(record);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping packet {}: {}", attempts, e);
                }
            }
        };

        CaptureReport {
            dataset,
            attempts,
            skipped,
            stop,
            promiscuous: false,
        }
    }

    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(true)
    }
}

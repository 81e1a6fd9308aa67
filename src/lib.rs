//! netmon - raw socket IPv4 address monitor.
//!
//! Captures datagrams from a raw socket, records their source and
//! destination addresses, and saves the trace as a two-column CSV file.
//! Opening the socket needs root (or `CAP_NET_RAW`).

pub mod capture;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod sink;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use capture::{CaptureProtocol, CaptureSession, RawSocketSession, SessionOptions};
pub use config::{CaptureConfig, Config};
pub use controller::CaptureController;
pub use domain::{CaptureDataset, CaptureReport, PacketRecord, StopReason};
pub use error::{CaptureError, ConfigError, ControllerError, ParseError, SinkError};
pub use parser::HeaderParser;
pub use sink::{CsvSink, RecordSink, DEFAULT_OUTPUT_PATH};

/// Capture `packet_count` packets from a raw socket and save them to
/// `config.output_path` (`packet_log.csv` unless configured otherwise).
///
/// When `running` is given the capture stops early once it is cleared.
pub fn capture_packets(
    config: &Config,
    packet_count: usize,
    running: Option<Arc<AtomicBool>>,
) -> Result<CaptureReport, ControllerError> {
    let capture_config = config.capture_config(packet_count);
    let options = config.session_options();

    let mut controller = CaptureController::new();
    if let Some(running) = running {
        controller = controller.with_running(running);
    }
    controller.run(&capture_config, || RawSocketSession::open(&options))
}

/// Load a dataset saved by a previous capture.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<CaptureDataset, SinkError> {
    CsvSink::new().load(path.as_ref())
}

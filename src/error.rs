//! Error types for each layer of the capture pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while acquiring or driving a raw capture socket.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("permission denied opening raw socket: run netmon as root (or with CAP_NET_RAW)")]
    PermissionDenied,

    #[error("promiscuous mode unavailable: {0}")]
    PromiscuousModeUnavailable(String),

    #[error("no suitable interface: {0}")]
    InterfaceNotFound(String),

    #[error("receive timed out")]
    TimedOut,

    #[error("socket I/O error: {0}")]
    SocketIo(#[source] io::Error),
}

impl CaptureError {
    /// Classify an I/O error coming back from socket creation or bind.
    pub fn from_open(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
            _ => CaptureError::SocketIo(err),
        }
    }

    /// Classify an I/O error coming back from a receive call.
    pub fn from_receive(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => CaptureError::TimedOut,
            _ => CaptureError::SocketIo(err),
        }
    }
}

/// Errors raised while decoding a captured datagram.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated packet: need at least {expected} bytes, got {actual}")]
    TruncatedPacket { expected: usize, actual: usize },
}

/// Errors raised while persisting or loading a dataset.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("no packet data found at {0}. Please capture packets first.")]
    DatasetNotFound(PathBuf),

    #[error("unexpected header in {path}: {found:?}")]
    InvalidHeader { path: PathBuf, found: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that end a capture run.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to save capture: {0}")]
    Sink(#[from] SinkError),
}

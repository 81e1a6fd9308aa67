//! Domain models for packet address capture.
//!
//! These types are independent of the socket and storage layers.

mod record;
mod report;

pub use record::{CaptureDataset, PacketRecord};
pub use report::{CaptureReport, StopReason};

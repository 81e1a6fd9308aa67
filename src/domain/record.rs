//! Captured packet records.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Addresses observed on one captured datagram.
///
/// Serialized with the column names of the persisted CSV dataset, so the
/// addresses appear as dotted-quad strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketRecord {
    #[serde(rename = "Source IP")]
    pub source: Ipv4Addr,
    #[serde(rename = "Destination IP")]
    pub destination: Ipv4Addr,
}

impl PacketRecord {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl fmt::Display for PacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Records of one capture run, in arrival order.
pub type CaptureDataset = Vec<PacketRecord>;

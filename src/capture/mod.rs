//! Packet capture abstraction.
//!
//! This module defines the `CaptureSession` trait (DIP) and provides a
//! raw-socket implementation. The controller only sees the trait, so tests
//! drive it with simulated sessions.

mod promisc;
mod raw_socket;

pub use raw_socket::{list_interfaces, RawSocketSession};

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use socket2::Protocol;

use crate::error::CaptureError;

/// Default receive buffer size: the largest possible IPv4 datagram.
pub const DEFAULT_BUFFER_SIZE: usize = 65535;

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    PromiscuousEnabled,
    Capturing,
    Closed,
}

/// Trait for capture sessions (Dependency Inversion Principle).
///
/// A session is acquired by its constructor and released exactly once,
/// either by `close` or, on early exit, by `Drop`.
pub trait CaptureSession {
    /// Toggle promiscuous reception.
    ///
    /// Fails with `CaptureError::PromiscuousModeUnavailable` where the
    /// platform or interface cannot do it; callers treat that as non-fatal.
    fn set_promiscuous(&mut self, enabled: bool) -> Result<(), CaptureError>;

    /// Block until one datagram arrives and return up to `buffer_size` bytes of it.
    fn receive(&mut self, buffer_size: usize) -> Result<Vec<u8>, CaptureError>;

    /// Disable promiscuous mode (best-effort) and release the socket.
    fn close(self)
    where
        Self: Sized;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Name of the interface the session is bound to.
    fn interface_name(&self) -> &str;
}

/// IP protocol requested from the raw socket.
///
/// Windows delivers every protocol on `IPPROTO_IP`. Linux rejects protocol 0
/// for `AF_INET` raw sockets, so a concrete protocol has to be chosen there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureProtocol {
    Ip,
    Tcp,
    Udp,
    Icmp,
}

impl CaptureProtocol {
    pub fn to_protocol(self) -> Protocol {
        match self {
            CaptureProtocol::Ip => Protocol::from(0),
            CaptureProtocol::Tcp => Protocol::TCP,
            CaptureProtocol::Udp => Protocol::UDP,
            CaptureProtocol::Icmp => Protocol::ICMPV4,
        }
    }
}

impl Default for CaptureProtocol {
    #[cfg(windows)]
    fn default() -> Self {
        CaptureProtocol::Ip
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        CaptureProtocol::Tcp
    }
}

impl FromStr for CaptureProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ip" => Ok(CaptureProtocol::Ip),
            "tcp" => Ok(CaptureProtocol::Tcp),
            "udp" => Ok(CaptureProtocol::Udp),
            "icmp" => Ok(CaptureProtocol::Icmp),
            other => Err(format!(
                "unknown protocol '{}' (expected ip, tcp, udp or icmp)",
                other
            )),
        }
    }
}

impl fmt::Display for CaptureProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureProtocol::Ip => write!(f, "ip"),
            CaptureProtocol::Tcp => write!(f, "tcp"),
            CaptureProtocol::Udp => write!(f, "udp"),
            CaptureProtocol::Icmp => write!(f, "icmp"),
        }
    }
}

/// How a raw socket session is acquired.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Local address to bind; overrides interface discovery
    pub bind_address: Option<Ipv4Addr>,
    /// Interface whose first IPv4 address is bound
    pub interface: Option<String>,
    /// Protocol handed to the kernel when creating the socket
    pub protocol: CaptureProtocol,
    /// Read timeout so a blocked receive can notice interruption.
    /// `None` blocks until a datagram arrives.
    pub poll_interval: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("tcp".parse::<CaptureProtocol>(), Ok(CaptureProtocol::Tcp));
        assert_eq!("UDP".parse::<CaptureProtocol>(), Ok(CaptureProtocol::Udp));
        assert_eq!("icmp".parse::<CaptureProtocol>(), Ok(CaptureProtocol::Icmp));
        assert_eq!("ip".parse::<CaptureProtocol>(), Ok(CaptureProtocol::Ip));
        assert!("sctp".parse::<CaptureProtocol>().is_err());
    }

    #[test]
    fn test_protocol_display_round_trips() {
        for proto in [
            CaptureProtocol::Ip,
            CaptureProtocol::Tcp,
            CaptureProtocol::Udp,
            CaptureProtocol::Icmp,
        ] {
            assert_eq!(proto.to_string().parse::<CaptureProtocol>(), Ok(proto));
        }
    }

    #[test]
    fn test_default_options_block() {
        let options = SessionOptions::default();
        assert!(options.poll_interval.is_none());
        assert!(options.bind_address.is_none());
        assert_eq!(options.protocol, CaptureProtocol::default());
    }
}

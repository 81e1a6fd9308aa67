//! Raw IPv4 socket capture session.

use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};

use pnet::datalink::{self, NetworkInterface};
use socket2::{Domain, Socket, Type};
use tracing::{debug, info, warn};

use super::{promisc, CaptureSession, SessionOptions, SessionState};
use crate::error::CaptureError;

/// Capture session over an `AF_INET` raw socket with `IP_HDRINCL` set.
///
/// Dropping the session performs the same teardown as `close`, so the
/// socket is released and promiscuous mode reverted on every exit path.
pub struct RawSocketSession {
    socket: Option<Socket>,
    interface: String,
    state: SessionState,
    /// Promiscuous mode is on because of this session
    promisc_active: bool,
    /// Promiscuous mode was already on before this session touched it
    promisc_preexisting: bool,
}

impl RawSocketSession {
    /// Open a raw socket bound to the host's primary IPv4 address.
    ///
    /// Requires root or `CAP_NET_RAW`; without it this fails with
    /// `CaptureError::PermissionDenied`.
    pub fn open(options: &SessionOptions) -> Result<Self, CaptureError> {
        let (interface, local_addr) = resolve_bind_target(options)?;

        let socket = Socket::new(
            Domain::IPV4,
            Type::RAW,
            Some(options.protocol.to_protocol()),
        )
        .map_err(CaptureError::from_open)?;

        socket
            .bind(&SocketAddrV4::new(local_addr, 0).into())
            .map_err(CaptureError::from_open)?;
        socket
            .set_header_included(true)
            .map_err(CaptureError::from_open)?;
        socket
            .set_read_timeout(options.poll_interval)
            .map_err(CaptureError::from_open)?;

        info!(
            "Opened raw {} socket on {} ({})",
            options.protocol, interface, local_addr
        );

        Ok(Self {
            socket: Some(socket),
            interface,
            state: SessionState::Open,
            promisc_active: false,
            promisc_preexisting: false,
        })
    }

    fn socket(&self) -> Result<&Socket, CaptureError> {
        self.socket.as_ref().ok_or_else(|| {
            CaptureError::SocketIo(io::Error::new(
                io::ErrorKind::NotConnected,
                "capture session is closed",
            ))
        })
    }

    fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if self.promisc_active {
            if let Err(e) = self.set_promiscuous(false) {
                warn!("Error disabling promiscuous mode: {}", e);
            }
        }

        self.socket = None;
        self.state = SessionState::Closed;
        info!("Closed raw socket on {}", self.interface);
    }
}

impl CaptureSession for RawSocketSession {
    fn set_promiscuous(&mut self, enabled: bool) -> Result<(), CaptureError> {
        let socket = self.socket()?;

        if enabled {
            if self.promisc_active {
                return Ok(());
            }
            let preexisting = promisc::enable(socket, &self.interface)?;
            self.promisc_preexisting = preexisting;
            self.promisc_active = true;
            self.state = SessionState::PromiscuousEnabled;
            info!("Promiscuous mode enabled on {}", self.interface);
            return Ok(());
        }

        if !self.promisc_active {
            return Ok(());
        }
        if self.promisc_preexisting {
            debug!(
                "Leaving promiscuous mode on {}: it was set before capture",
                self.interface
            );
        } else {
            promisc::disable(socket, &self.interface)?;
            info!("Promiscuous mode disabled on {}", self.interface);
        }
        self.promisc_active = false;
        Ok(())
    }

    fn receive(&mut self, buffer_size: usize) -> Result<Vec<u8>, CaptureError> {
        if self.state != SessionState::Closed {
            self.state = SessionState::Capturing;
        }
        let mut socket = self.socket()?;
        let mut buf = vec![0u8; buffer_size];

        loop {
            match socket.read(&mut buf) {
                Ok(len) => {
                    buf.truncate(len);
                    return Ok(buf);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CaptureError::from_receive(e)),
            }
        }
    }

    fn close(mut self) {
        self.teardown();
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn interface_name(&self) -> &str {
        &self.interface
    }
}

impl Drop for RawSocketSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Pick the interface name and local address the socket binds to.
fn resolve_bind_target(options: &SessionOptions) -> Result<(String, Ipv4Addr), CaptureError> {
    let interfaces = datalink::interfaces();

    if let Some(addr) = options.bind_address {
        let name = interfaces
            .iter()
            .find(|iface| ipv4_addrs(iface).any(|ip| ip == addr))
            .map(|iface| iface.name.clone())
            .ok_or_else(|| {
                CaptureError::InterfaceNotFound(format!("no interface has address {}", addr))
            })?;
        return Ok((name, addr));
    }

    if let Some(name) = &options.interface {
        let iface = interfaces
            .iter()
            .find(|iface| &iface.name == name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(name.clone()))?;
        let addr = ipv4_addrs(iface).next().ok_or_else(|| {
            CaptureError::InterfaceNotFound(format!("{} has no IPv4 address", name))
        })?;
        return Ok((iface.name.clone(), addr));
    }

    interfaces
        .iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .find_map(|iface| ipv4_addrs(iface).next().map(|addr| (iface.name.clone(), addr)))
        .ok_or_else(|| {
            CaptureError::InterfaceNotFound("no suitable interface found".to_string())
        })
}

fn ipv4_addrs(iface: &NetworkInterface) -> impl Iterator<Item = Ipv4Addr> + '_ {
    iface.ips.iter().filter_map(|net| match net.ip() {
        IpAddr::V4(addr) => Some(addr),
        IpAddr::V6(_) => None,
    })
}

/// List all available network interfaces with their IPv4 addresses.
pub fn list_interfaces() -> Vec<String> {
    datalink::interfaces()
        .into_iter()
        .map(|iface| {
            let status = if iface.is_up() { "UP" } else { "DOWN" };
            let ips: Vec<_> = ipv4_addrs(&iface).map(|ip| ip.to_string()).collect();
            format!(
                "{}: {} [{}]",
                iface.name,
                status,
                if ips.is_empty() {
                    "no IPv4".to_string()
                } else {
                    ips.join(", ")
                }
            )
        })
        .collect()
}

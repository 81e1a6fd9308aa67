//! Interface promiscuous-mode control.
//!
//! Only Linux is supported, through the `SIOCGIFFLAGS`/`SIOCSIFFLAGS`
//! ioctls. Everywhere else the capability is reported as unavailable.

use socket2::Socket;

use crate::error::CaptureError;

/// Set `IFF_PROMISC` on `interface`.
///
/// Returns whether the flag was already set, in which case the caller must
/// not clear it again on teardown.
#[cfg(target_os = "linux")]
pub fn enable(socket: &Socket, interface: &str) -> Result<bool, CaptureError> {
    let flags = linux::get_flags(socket, interface).map_err(unavailable)?;
    let promisc = libc::IFF_PROMISC as libc::c_short;
    if flags & promisc != 0 {
        return Ok(true);
    }
    linux::set_flags(socket, interface, flags | promisc).map_err(unavailable)?;
    Ok(false)
}

/// Clear `IFF_PROMISC` on `interface`.
#[cfg(target_os = "linux")]
pub fn disable(socket: &Socket, interface: &str) -> Result<(), CaptureError> {
    let flags = linux::get_flags(socket, interface).map_err(unavailable)?;
    let promisc = libc::IFF_PROMISC as libc::c_short;
    if flags & promisc == 0 {
        return Ok(());
    }
    linux::set_flags(socket, interface, flags & !promisc).map_err(unavailable)
}

#[cfg(not(target_os = "linux"))]
pub fn enable(_socket: &Socket, _interface: &str) -> Result<bool, CaptureError> {
    Err(CaptureError::PromiscuousModeUnavailable(
        "not supported on this platform".to_string(),
    ))
}

#[cfg(not(target_os = "linux"))]
pub fn disable(_socket: &Socket, _interface: &str) -> Result<(), CaptureError> {
    Err(CaptureError::PromiscuousModeUnavailable(
        "not supported on this platform".to_string(),
    ))
}

#[cfg(target_os = "linux")]
fn unavailable(err: std::io::Error) -> CaptureError {
    CaptureError::PromiscuousModeUnavailable(err.to_string())
}

#[cfg(target_os = "linux")]
mod linux {
    use std::io;
    use std::os::fd::AsRawFd;

    use socket2::Socket;

    fn ifreq_for(interface: &str) -> io::Result<libc::ifreq> {
        let name = interface.as_bytes();
        if name.is_empty() || name.len() >= libc::IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid interface name '{}'", interface),
            ));
        }

        // SAFETY: ifreq is plain old data; all-zero is a valid value.
        let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
        for (dst, src) in ifr.ifr_name.iter_mut().zip(name) {
            *dst = *src as libc::c_char;
        }
        Ok(ifr)
    }

    pub fn get_flags(socket: &Socket, interface: &str) -> io::Result<libc::c_short> {
        let mut ifr = ifreq_for(interface)?;
        // SAFETY: fd is a live socket and ifr is a properly initialized ifreq.
        let result = unsafe { libc::ioctl(socket.as_raw_fd(), libc::SIOCGIFFLAGS, &mut ifr) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: SIOCGIFFLAGS fills the flags member of the union.
        Ok(unsafe { ifr.ifr_ifru.ifru_flags })
    }

    pub fn set_flags(socket: &Socket, interface: &str, flags: libc::c_short) -> io::Result<()> {
        let mut ifr = ifreq_for(interface)?;
        ifr.ifr_ifru.ifru_flags = flags;
        // SAFETY: fd is a live socket and ifr is a properly initialized ifreq.
        let result = unsafe { libc::ioctl(socket.as_raw_fd(), libc::SIOCSIFFLAGS, &ifr) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_ifreq_rejects_long_name() {
            let name = "x".repeat(libc::IFNAMSIZ);
            assert!(ifreq_for(&name).is_err());
            assert!(ifreq_for("").is_err());
        }

        #[test]
        fn test_ifreq_copies_name() {
            let ifr = ifreq_for("eth0").unwrap();
            let name: Vec<u8> = ifr.ifr_name.iter().take(5).map(|&c| c as u8).collect();
            assert_eq!(name, b"eth0\0");
        }
    }
}

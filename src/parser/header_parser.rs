//! Fixed-offset IPv4 header decoder.

use std::net::Ipv4Addr;

use crate::domain::PacketRecord;
use crate::error::ParseError;

/// Length of an IPv4 header without options.
pub const MIN_HEADER_SIZE: usize = 20;

/// Source address offset within the header
const SOURCE_OFFSET: usize = 12;
/// Destination address offset within the header
const DESTINATION_OFFSET: usize = 16;

/// Parser for the addressing fields of an IPv4 header.
///
/// Assumes an option-free header and reads the addresses at fixed offsets.
/// Version, IHL, checksum and protocol are not inspected, so any buffer of
/// at least [`MIN_HEADER_SIZE`] bytes decodes.
pub struct HeaderParser;

impl HeaderParser {
    /// Create a new header parser.
    pub fn new() -> Self {
        Self
    }

    /// Decode the source and destination addresses of a datagram.
    pub fn parse(&self, data: &[u8]) -> Result<PacketRecord, ParseError> {
        if data.len() < MIN_HEADER_SIZE {
            return Err(ParseError::TruncatedPacket {
                expected: MIN_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let source = Self::read_addr(data, SOURCE_OFFSET);
        let destination = Self::read_addr(data, DESTINATION_OFFSET);

        Ok(PacketRecord::new(source, destination))
    }

    fn read_addr(data: &[u8], offset: usize) -> Ipv4Addr {
        Ipv4Addr::new(
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        )
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
        let mut packet = vec![0u8; MIN_HEADER_SIZE];
        // Version 4, IHL 5
        packet[0] = 0x45;
        packet[12..16].copy_from_slice(&src);
        packet[16..20].copy_from_slice(&dst);
        packet
    }

    #[test]
    fn test_parse_addresses() {
        let parser = HeaderParser::new();
        let packet = header([10, 0, 0, 5], [10, 0, 0, 1]);

        let record = parser.parse(&packet).unwrap();
        assert_eq!(record.source.to_string(), "10.0.0.5");
        assert_eq!(record.destination.to_string(), "10.0.0.1");
    }

    #[test]
    fn test_parse_ignores_trailing_payload() {
        let parser = HeaderParser::new();
        let mut packet = header([192, 168, 1, 20], [8, 8, 8, 8]);
        packet.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let record = parser.parse(&packet).unwrap();
        assert_eq!(record.source, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(record.destination, Ipv4Addr::new(8, 8, 8, 8));
    }

    #[test]
    fn test_parse_does_not_check_version() {
        let parser = HeaderParser::new();
        let mut packet = header([255, 255, 255, 255], [0, 0, 0, 0]);
        packet[0] = 0x60;

        let record = parser.parse(&packet).unwrap();
        assert_eq!(record.source, Ipv4Addr::BROADCAST);
        assert_eq!(record.destination, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_packet_too_short() {
        let parser = HeaderParser::new();
        let packet = vec![0u8; 19];

        let result = parser.parse(&packet);
        assert_eq!(
            result,
            Err(ParseError::TruncatedPacket {
                expected: MIN_HEADER_SIZE,
                actual: 19
            })
        );
    }

    #[test]
    fn test_empty_packet() {
        let parser = HeaderParser::new();
        assert!(matches!(
            parser.parse(&[]),
            Err(ParseError::TruncatedPacket { actual: 0, .. })
        ));
    }
}

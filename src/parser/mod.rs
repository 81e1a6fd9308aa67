//! IP header parsing module.
//!
//! This module turns raw datagram bytes into domain records (SRP).

mod header_parser;

pub use header_parser::{HeaderParser, MIN_HEADER_SIZE};

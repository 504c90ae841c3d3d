//! rtunnel Protocol Library
//!
//! Shared wire-protocol definitions for the rtunnel client: the framed
//! packet buffer, protocol-id and flag constants, control-packet
//! builders and the pluggable codec hooks.
//!
//! A packet on the wire is a 5-byte header followed by the payload:
//! one type byte (low 4 bits protocol id, bit 6 ENCRYPTED, bit 7
//! COMPRESSED) and a 4-byte big-endian payload length.

pub mod codec;
pub mod constants;
pub mod control;
pub mod error;
pub mod packet;

pub use constants::*;
pub use error::PacketError;
pub use packet::Packet;

/// Size of the packed packet header in bytes.
pub const HEAD_SIZE: usize = 5;

/// Maximum payload size of a single packet (100 KiB).
pub const PACKET_MAX_SIZE: usize = 102400;

/// Extra headroom kept beyond the requested payload size so that small
/// appends and cipher padding do not force a reallocation.
pub const BUFFER_MARGIN: usize = 16 + HEAD_SIZE + 32;

/// Initial payload-size hint for reusable packet instances.
pub const DEFAULT_PACKET_SIZE: usize = 4096;

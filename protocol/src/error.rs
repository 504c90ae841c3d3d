//! Protocol error types

use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("unsupported protocol {0:#x}, protocol id must be within [0x0, 0xf]")]
    InvalidProtocolId(u8),

    #[error("invalid size: requested {requested} exceeds the {available} available bytes")]
    InvalidSize { requested: usize, available: usize },

    #[error("packet size {size} larger than maximum {max}")]
    PacketTooLarge { size: usize, max: usize },

    #[error("insufficient data: needed {needed}, only {available} available")]
    InsufficientData { needed: usize, available: usize },

    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),
}

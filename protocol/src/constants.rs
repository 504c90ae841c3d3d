//! Protocol-id and flag-bit definitions for the packet type byte

/// Mask selecting the 4-bit protocol id in the type byte.
pub const PROTOCOL_MASK: u8 = 0x0F;

/// Mask selecting the two feature-flag bits in the type byte.
pub const FLAGS_MASK: u8 = 0xC0;

/// Flag bit: the payload is compressed.
pub const COMPRESSED: u8 = 0x80;

/// Flag bit: the payload is encrypted.
pub const ENCRYPTED: u8 = 0x40;

/// Assigned protocol ids (the low nibble of the type byte)
///
/// Ids `0xC`..=`0xF` are reserved and rejected by [`ProtocolId::from_u8`].
/// `CreateTcpServer`, `NewTcpSocket` and their acks belong to the
/// connection-multiplexing layer, which reuses this header format but
/// has no behavior defined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolId {
    /// Keepalive carrying the sender's wall-clock time
    HeartBeat = 0x00,
    /// Heartbeat echo, returning the peer's timestamp unchanged
    AckHeartBeat = 0x01,

    /// Ask the transit server to open a forward port
    CreateTcpServer = 0x02,
    AckCreateTcpServer = 0x03,

    /// A new downstream connection arrived on the forward port
    NewTcpSocket = 0x04,
    AckNewTcpSocket = 0x05,

    /// Forwarded application data
    Data = 0x06,

    /// Orderly tunnel shutdown
    CloseTunnel = 0x07,

    /// Diffie-Hellman key material
    DhKey = 0x08,
    AckDhKey = 0x09,

    /// Tunnel mode negotiation
    TunnelMode = 0x0A,
    AckTunnelMode = 0x0B,
}

impl ProtocolId {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::HeartBeat),
            0x01 => Some(Self::AckHeartBeat),
            0x02 => Some(Self::CreateTcpServer),
            0x03 => Some(Self::AckCreateTcpServer),
            0x04 => Some(Self::NewTcpSocket),
            0x05 => Some(Self::AckNewTcpSocket),
            0x06 => Some(Self::Data),
            0x07 => Some(Self::CloseTunnel),
            0x08 => Some(Self::DhKey),
            0x09 => Some(Self::AckDhKey),
            0x0A => Some(Self::TunnelMode),
            0x0B => Some(Self::AckTunnelMode),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

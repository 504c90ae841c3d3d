//! Control-packet builders
//!
//! Stateless fill functions over a caller-owned [`Packet`]: each one
//! clears the instance, sets the protocol id and feeds a single typed
//! payload. They never allocate a new packet and never perform I/O.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::ProtocolId;
use crate::error::PacketError;
use crate::packet::Packet;

/// Reset `p` as a control packet with a raw byte payload.
pub fn set_control_bytes(p: &mut Packet, protocol: u8, payload: &[u8]) -> Result<(), PacketError> {
    p.clear();
    p.set_protocol(protocol)?;
    p.feed_bytes(payload)
}

/// Reset `p` as a control packet carrying a single big-endian u32.
pub fn set_control_int(p: &mut Packet, protocol: u8, v: u32) -> Result<(), PacketError> {
    p.clear();
    p.set_protocol(protocol)?;
    p.feed_int(v)
}

/// Reset `p` as a control packet carrying a single big-endian u64.
pub fn set_control_long(p: &mut Packet, protocol: u8, v: u64) -> Result<(), PacketError> {
    p.clear();
    p.set_protocol(protocol)?;
    p.feed_long(v)
}

/// Fill `p` as a HEART_BEAT packet carrying the current wall-clock
/// time in milliseconds since the epoch.
pub fn fill_heartbeat(p: &mut Packet) -> Result<(), PacketError> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    set_control_long(p, ProtocolId::HeartBeat.to_u8(), now_ms)
}

/// Fill `p` as an ACK_HEART_BEAT packet echoing the peer's timestamp
/// bytes unchanged, so the peer can measure round-trip latency.
pub fn fill_ack_heartbeat(p: &mut Packet, time_bytes: &[u8]) -> Result<(), PacketError> {
    set_control_bytes(p, ProtocolId::AckHeartBeat.to_u8(), time_bytes)
}

/// Fill `p` as a CLOSE_TUNNEL packet with an empty payload.
pub fn fill_close_tunnel(p: &mut Packet) -> Result<(), PacketError> {
    set_control_bytes(p, ProtocolId::CloseTunnel.to_u8(), &[])
}

/// Fill `p` as a key-exchange packet (DH_KEY or ACK_DH_KEY) carrying
/// raw key material, opaque to this layer.
pub fn fill_key_exchange(
    p: &mut Packet,
    protocol: ProtocolId,
    key_bytes: &[u8],
) -> Result<(), PacketError> {
    set_control_bytes(p, protocol.to_u8(), key_bytes)
}

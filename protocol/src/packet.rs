//! Framed packet buffer
//!
//! A [`Packet`] is one growable byte buffer holding a single protocol
//! message: a 5-byte header region followed by the payload. The type
//! byte and the two cursors are the authoritative state while a packet
//! is being built or consumed; the header bytes themselves are only
//! packed by [`Packet::fill_header`] right before a transport write and
//! unpacked by [`Packet::read_header`] right after a transport read.
//!
//! A packet belongs to exactly one in-flight read or write operation at
//! a time and is reused across messages via [`Packet::clear`].

use std::fmt;

use crate::codec::CodecStack;
use crate::constants::{ProtocolId, COMPRESSED, ENCRYPTED, PROTOCOL_MASK};
use crate::error::PacketError;
use crate::{BUFFER_MARGIN, DEFAULT_PACKET_SIZE, HEAD_SIZE, PACKET_MAX_SIZE};

pub struct Packet {
    buf: Vec<u8>,
    /// Write cursor: offset of the next byte to append.
    index: usize,
    /// Read cursor: offset of the next byte to consume.
    read_index: usize,
    /// Authoritative type byte (protocol id + feature flags).
    type_byte: u8,
}

impl Packet {
    /// Create a packet with an initial payload-size hint.
    ///
    /// The allocation is `size + BUFFER_MARGIN`; the buffer still grows
    /// on demand up to [`PACKET_MAX_SIZE`].
    pub fn new(size: usize) -> Result<Self, PacketError> {
        if size > PACKET_MAX_SIZE {
            return Err(PacketError::PacketTooLarge {
                size,
                max: PACKET_MAX_SIZE,
            });
        }
        Ok(Self {
            buf: vec![0u8; size + BUFFER_MARGIN],
            index: HEAD_SIZE,
            read_index: HEAD_SIZE,
            type_byte: 0,
        })
    }

    /// Set the 4-bit protocol id, leaving the flag bits untouched.
    pub fn set_protocol(&mut self, protocol: u8) -> Result<(), PacketError> {
        if protocol > PROTOCOL_MASK {
            return Err(PacketError::InvalidProtocolId(protocol));
        }
        self.type_byte &= !PROTOCOL_MASK;
        self.type_byte |= protocol;
        Ok(())
    }

    /// Check the 4-bit protocol id against `protocol`.
    pub fn is_protocol(&self, protocol: u8) -> Result<bool, PacketError> {
        if protocol > PROTOCOL_MASK {
            return Err(PacketError::InvalidProtocolId(protocol));
        }
        Ok(self.type_byte & PROTOCOL_MASK == protocol)
    }

    /// The typed protocol id, or `None` for the reserved ids 0xC..=0xF.
    pub fn protocol_id(&self) -> Option<ProtocolId> {
        ProtocolId::from_u8(self.type_byte & PROTOCOL_MASK)
    }

    pub fn type_byte(&self) -> u8 {
        self.type_byte
    }

    pub fn is_compressed(&self) -> bool {
        self.type_byte & COMPRESSED != 0
    }

    /// Mark the payload for compression on the next [`Packet::encode`].
    pub fn set_compressed(&mut self) {
        self.type_byte |= COMPRESSED;
    }

    pub fn clear_compressed(&mut self) {
        self.type_byte &= !COMPRESSED;
    }

    pub fn is_encrypted(&self) -> bool {
        self.type_byte & ENCRYPTED != 0
    }

    /// Mark the payload for encryption on the next [`Packet::encode`].
    pub fn set_encrypted(&mut self) {
        self.type_byte |= ENCRYPTED;
    }

    pub fn clear_encrypted(&mut self) {
        self.type_byte &= !ENCRYPTED;
    }

    pub fn is_heart_beat(&self) -> bool {
        self.type_byte & PROTOCOL_MASK == ProtocolId::HeartBeat.to_u8()
    }

    pub fn set_heart_beat(&mut self) {
        // heartbeat id is within range
        let _ = self.set_protocol(ProtocolId::HeartBeat.to_u8());
    }

    pub fn is_ack_heart_beat(&self) -> bool {
        self.type_byte & PROTOCOL_MASK == ProtocolId::AckHeartBeat.to_u8()
    }

    pub fn set_ack_heart_beat(&mut self) {
        let _ = self.set_protocol(ProtocolId::AckHeartBeat.to_u8());
    }

    /// Reset the type byte and zero the in-buffer header region.
    pub fn clear_header(&mut self) {
        self.type_byte = 0;
        self.buf[..HEAD_SIZE].fill(0);
    }

    /// Reset both cursors to the start of the payload region.
    pub fn clear_body(&mut self) {
        self.index = HEAD_SIZE;
        self.read_index = HEAD_SIZE;
    }

    /// Reset this packet for reuse. Capacity is preserved.
    pub fn clear(&mut self) {
        self.clear_header();
        self.clear_body();
    }

    /// Append bytes to the payload, growing the buffer if needed.
    pub fn feed_bytes(&mut self, src: &[u8]) -> Result<(), PacketError> {
        self.feed_bytes_range(src, 0, src.len())
    }

    /// Append `len` bytes of `src` starting at `start`.
    pub fn feed_bytes_range(
        &mut self,
        src: &[u8],
        start: usize,
        len: usize,
    ) -> Result<(), PacketError> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= src.len())
            .ok_or(PacketError::InvalidSize {
                requested: len,
                available: src.len().saturating_sub(start),
            })?;
        self.ensure_size(self.data_len() + len)?;
        self.buf[self.index..self.index + len].copy_from_slice(&src[start..end]);
        self.index += len;
        Ok(())
    }

    /// Append a big-endian u32 to the payload.
    pub fn feed_int(&mut self, v: u32) -> Result<(), PacketError> {
        self.ensure_size(self.data_len() + 4)?;
        self.buf[self.index..self.index + 4].copy_from_slice(&v.to_be_bytes());
        self.index += 4;
        Ok(())
    }

    /// Append a big-endian u64 to the payload.
    pub fn feed_long(&mut self, v: u64) -> Result<(), PacketError> {
        self.ensure_size(self.data_len() + 8)?;
        self.buf[self.index..self.index + 8].copy_from_slice(&v.to_be_bytes());
        self.index += 8;
        Ok(())
    }

    /// Copy unread payload bytes into `dest`, advancing the read cursor.
    ///
    /// Returns the number of bytes actually copied, which is the lesser
    /// of `dest.len()` and the unread length; 0 when nothing is left.
    pub fn extract_bytes(&mut self, dest: &mut [u8]) -> usize {
        let rlen = (self.index - self.read_index).min(dest.len());
        if rlen == 0 {
            return 0;
        }
        dest[..rlen].copy_from_slice(&self.buf[self.read_index..self.read_index + rlen]);
        self.read_index += rlen;
        rlen
    }

    /// Consume a big-endian u32 from the payload.
    ///
    /// Fails without moving the read cursor when fewer than 4 unread
    /// bytes remain.
    pub fn extract_int(&mut self) -> Result<u32, PacketError> {
        let available = self.index - self.read_index;
        if available < 4 {
            return Err(PacketError::InsufficientData {
                needed: 4,
                available,
            });
        }
        let i = self.read_index;
        let v = u32::from_be_bytes([self.buf[i], self.buf[i + 1], self.buf[i + 2], self.buf[i + 3]]);
        self.read_index += 4;
        Ok(v)
    }

    /// Consume a big-endian u64 from the payload.
    ///
    /// Fails without moving the read cursor when fewer than 8 unread
    /// bytes remain.
    pub fn extract_long(&mut self) -> Result<u64, PacketError> {
        let available = self.index - self.read_index;
        if available < 8 {
            return Err(PacketError::InsufficientData {
                needed: 8,
                available,
            });
        }
        let i = self.read_index;
        let v = u64::from_be_bytes([
            self.buf[i],
            self.buf[i + 1],
            self.buf[i + 2],
            self.buf[i + 3],
            self.buf[i + 4],
            self.buf[i + 5],
            self.buf[i + 6],
            self.buf[i + 7],
        ]);
        self.read_index += 8;
        Ok(v)
    }

    /// Apply the flagged transforms to the payload before sending.
    ///
    /// Compress-then-encrypt ordering is fixed by the wire protocol.
    pub fn encode(&mut self, codecs: &CodecStack) -> Result<(), PacketError> {
        if self.is_compressed() {
            let out = codecs.compressor.compress(self.payload())?;
            self.replace_payload(&out)?;
        }
        if self.is_encrypted() {
            let out = codecs.cipher.encrypt(self.payload())?;
            self.replace_payload(&out)?;
        }
        Ok(())
    }

    /// Undo the flagged transforms after receiving: decrypt first, then
    /// decompress. Each flag is cleared only once its transform succeeds.
    pub fn decode(&mut self, codecs: &CodecStack) -> Result<(), PacketError> {
        if self.is_encrypted() {
            let out = codecs.cipher.decrypt(self.payload())?;
            self.replace_payload(&out)?;
            self.clear_encrypted();
        }
        if self.is_compressed() {
            let out = codecs.compressor.decompress(self.payload())?;
            self.replace_payload(&out)?;
            self.clear_compressed();
        }
        Ok(())
    }

    /// Pack the type byte and payload length into the header region.
    pub fn fill_header(&mut self) {
        let len = self.data_len() as u32;
        self.buf[0] = self.type_byte;
        self.buf[1..HEAD_SIZE].copy_from_slice(&len.to_be_bytes());
    }

    /// Unpack the header region into the type byte and write cursor.
    ///
    /// After a raw read this is what establishes how much payload is
    /// valid: the write cursor becomes `HEAD_SIZE + declared length`
    /// and the read cursor rewinds to the start of the payload, so a
    /// drained instance can ingest the next inbound frame directly.
    pub fn read_header(&mut self) -> Result<(), PacketError> {
        let len =
            u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]) as usize;
        if len > PACKET_MAX_SIZE {
            return Err(PacketError::PacketTooLarge {
                size: len,
                max: PACKET_MAX_SIZE,
            });
        }
        self.ensure_size(len)?;
        self.type_byte = self.buf[0];
        self.index = HEAD_SIZE + len;
        self.read_index = HEAD_SIZE;
        Ok(())
    }

    /// Pack the header and expose the full framed packet for a
    /// zero-copy transport write.
    pub fn wrap_for_send(&mut self) -> &[u8] {
        self.fill_header();
        &self.buf[..self.index]
    }

    /// Ingest `raw` as exactly one full framed packet (header and
    /// payload), growing the buffer if needed.
    pub fn read_packet(&mut self, raw: &[u8]) -> Result<(), PacketError> {
        if raw.len() < HEAD_SIZE {
            return Err(PacketError::InsufficientData {
                needed: HEAD_SIZE,
                available: raw.len(),
            });
        }
        self.ensure_size(raw.len() - HEAD_SIZE)?;
        self.buf[..raw.len()].copy_from_slice(raw);
        self.read_header()?;
        if self.index > raw.len() {
            return Err(PacketError::InsufficientData {
                needed: self.index - HEAD_SIZE,
                available: raw.len() - HEAD_SIZE,
            });
        }
        Ok(())
    }

    /// Effective payload length, excluding the header.
    pub fn data_len(&self) -> usize {
        self.index - HEAD_SIZE
    }

    /// The written-but-unread payload region.
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEAD_SIZE..self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Current buffer capacity, margin included.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Overwrite the payload region, moving the write cursor to its end.
    fn replace_payload(&mut self, payload: &[u8]) -> Result<(), PacketError> {
        self.ensure_size(payload.len())?;
        self.buf[HEAD_SIZE..HEAD_SIZE + payload.len()].copy_from_slice(payload);
        self.index = HEAD_SIZE + payload.len();
        Ok(())
    }

    /// Grow the buffer so it can hold a `size`-byte payload plus margin.
    ///
    /// Growth is geometric, capped at `PACKET_MAX_SIZE + BUFFER_MARGIN`.
    fn ensure_size(&mut self, size: usize) -> Result<(), PacketError> {
        if size > PACKET_MAX_SIZE {
            return Err(PacketError::PacketTooLarge {
                size,
                max: PACKET_MAX_SIZE,
            });
        }
        let needed = size + BUFFER_MARGIN;
        if self.buf.len() < needed {
            let grown = (self.buf.len() * 2)
                .max(needed)
                .min(PACKET_MAX_SIZE + BUFFER_MARGIN);
            self.buf.resize(grown, 0);
        }
        Ok(())
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            buf: vec![0u8; DEFAULT_PACKET_SIZE + BUFFER_MARGIN],
            index: HEAD_SIZE,
            read_index: HEAD_SIZE,
            type_byte: 0,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet{{compressed={}, encrypted={}, type={:#x}, datalen={}}}",
            self.is_compressed(),
            self.is_encrypted(),
            self.type_byte,
            self.data_len()
        )
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("type_byte", &self.type_byte)
            .field("index", &self.index)
            .field("read_index", &self.read_index)
            .field("capacity", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Cipher, CodecError, CodecStack, Compressor};

    #[test]
    fn protocol_round_trip_all_ids() {
        let mut p = Packet::new(0).unwrap();
        for id in 0u8..=15 {
            p.set_protocol(id).unwrap();
            assert!(p.is_protocol(id).unwrap());
            for other in 0u8..=15 {
                if other != id {
                    assert!(!p.is_protocol(other).unwrap());
                }
            }
        }
    }

    #[test]
    fn protocol_id_out_of_range_is_rejected() {
        let mut p = Packet::new(0).unwrap();
        assert!(matches!(
            p.set_protocol(16),
            Err(PacketError::InvalidProtocolId(16))
        ));
        assert!(matches!(
            p.is_protocol(0xFF),
            Err(PacketError::InvalidProtocolId(0xFF))
        ));
    }

    #[test]
    fn reserved_ids_have_no_typed_protocol() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(0x0C).unwrap();
        assert!(p.protocol_id().is_none());
        p.set_protocol(ProtocolId::Data.to_u8()).unwrap();
        assert_eq!(p.protocol_id(), Some(ProtocolId::Data));
    }

    #[test]
    fn flags_leave_protocol_bits_alone() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(ProtocolId::Data.to_u8()).unwrap();
        p.set_compressed();
        p.set_encrypted();
        assert!(p.is_compressed());
        assert!(p.is_encrypted());
        assert!(p.is_protocol(ProtocolId::Data.to_u8()).unwrap());

        p.clear_compressed();
        assert!(!p.is_compressed());
        assert!(p.is_encrypted());
        p.clear_encrypted();
        assert!(!p.is_encrypted());
        assert!(p.is_protocol(ProtocolId::Data.to_u8()).unwrap());
    }

    #[test]
    fn set_protocol_clears_previous_id() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(0x0F).unwrap();
        p.set_compressed();
        p.set_protocol(ProtocolId::HeartBeat.to_u8()).unwrap();
        assert!(p.is_heart_beat());
        assert!(p.is_compressed());
    }

    #[test]
    fn bytes_round_trip() {
        let mut p = Packet::new(16).unwrap();
        let src = b"hello transit server".to_vec();
        p.feed_bytes(&src).unwrap();
        assert_eq!(p.data_len(), src.len());

        let mut dest = vec![0u8; src.len()];
        assert_eq!(p.extract_bytes(&mut dest), src.len());
        assert_eq!(dest, src);
        assert_eq!(p.extract_bytes(&mut dest), 0);
    }

    #[test]
    fn bytes_round_trip_with_growth() {
        let mut p = Packet::new(0).unwrap();
        let src: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        p.feed_bytes(&src).unwrap();
        assert!(p.capacity() >= src.len() + BUFFER_MARGIN);

        let mut dest = vec![0u8; src.len()];
        assert_eq!(p.extract_bytes(&mut dest), src.len());
        assert_eq!(dest, src);
    }

    #[test]
    fn extract_bytes_is_capped_by_available() {
        let mut p = Packet::new(0).unwrap();
        p.feed_bytes(&[1, 2, 3]).unwrap();
        let mut dest = [0u8; 8];
        assert_eq!(p.extract_bytes(&mut dest), 3);
        assert_eq!(&dest[..3], &[1, 2, 3]);
    }

    #[test]
    fn feed_bytes_range_rejects_bad_range() {
        let mut p = Packet::new(0).unwrap();
        let src = [1u8, 2, 3, 4];
        assert!(matches!(
            p.feed_bytes_range(&src, 2, 3),
            Err(PacketError::InvalidSize { .. })
        ));
        p.feed_bytes_range(&src, 1, 2).unwrap();
        assert_eq!(p.payload(), &[2, 3]);
    }

    #[test]
    fn int_is_big_endian() {
        let mut p = Packet::new(0).unwrap();
        p.feed_int(0x01020304).unwrap();
        assert_eq!(p.payload(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(p.extract_int().unwrap(), 0x01020304);
    }

    #[test]
    fn long_is_big_endian() {
        let mut p = Packet::new(0).unwrap();
        p.feed_long(0x0102030405060708).unwrap();
        assert_eq!(
            p.payload(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(p.extract_long().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn int_long_extremes_round_trip() {
        let mut p = Packet::new(0).unwrap();
        for v in [0u32, 1, u32::MAX] {
            p.clear();
            p.feed_int(v).unwrap();
            assert_eq!(p.extract_int().unwrap(), v);
        }
        for v in [0u64, 1, u64::MAX] {
            p.clear();
            p.feed_long(v).unwrap();
            assert_eq!(p.extract_long().unwrap(), v);
        }
    }

    #[test]
    fn extract_int_insufficient_leaves_cursor() {
        let mut p = Packet::new(0).unwrap();
        p.feed_bytes(&[1, 2, 3]).unwrap();
        let before = p.read_index();
        assert!(matches!(
            p.extract_int(),
            Err(PacketError::InsufficientData {
                needed: 4,
                available: 3
            })
        ));
        assert_eq!(p.read_index(), before);

        let mut dest = [0u8; 3];
        assert_eq!(p.extract_bytes(&mut dest), 3);
        assert_eq!(dest, [1, 2, 3]);
    }

    #[test]
    fn extract_long_insufficient_leaves_cursor() {
        let mut p = Packet::new(0).unwrap();
        p.feed_int(7).unwrap();
        let before = p.read_index();
        assert!(matches!(
            p.extract_long(),
            Err(PacketError::InsufficientData {
                needed: 8,
                available: 4
            })
        ));
        assert_eq!(p.read_index(), before);
        assert_eq!(p.extract_int().unwrap(), 7);
    }

    #[test]
    fn construction_size_limits() {
        assert!(Packet::new(PACKET_MAX_SIZE).is_ok());
        assert!(matches!(
            Packet::new(PACKET_MAX_SIZE + 1),
            Err(PacketError::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn growth_stops_at_max_size() {
        let mut p = Packet::new(0).unwrap();
        let chunk = vec![0xABu8; PACKET_MAX_SIZE];
        p.feed_bytes(&chunk).unwrap();
        assert_eq!(p.data_len(), PACKET_MAX_SIZE);
        assert!(matches!(
            p.feed_bytes(&[0]),
            Err(PacketError::PacketTooLarge { .. })
        ));
        // failed append leaves the payload as it was
        assert_eq!(p.data_len(), PACKET_MAX_SIZE);
    }

    #[test]
    fn clear_resets_state_and_keeps_capacity() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(ProtocolId::Data.to_u8()).unwrap();
        p.set_compressed();
        p.feed_bytes(&vec![9u8; 2000]).unwrap();
        let capacity = p.capacity();

        p.clear();
        assert_eq!(p.index(), HEAD_SIZE);
        assert_eq!(p.read_index(), HEAD_SIZE);
        assert_eq!(p.type_byte(), 0);
        assert_eq!(p.data_len(), 0);
        assert_eq!(p.capacity(), capacity);
    }

    #[test]
    fn header_round_trip_same_buffer() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(ProtocolId::CloseTunnel.to_u8()).unwrap();
        p.set_encrypted();
        p.feed_int(42).unwrap();
        let type_byte = p.type_byte();
        let index = p.index();

        p.fill_header();
        // wipe the authoritative state, then recover it from the header
        p.type_byte = 0;
        p.index = HEAD_SIZE;
        p.read_header().unwrap();
        assert_eq!(p.type_byte(), type_byte);
        assert_eq!(p.index(), index);
    }

    #[test]
    fn wrap_for_send_then_read_packet() {
        let mut sender = Packet::new(0).unwrap();
        sender.set_protocol(ProtocolId::Data.to_u8()).unwrap();
        sender.feed_bytes(b"forwarded bytes").unwrap();
        let frame = sender.wrap_for_send().to_vec();
        assert_eq!(frame.len(), HEAD_SIZE + 15);
        assert_eq!(&frame[1..HEAD_SIZE], &15u32.to_be_bytes());

        let mut receiver = Packet::new(0).unwrap();
        receiver.read_packet(&frame).unwrap();
        assert!(receiver.is_protocol(ProtocolId::Data.to_u8()).unwrap());
        assert_eq!(receiver.payload(), b"forwarded bytes");
    }

    #[test]
    fn read_packet_rewinds_read_cursor_on_reuse() {
        let mut p = Packet::new(0).unwrap();
        p.feed_bytes(&vec![7u8; 100]).unwrap();
        let mut sink = vec![0u8; 100];
        assert_eq!(p.extract_bytes(&mut sink), 100);

        // ingest a short frame without clear(); the read cursor must
        // rewind below the new write cursor
        let mut frame = vec![0x06, 0, 0, 0, 2];
        frame.extend_from_slice(&[0xAA, 0xBB]);
        p.read_packet(&frame).unwrap();
        assert_eq!(p.read_index(), HEAD_SIZE);
        assert_eq!(p.index(), HEAD_SIZE + 2);

        assert!(matches!(
            p.extract_int(),
            Err(PacketError::InsufficientData {
                needed: 4,
                available: 2
            })
        ));
        let mut dest = [0u8; 2];
        assert_eq!(p.extract_bytes(&mut dest), 2);
        assert_eq!(dest, [0xAA, 0xBB]);
    }

    #[test]
    fn read_packet_rejects_truncated_frames() {
        let mut p = Packet::new(0).unwrap();
        assert!(matches!(
            p.read_packet(&[0x06, 0x00]),
            Err(PacketError::InsufficientData { .. })
        ));

        // header declares 10 payload bytes, only 2 supplied
        let mut frame = vec![0x06, 0, 0, 0, 10];
        frame.extend_from_slice(&[1, 2]);
        let mut p = Packet::new(0).unwrap();
        assert!(matches!(
            p.read_packet(&frame),
            Err(PacketError::InsufficientData { .. })
        ));
    }

    #[test]
    fn read_packet_rejects_oversized_declared_length() {
        let len = (PACKET_MAX_SIZE as u32 + 1).to_be_bytes();
        let frame = [0x06, len[0], len[1], len[2], len[3]];
        let mut p = Packet::new(0).unwrap();
        assert!(matches!(
            p.read_packet(&frame),
            Err(PacketError::PacketTooLarge { .. })
        ));
    }

    struct Tagging;

    impl Compressor for Tagging {
        fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
            let mut out = payload.to_vec();
            out.push(b'C');
            Ok(out)
        }

        fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
            match payload.split_last() {
                Some((b'C', rest)) => Ok(rest.to_vec()),
                _ => Err(CodecError::DecompressionFailed("missing tag".into())),
            }
        }
    }

    impl Cipher for Tagging {
        fn encrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
            let mut out = payload.to_vec();
            out.push(b'E');
            Ok(out)
        }

        fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
            match payload.split_last() {
                Some((b'E', rest)) => Ok(rest.to_vec()),
                _ => Err(CodecError::DecryptionFailed("missing tag".into())),
            }
        }
    }

    fn tagging_stack() -> CodecStack {
        CodecStack {
            compressor: Box::new(Tagging),
            cipher: Box::new(Tagging),
        }
    }

    #[test]
    fn encode_compresses_then_encrypts() {
        let codecs = tagging_stack();
        let mut p = Packet::new(0).unwrap();
        p.set_compressed();
        p.set_encrypted();
        p.feed_bytes(b"data").unwrap();
        p.encode(&codecs).unwrap();
        // the cipher tag lands outermost
        assert_eq!(p.payload(), b"dataCE");
        assert!(p.is_compressed());
        assert!(p.is_encrypted());
    }

    #[test]
    fn decode_mirrors_encode_and_clears_flags() {
        let codecs = tagging_stack();
        let mut p = Packet::new(0).unwrap();
        p.set_compressed();
        p.set_encrypted();
        p.feed_bytes(b"data").unwrap();
        p.encode(&codecs).unwrap();

        p.decode(&codecs).unwrap();
        assert_eq!(p.payload(), b"data");
        assert!(!p.is_compressed());
        assert!(!p.is_encrypted());
    }

    #[test]
    fn decode_failure_keeps_flags_set() {
        let codecs = tagging_stack();
        let mut p = Packet::new(0).unwrap();
        p.set_encrypted();
        p.feed_bytes(b"not ciphertext").unwrap();
        assert!(matches!(
            p.decode(&codecs),
            Err(PacketError::Codec(CodecError::DecryptionFailed(_)))
        ));
        assert!(p.is_encrypted());
    }

    #[test]
    fn display_reports_type_and_length() {
        let mut p = Packet::new(0).unwrap();
        p.set_protocol(ProtocolId::HeartBeat.to_u8()).unwrap();
        p.feed_long(1).unwrap();
        assert_eq!(
            p.to_string(),
            "Packet{compressed=false, encrypted=false, type=0x0, datalen=8}"
        );
    }
}

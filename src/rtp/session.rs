//! RTP session state and header writing
//!
//! One session per outgoing media stream: a fixed payload type, a
//! randomly chosen SSRC, and a wrapping 16-bit sequence number that
//! advances exactly once per emitted packet.

use bytes::{BufMut, BytesMut};

/// RTP fixed header length in bytes (no CSRC list, no extensions).
pub const RTP_HEADER_LEN: usize = 12;

/// Maximum datagram the packetizer will emit, header included.
pub const RTP_DATAGRAM_LEN: usize = 1500;

/// Per-stream RTP counters and identity.
///
/// Mutated only by the single caller driving packetization; wrap the
/// session in external synchronization if multiple threads must share it.
#[derive(Debug)]
pub struct RtpSession {
    payload_type: u8,
    ssrc: u32,
    sequence: u16,
    clock_rate: u32,
}

impl RtpSession {
    /// Create a session with a random SSRC and a zeroed sequence number.
    ///
    /// `clock_rate` is the RTP timestamp rate in Hz for this payload
    /// (48000 for Opus per RFC 7587).
    pub fn new(payload_type: u8, clock_rate: u32) -> Self {
        Self {
            payload_type,
            ssrc: rand::random(),
            sequence: 0,
            clock_rate,
        }
    }

    /// The session's synchronization source identifier.
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// The fixed payload type carried in every packet.
    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    /// The RTP timestamp clock rate in Hz.
    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// The sequence number the next packet will carry.
    pub fn next_sequence(&self) -> u16 {
        self.sequence
    }

    /// Scale a monotonic microsecond timestamp into this session's RTP
    /// timestamp units (wrapping at 32 bits).
    pub fn rtp_timestamp(&self, pts_micros: u64) -> u32 {
        (pts_micros as u128 * self.clock_rate as u128 / 1_000_000) as u32
    }

    /// Append the 12-byte RTP header to `dst` and advance the sequence
    /// number.
    ///
    /// Fields: version 2, no padding, no extension, zero CSRCs, the
    /// given marker bit, the session payload type, sequence, `timestamp`,
    /// and SSRC, all in network byte order.
    pub fn write_header(&mut self, dst: &mut BytesMut, timestamp: u32, marker: bool) {
        dst.put_u8(0x80);
        dst.put_u8(((marker as u8) << 7) | (self.payload_type & 0x7F));
        dst.put_u16(self.sequence);
        dst.put_u32(timestamp);
        dst.put_u32(self.ssrc);
        self.sequence = self.sequence.wrapping_add(1);
    }
}

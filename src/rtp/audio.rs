//! Audio RTP packetization
//!
//! One encoded frame becomes one RTP datagram: 12-byte header followed
//! by the Opus payload, handed to a caller-supplied sink. The packetizer
//! knows nothing about the transport.

use bytes::BytesMut;

use super::session::{RtpSession, RTP_DATAGRAM_LEN, RTP_HEADER_LEN};

/// RTP payload type used for the Opus stream.
pub const OPUS_PAYLOAD_TYPE: u8 = 111;

/// Wraps encoded audio frames into RTP datagrams for a single stream.
///
/// Holds the per-stream [`RtpSession`]; `wrap` must be driven by a
/// single caller (it takes `&mut self`), matching the session's
/// single-writer contract.
pub struct AudioPacketizer {
    session: RtpSession,
    sample_rate: u32,
    channels: u16,
    datagram: BytesMut,
}

impl AudioPacketizer {
    /// Create a packetizer for an Opus stream with the given clock rate
    /// and channel count.
    ///
    /// The RTP timestamp scale is derived from `sample_rate`; for Opus
    /// this is 48000 regardless of the capture device's native rate.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            session: RtpSession::new(OPUS_PAYLOAD_TYPE, sample_rate),
            sample_rate,
            channels,
            datagram: BytesMut::with_capacity(RTP_DATAGRAM_LEN),
        }
    }

    /// Package one encoded frame into an RTP datagram and hand it to
    /// `sink`.
    ///
    /// `send_micros` is the frame's monotonic timestamp; it is scaled
    /// into RTP timestamp units by the session clock rate. The marker
    /// bit is always clear for this audio stream.
    ///
    /// A payload that cannot fit the datagram bound is dropped without
    /// invoking the sink or advancing the sequence number. This should
    /// be unreachable for Opus frames within the encoder's worst-case
    /// bound, but is guarded rather than trusted.
    pub fn wrap<F>(&mut self, send_micros: u64, payload: &[u8], mut sink: F)
    where
        F: FnMut(&[u8]),
    {
        if RTP_HEADER_LEN + payload.len() > RTP_DATAGRAM_LEN {
            log::warn!(
                "encoded frame too large for RTP datagram ({} bytes), dropping",
                payload.len()
            );
            return;
        }

        let timestamp = self.session.rtp_timestamp(send_micros);
        self.datagram.clear();
        self.session.write_header(&mut self.datagram, timestamp, false);
        self.datagram.extend_from_slice(payload);
        sink(&self.datagram);
    }

    /// Render the SDP media description fragment for this stream.
    ///
    /// Pure formatting; no session state changes.
    pub fn make_sdp(&self) -> String {
        let pt = self.session.payload_type();
        format!(
            "m=audio 1 RTP/SAVPF {pt}\r\n\
             c=IN IP4 0.0.0.0\r\n\
             a=rtpmap:{pt} OPUS/{rate}/{channels}\r\n\
             a=fmtp:{pt} useinbandfec=1\r\n\
             a=rtcp-fb:{pt} nack\r\n\
             a=rtcp-fb:{pt} nack pli\r\n\
             a=rtcp-fb:{pt} goog-remb\r\n\
             a=ssrc:{ssrc} cname:crabstream\r\n\
             a=sendonly\r\n",
            pt = pt,
            rate = self.sample_rate,
            channels = self.channels,
            ssrc = self.session.ssrc(),
        )
    }

    /// The stream's synchronization source identifier.
    pub fn ssrc(&self) -> u32 {
        self.session.ssrc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_emits_header_plus_payload() {
        let mut packetizer = AudioPacketizer::new(48_000, 2);
        let payload = [1u8, 2, 3, 4, 5];

        let mut captured = Vec::new();
        packetizer.wrap(1_000_000, &payload, |datagram| {
            captured.push(datagram.to_vec());
        });

        assert_eq!(captured.len(), 1);
        let datagram = &captured[0];
        assert_eq!(datagram.len(), RTP_HEADER_LEN + payload.len());
        assert_eq!(datagram[0], 0x80);
        assert_eq!(datagram[1], OPUS_PAYLOAD_TYPE, "marker clear");
        assert_eq!(&datagram[RTP_HEADER_LEN..], &payload);
        // 1 second at 48kHz
        assert_eq!(&datagram[4..8], &48_000u32.to_be_bytes());
    }

    #[test]
    fn test_oversized_payload_dropped() {
        let mut packetizer = AudioPacketizer::new(48_000, 2);
        let payload = vec![0u8; RTP_DATAGRAM_LEN];

        let mut calls = 0;
        packetizer.wrap(0, &payload, |_| calls += 1);
        assert_eq!(calls, 0, "sink must not see oversized frames");
        assert_eq!(
            packetizer.session.next_sequence(),
            0,
            "dropped frames consume no sequence number"
        );
    }

    #[test]
    fn test_boundary_payload_fits() {
        let mut packetizer = AudioPacketizer::new(48_000, 2);
        let payload = vec![0u8; RTP_DATAGRAM_LEN - RTP_HEADER_LEN];

        let mut calls = 0;
        packetizer.wrap(0, &payload, |datagram| {
            assert_eq!(datagram.len(), RTP_DATAGRAM_LEN);
            calls += 1;
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_sdp_fragment() {
        let packetizer = AudioPacketizer::new(48_000, 2);
        let sdp = packetizer.make_sdp();

        assert!(sdp.starts_with("m=audio 1 RTP/SAVPF 111\r\n"));
        assert!(sdp.contains("a=rtpmap:111 OPUS/48000/2\r\n"));
        assert!(sdp.contains("a=fmtp:111 useinbandfec=1\r\n"));
        assert!(sdp.contains("a=rtcp-fb:111 nack\r\n"));
        assert!(sdp.contains("a=rtcp-fb:111 nack pli\r\n"));
        assert!(sdp.contains("a=rtcp-fb:111 goog-remb\r\n"));
        assert!(sdp.contains(&format!("a=ssrc:{} cname:crabstream\r\n", packetizer.ssrc())));
        assert!(sdp.ends_with("a=sendonly\r\n"));
    }

    #[test]
    fn test_sdp_mono_stream() {
        let packetizer = AudioPacketizer::new(48_000, 1);
        assert!(packetizer.make_sdp().contains("OPUS/48000/1"));
    }
}

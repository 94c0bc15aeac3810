//! RTP packaging for encoded media
//!
//! Turns finished frames from the pipeline into RTP datagrams and
//! renders the matching SDP media description. Only the audio
//! packetizer lives here; transport (ICE/DTLS/UDP) is the caller's
//! concern.

mod audio;
mod session;

pub use audio::{AudioPacketizer, OPUS_PAYLOAD_TYPE};
pub use session::{RtpSession, RTP_DATAGRAM_LEN, RTP_HEADER_LEN};

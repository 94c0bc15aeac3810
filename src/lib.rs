//! CrabStream: low-latency audio capture, Opus encoding, and RTP packaging
//!
//! This crate provides the audio half of a WebRTC media streamer: it
//! continuously captures PCM from an input device, compresses it with
//! Opus, and exposes ready frames to a transport layer along with an RTP
//! packetizer that turns each frame into one datagram.
//!
//! # Features
//! - Bounded, timeout-aware queues between pipeline stages
//! - Drop-on-full backpressure that favors freshness over completeness
//! - Cross-platform capture via cpal with automatic sample conversion
//! - Opus encoding tuned for low delay (in-band FEC, fullband)
//! - RFC-compliant RTP header writing and SDP media fragments
//! - Synthetic sources for hardware-free testing
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! crabstream = "0.1"
//! ```
//!
//! Then pull frames and hand datagrams to your transport:
//! ```rust,ignore
//! use crabstream::{AudioPacketizer, AudioPipeline, StreamConfig};
//!
//! let config = StreamConfig::default();
//! let pipeline = AudioPipeline::open(&config)?;
//! let mut packetizer = AudioPacketizer::new(config.sample_rate, config.channels);
//!
//! let mut frame = vec![0u8; 4000];
//! while let Some((used, pts)) = pipeline.copy_encoded(&mut frame) {
//!     packetizer.wrap(pts, &frame[..used], |datagram| transport.send(datagram));
//! }
//! ```

pub mod audio;
pub mod config;
pub mod errors;
pub mod queue;
pub mod rtp;
pub mod testing;
pub mod timing;

// Re-exports for convenience
pub use audio::{
    find_audio_device, get_default_audio_device, list_audio_devices, AudioDevice, AudioPipeline,
    CaptureSource, ChunkEncoder, CpalSource, EncodedChunk, OpusEncoder, PcmChunk,
};
pub use config::StreamConfig;
pub use errors::StreamError;
pub use queue::{BoundedQueue, PopTimeout, PushTimeout};
pub use rtp::{AudioPacketizer, RtpSession, OPUS_PAYLOAD_TYPE, RTP_DATAGRAM_LEN, RTP_HEADER_LEN};
pub use timing::PtsClock;

//! Audio capture and encoding pipeline
//!
//! This module provides the producer/consumer core of the streamer:
//! - `chunk`: owned PCM and encoded payloads moved between stages
//! - `device`: audio input device enumeration
//! - `source`: blocking capture sources (cpal-backed)
//! - `encoder`: Opus chunk encoding
//! - `pipeline`: the two worker stages and their lifecycle

mod chunk;
mod device;
mod encoder;
mod pipeline;
mod source;

pub use chunk::{EncodedChunk, PcmChunk};
pub use device::{find_audio_device, get_default_audio_device, list_audio_devices, AudioDevice};
pub use encoder::{ChunkEncoder, OpusEncoder};
pub use pipeline::AudioPipeline;
pub use source::{CaptureSource, CpalSource};
